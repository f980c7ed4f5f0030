//! Split engine that partitions a converted document into regulation blocks.

use super::strategy::{SplitStrategy, TitleMatchStrategy};
use super::types::{ContentBlock, SplitResult};
use crate::catalog::Catalog;
use crate::matching::{normalize_title, strip_heading_marker, MatchOptions, Matcher};

/// Engine for splitting a document at regulation boundaries.
///
/// Walks the document once, keeping a cursor on the block being filled.
/// A detected boundary seals the current block and opens a new one that
/// starts with the boundary line itself. Lines before the first boundary
/// belong to no regulation and are dropped.
pub struct SplitEngine<S: SplitStrategy> {
    strategy: S,
}

impl<'a> SplitEngine<TitleMatchStrategy<'a>> {
    /// Engine using the tiered title matcher over `catalog`, with short
    /// lines kept out of the fuzzy tiers.
    #[must_use]
    pub fn for_catalog(catalog: &'a Catalog) -> Self {
        let matcher = Matcher::with_options(catalog, MatchOptions::for_splitting());
        Self::new(TitleMatchStrategy::new(matcher))
    }
}

impl<S: SplitStrategy> SplitEngine<S> {
    #[must_use]
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    /// Split a document given as text.
    pub fn split_text(&self, text: &str) -> SplitResult {
        let lines: Vec<&str> = text.lines().collect();
        self.split(&lines)
    }

    /// Split a document given as lines.
    pub fn split(&self, lines: &[&str]) -> SplitResult {
        let mut result = SplitResult::new();
        let mut current: Option<ContentBlock> = None;
        let mut dropped = 0usize;

        for (index, line) in lines.iter().enumerate() {
            if let Some(boundary) = self.strategy.detect(line, index) {
                if let Some(block) = current.take() {
                    seal(&mut result, block);
                }
                tracing::info!(
                    code = %boundary.code,
                    title = %boundary.title,
                    line = index + 1,
                    tier = boundary.tier.as_str(),
                    confidence = boundary.confidence,
                    "found regulation start"
                );
                current = Some(ContentBlock::new(boundary.code.clone(), *line));
                result.boundaries.push(boundary);
            } else if let Some(block) = current.as_mut() {
                block.lines.push((*line).to_string());
            } else {
                dropped += 1;
            }
        }

        if let Some(block) = current {
            seal(&mut result, block);
        }

        if dropped > 0 {
            tracing::debug!(lines = dropped, "dropped lines before first regulation title");
        }

        result
    }
}

fn seal(result: &mut SplitResult, block: ContentBlock) {
    let code = block.code.clone();
    if result.insert(block) {
        tracing::warn!(code = %code, "regulation appears twice in document, keeping the later section");
    }
}

/// Titles of heading lines whose normalized text is exactly a catalog title.
///
/// Only `#` heading lines count. Used to tell a single-regulation document
/// from a compilation of several.
#[must_use]
pub fn catalog_headings(lines: &[&str], catalog: &Catalog) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| line.starts_with('#'))
        .map(strip_heading_marker)
        .filter(|title| catalog.find_by_normalized(&normalize_title(title)).is_some())
        .map(str::to_string)
        .collect()
}
