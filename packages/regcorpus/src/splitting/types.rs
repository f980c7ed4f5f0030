//! Types for the document splitting system.

use std::collections::HashMap;

use crate::matching::MatchTier;

/// The slice of a document attributed to one regulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    /// Regulation code (key into the catalog).
    pub code: String,

    /// Lines of the block, starting with the heading line that opened it.
    pub lines: Vec<String>,
}

impl ContentBlock {
    /// Create a block opened by `heading`.
    #[must_use]
    pub fn new(code: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            lines: vec![heading.into()],
        }
    }

    /// Join the lines with `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// A line recognized as the start of a regulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    /// Regulation code.
    pub code: String,

    /// Catalog title of the regulation.
    pub title: String,

    /// Zero-based line index in the document.
    pub line_index: usize,

    pub confidence: f64,

    pub tier: MatchTier,
}

/// Split output: one block per regulation code, in discovery order.
///
/// Inserting a block for a code that is already present replaces the
/// earlier block in place (last match wins per code).
#[derive(Debug, Clone, Default)]
pub struct SplitResult {
    blocks: Vec<ContentBlock>,
    positions: HashMap<String, usize>,

    /// Every boundary seen, including ones whose block was later replaced.
    pub boundaries: Vec<Boundary>,
}

impl SplitResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sealed block, replacing any earlier block with the same code.
    ///
    /// Returns `true` if an earlier block was replaced.
    pub fn insert(&mut self, block: ContentBlock) -> bool {
        if let Some(&position) = self.positions.get(&block.code) {
            self.blocks[position] = block;
            true
        } else {
            self.positions.insert(block.code.clone(), self.blocks.len());
            self.blocks.push(block);
            false
        }
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&ContentBlock> {
        self.positions.get(code).map(|&i| &self.blocks[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentBlock> {
        self.blocks.iter()
    }

    /// Codes in discovery order.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.code.as_str()).collect()
    }

    #[must_use]
    pub fn into_blocks(self) -> Vec<ContentBlock> {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_block_text() {
        let mut block = ContentBlock::new("3-1-9", "# 교직원포상규정");
        block.lines.push("본문".to_string());
        assert_eq!(block.text(), "# 교직원포상규정\n본문");
    }

    #[test]
    fn test_split_result_last_wins_keeps_position() {
        let mut result = SplitResult::new();
        assert!(!result.insert(ContentBlock::new("a", "A1")));
        assert!(!result.insert(ContentBlock::new("b", "B")));
        assert!(result.insert(ContentBlock::new("a", "A2")));

        assert_eq!(result.len(), 2);
        assert_eq!(result.codes(), vec!["a", "b"]);
        assert_eq!(result.get("a").unwrap().lines, vec!["A2"]);
    }
}
