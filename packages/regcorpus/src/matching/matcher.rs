//! Tiered title matcher.

use std::collections::HashMap;

use super::normalize::{normalize_title, strip_heading_marker};
use super::similarity::{ratio_upper_bound, similarity_ratio};
use crate::catalog::{Catalog, CatalogEntry};
use crate::config::{MIN_SUFFIX_TITLE_LEN, SHORT_LINE_THRESHOLD, SIMILARITY_THRESHOLD};

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Raw title equality, optionally ignoring spaces.
    Exact,
    /// Normalized title equality.
    Normalized,
    /// One normalized string contains the other.
    Substring,
    /// Best similarity ratio above the threshold.
    Similarity,
}

impl MatchTier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Normalized => "normalized",
            Self::Substring => "substring",
            Self::Similarity => "similarity",
        }
    }
}

/// A catalog entry matched to a line of text.
#[derive(Debug, Clone, Copy)]
pub struct TitleMatch<'a> {
    pub entry: &'a CatalogEntry,

    /// `1.0` for exact and normalized matches, the similarity ratio otherwise.
    pub confidence: f64,

    pub tier: MatchTier,
}

/// Tunables for the fuzzy tiers.
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Substring matching only applies to normalized lines shorter than this.
    pub short_line_threshold: usize,

    /// The similarity tier accepts ratios strictly above this.
    pub similarity_threshold: f64,

    /// Substring matching ignores titles whose normalized form is not
    /// longer than this.
    pub min_substring_title_len: usize,

    /// Fuzzy tiers require the normalized line to be longer than this.
    pub min_fuzzy_line_len: usize,
}

impl MatchOptions {
    /// Options for finding regulation boundaries in running text, where
    /// short lines such as "부칙" must never open a block.
    #[must_use]
    pub fn for_splitting() -> Self {
        Self {
            min_fuzzy_line_len: MIN_SUFFIX_TITLE_LEN,
            ..Self::default()
        }
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            short_line_threshold: SHORT_LINE_THRESHOLD,
            similarity_threshold: SIMILARITY_THRESHOLD,
            min_substring_title_len: MIN_SUFFIX_TITLE_LEN,
            min_fuzzy_line_len: 0,
        }
    }
}

/// Matches lines of text against catalog titles.
///
/// Tiers are tried in order and the first one that produces a candidate
/// wins:
///
/// 1. exact title (trimmed, or with spaces removed)
/// 2. normalized title
/// 3. substring containment either way, best similarity ratio
/// 4. best similarity ratio over the whole catalog above the threshold
pub struct Matcher<'a> {
    catalog: &'a Catalog,
    exact: HashMap<String, &'a CatalogEntry>,
    options: MatchOptions,
}

impl<'a> Matcher<'a> {
    /// Create a matcher with default options.
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self::with_options(catalog, MatchOptions::default())
    }

    #[must_use]
    pub fn with_options(catalog: &'a Catalog, options: MatchOptions) -> Self {
        let mut exact = HashMap::with_capacity(catalog.len() * 2);
        for entry in catalog.iter() {
            let trimmed = entry.title.trim();
            if !trimmed.is_empty() {
                exact.insert(trimmed.to_string(), entry);
            }
            let compact = entry.title.replace(' ', "");
            if !compact.is_empty() {
                exact.insert(compact, entry);
            }
        }
        Self {
            catalog,
            exact,
            options,
        }
    }

    /// Find the catalog entry a line refers to, if any.
    #[must_use]
    pub fn match_line(&self, line: &str) -> Option<TitleMatch<'a>> {
        let stripped = strip_heading_marker(line);
        if stripped.is_empty() {
            return None;
        }

        if let Some(entry) = self.match_exact(stripped) {
            return Some(TitleMatch {
                entry,
                confidence: 1.0,
                tier: MatchTier::Exact,
            });
        }

        let normalized = normalize_title(stripped);
        if let Some(entry) = self.catalog.find_by_normalized(&normalized) {
            return Some(TitleMatch {
                entry,
                confidence: 1.0,
                tier: MatchTier::Normalized,
            });
        }

        let len = normalized.chars().count();
        if len == 0 || len <= self.options.min_fuzzy_line_len {
            return None;
        }

        if len < self.options.short_line_threshold {
            if let Some(found) = self.match_substring(&normalized) {
                return Some(found);
            }
        }

        self.match_similar(&normalized, len)
    }

    fn match_exact(&self, stripped: &str) -> Option<&'a CatalogEntry> {
        if let Some(&entry) = self.exact.get(stripped) {
            return Some(entry);
        }
        self.exact.get(&stripped.replace(' ', "")).copied()
    }

    fn match_substring(&self, normalized: &str) -> Option<TitleMatch<'a>> {
        let mut best: Option<TitleMatch<'a>> = None;

        for entry in self.catalog.iter() {
            let title = entry.title_normalized.as_str();
            if title.chars().count() <= self.options.min_substring_title_len {
                continue;
            }
            if !normalized.contains(title) && !title.contains(normalized) {
                continue;
            }
            let ratio = similarity_ratio(normalized, title);
            if best.is_none_or(|b| ratio > b.confidence) {
                best = Some(TitleMatch {
                    entry,
                    confidence: ratio,
                    tier: MatchTier::Substring,
                });
            }
        }

        best
    }

    fn match_similar(&self, normalized: &str, len: usize) -> Option<TitleMatch<'a>> {
        let threshold = self.options.similarity_threshold;
        let mut best: Option<TitleMatch<'a>> = None;

        for entry in self.catalog.iter() {
            let title = entry.title_normalized.as_str();
            if title.is_empty() {
                continue;
            }
            let floor = best.map_or(threshold, |b| b.confidence);
            if ratio_upper_bound(len, title.chars().count()) <= floor {
                continue;
            }
            let ratio = similarity_ratio(normalized, title);
            if ratio > floor {
                best = Some(TitleMatch {
                    entry,
                    confidence: ratio,
                    tier: MatchTier::Similarity,
                });
            }
        }

        best
    }
}
