//! Boundary detection strategies for document splitting.

use super::types::Boundary;
use crate::matching::Matcher;

/// Decides whether a line opens a new regulation block.
pub trait SplitStrategy {
    /// Return the boundary a line represents, if any.
    fn detect(&self, line: &str, line_index: usize) -> Option<Boundary>;
}

/// Strategy that opens a block at any line matching a catalog title.
///
/// This is the default strategy; it uses the full tiered [`Matcher`].
pub struct TitleMatchStrategy<'a> {
    matcher: Matcher<'a>,
}

impl<'a> TitleMatchStrategy<'a> {
    #[must_use]
    pub fn new(matcher: Matcher<'a>) -> Self {
        Self { matcher }
    }
}

impl SplitStrategy for TitleMatchStrategy<'_> {
    fn detect(&self, line: &str, line_index: usize) -> Option<Boundary> {
        let found = self.matcher.match_line(line)?;
        Some(Boundary {
            code: found.entry.code.clone(),
            title: found.entry.title.clone(),
            line_index,
            confidence: found.confidence,
            tier: found.tier,
        })
    }
}
