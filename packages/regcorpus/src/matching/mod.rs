//! Title normalization and matching of text lines to catalog entries.

mod matcher;
mod normalize;
mod similarity;

pub use matcher::{MatchOptions, MatchTier, Matcher, TitleMatch};
pub use normalize::{normalize_title, strip_heading_marker};
pub use similarity::{ratio_upper_bound, similarity_ratio};
