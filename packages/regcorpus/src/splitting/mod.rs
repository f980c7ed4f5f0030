//! Document splitting: partition a converted document into per-regulation blocks.

mod engine;
mod strategy;
mod types;

pub use engine::{catalog_headings, SplitEngine};
pub use strategy::{SplitStrategy, TitleMatchStrategy};
pub use types::{Boundary, ContentBlock, SplitResult};
