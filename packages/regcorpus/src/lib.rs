//! Regcorpus - keep a regulation corpus in sync with revised source documents.
//!
//! Revised regulations arrive as word-processor or PDF documents, either
//! one regulation per file or as compilations of many. This crate converts
//! them to markup, attributes each part to a cataloged regulation by its
//! title, and merges the new content into the corpus with timestamped
//! backups and an HTML change report.
//!
//! # Example
//!
//! ```
//! use regcorpus::catalog::{Catalog, CatalogEntry};
//! use regcorpus::splitting::SplitEngine;
//!
//! let catalog = Catalog::from_entries(vec![CatalogEntry::new(
//!     "3-1-9",
//!     "교직원포상규정",
//!     "3-학사",
//!     "regulations/3-학사/3-1-9.md",
//!     "3-1-9.md",
//! )]);
//! let result = SplitEngine::for_catalog(&catalog).split_text("# 교직원포상규정\n본문내용1\n본문내용2");
//! assert_eq!(result.get("3-1-9").unwrap().lines, ["# 교직원포상규정", "본문내용1", "본문내용2"]);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, code validation and runtime configuration
//! - [`error`]: Error types and Result alias
//! - [`catalog`]: Regulation catalog, its JSON file and the corpus scan
//! - [`matching`]: Title normalization and tiered line-to-regulation matching
//! - [`splitting`]: Document splitting at regulation boundaries
//! - [`sanitize`]: Markup cleanup for the site renderer
//! - [`update`]: Content merge, backups and retention sweep
//! - [`report`]: HTML diff reports
//! - [`convert`]: External document conversion
//! - [`process`]: Single-document and batch orchestration
//! - [`export`]: Title-named export of the corpus
//! - [`cli`]: Command-line interface

pub mod catalog;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod matching;
mod persist;
pub mod process;
pub mod report;
pub mod sanitize;
pub mod splitting;
pub mod update;

pub use catalog::{load_catalog, Catalog, CatalogEntry};
pub use config::{validate_code, RunConfig};
pub use error::{CorpusError, Result};
pub use matching::{normalize_title, Matcher};
pub use process::{process_document, process_markdown};
