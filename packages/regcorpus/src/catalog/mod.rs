//! Regulation catalog: the index of known regulations.
//!
//! The catalog is persisted as a single JSON file and rebuilt by scanning
//! the corpus directory tree.

mod scan;
mod store;
mod types;

pub use scan::{extract_title, rebuild_catalog, scan_corpus, RebuildOutcome, ScanResult};
pub use store::{load_catalog, save_catalog, to_catalog_file};
pub use types::{Catalog, CatalogEntry, CatalogFile};
