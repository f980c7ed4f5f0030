//! Corpus updates: content merge, timestamped backups, retention and
//! in-place sanitizing of stored regulations.

mod backup;
mod engine;
mod repair;

use std::path::Path;

pub use backup::{backup_path_for, is_backup_file, list_backups, sweep_backups, sweep_backups_at};
pub use engine::{UpdateEngine, UpdateOutcome, UpdateSummary};
pub use repair::{sanitize_corpus, SanitizeSummary};

use crate::catalog::Catalog;

/// Run the retention sweep for every cataloged regulation.
///
/// Returns the total number of backups removed.
pub fn sweep_corpus(catalog: &Catalog, root: &Path, max_age_days: u64) -> usize {
    catalog
        .iter()
        .map(|entry| sweep_backups(&root.join(&entry.path), max_age_days))
        .sum()
}
