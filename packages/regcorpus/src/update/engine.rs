//! Merge of new regulation content into the corpus.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::backup::{backup_path_for, sweep_backups};
use crate::catalog::Catalog;
use crate::config::RunConfig;
use crate::error::{CorpusError, Result};
use crate::persist::write_atomic;
use crate::report::DiffRecord;
use crate::sanitize::sanitize;
use crate::splitting::ContentBlock;

/// Result of updating one regulation.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub code: String,
    pub title: String,

    /// Absolute location of the content file.
    pub path: PathBuf,

    /// Whether the content differed and was written.
    pub changed: bool,

    /// Copy of the previous content, if there was one to keep.
    pub backup_path: Option<PathBuf>,

    /// Expired backups deleted by the retention sweep.
    pub backups_removed: usize,

    /// Before/after content for the report; only set when changed.
    pub diff: Option<DiffRecord>,
}

/// Result of applying a split document to the corpus.
#[derive(Debug, Default)]
pub struct UpdateSummary {
    /// Regulations whose content changed, in discovery order.
    pub updated: Vec<UpdateOutcome>,

    /// Codes of regulations whose content was already current.
    pub unchanged: Vec<String>,

    /// Regulations that could not be updated, with the reason.
    pub failed: Vec<(String, String)>,

    /// Diffs of all changed regulations, for the report.
    pub diffs: Vec<DiffRecord>,
}

impl UpdateSummary {
    /// Whether any regulation failed to update.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Writes regulation content to the corpus, keeping timestamped backups.
pub struct UpdateEngine<'a> {
    catalog: &'a Catalog,
    root: PathBuf,
    retention_days: u64,
}

impl<'a> UpdateEngine<'a> {
    /// Create an engine writing below `root` (catalog paths are relative to it).
    pub fn new(catalog: &'a Catalog, root: impl Into<PathBuf>, retention_days: u64) -> Self {
        Self {
            catalog,
            root: root.into(),
            retention_days,
        }
    }

    /// Create an engine from runtime configuration.
    pub fn from_config(catalog: &'a Catalog, config: &RunConfig) -> Self {
        Self::new(catalog, &config.root, config.retention_days)
    }

    /// Replace the content of regulation `code` with `new_content`.
    ///
    /// Content equal to the current file after trimming surrounding
    /// whitespace is left alone. Otherwise the current file (if any) is
    /// copied to a timestamped backup, expired backups are swept, and the
    /// new content is written with a trailing newline.
    ///
    /// # Errors
    /// * `CorpusError::UnknownCode` if `code` is not cataloged
    /// * `CorpusError::BackupCollision` if a backup for this second already exists
    /// * `CorpusError::Backup` / `CorpusError::Write` on filesystem failures
    pub fn update(&self, code: &str, new_content: &str) -> Result<UpdateOutcome> {
        self.update_at(code, new_content, &Local::now())
    }

    /// [`Self::update`] with an explicit timestamp for the backup name.
    pub fn update_at(
        &self,
        code: &str,
        new_content: &str,
        now: &DateTime<Local>,
    ) -> Result<UpdateOutcome> {
        let entry = self
            .catalog
            .get(code)
            .ok_or_else(|| CorpusError::UnknownCode(code.to_string()))?;
        let path = self.root.join(&entry.path);

        let existing = read_existing(&path)?;
        let mut outcome = UpdateOutcome {
            code: entry.code.clone(),
            title: entry.title.clone(),
            path: path.clone(),
            changed: false,
            backup_path: None,
            backups_removed: 0,
            diff: None,
        };

        if existing.as_deref().unwrap_or("").trim() == new_content.trim() {
            tracing::debug!(code = %code, "content unchanged");
            return Ok(outcome);
        }

        if existing.is_some() {
            let backup = backup_path_for(&path, now);
            if backup.exists() {
                return Err(CorpusError::BackupCollision { path: backup });
            }
            fs::copy(&path, &backup).map_err(|source| CorpusError::Backup {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(code = %code, backup = %backup.display(), "backed up previous content");
            outcome.backups_removed = sweep_backups(&path, self.retention_days);
            outcome.backup_path = Some(backup);
        }

        let mut content = new_content.to_string();
        if !content.ends_with('\n') {
            content.push('\n');
        }
        write_atomic(&path, content.as_bytes()).map_err(|source| CorpusError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!(code = %code, path = %path.display(), "updated regulation");
        outcome.changed = true;
        outcome.diff = Some(DiffRecord::new(
            &entry.code,
            &entry.title,
            existing.as_deref().unwrap_or(""),
            new_content,
        ));
        Ok(outcome)
    }

    /// Sanitize and update each block in order.
    ///
    /// A failure is recorded against its regulation and does not stop the
    /// remaining blocks.
    pub fn apply(&self, blocks: impl IntoIterator<Item = ContentBlock>) -> UpdateSummary {
        self.apply_at(blocks, &Local::now())
    }

    /// [`Self::apply`] with an explicit timestamp for backup names.
    pub fn apply_at(
        &self,
        blocks: impl IntoIterator<Item = ContentBlock>,
        now: &DateTime<Local>,
    ) -> UpdateSummary {
        let mut summary = UpdateSummary::default();

        for block in blocks {
            let content = sanitize(&block.text());
            match self.update_at(&block.code, &content, now) {
                Ok(mut outcome) if outcome.changed => {
                    if let Some(diff) = outcome.diff.take() {
                        summary.diffs.push(diff);
                    }
                    summary.updated.push(outcome);
                }
                Ok(outcome) => summary.unchanged.push(outcome.code),
                Err(e) => {
                    if e.is_partial_write() {
                        tracing::warn!(code = %block.code, error = %e, "failed to write regulation");
                    } else {
                        tracing::error!(code = %block.code, error = %e, "failed to update regulation");
                    }
                    summary.failed.push((block.code, e.to_string()));
                }
            }
        }

        summary
    }
}

fn read_existing(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CorpusError::Backup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::update::list_backups;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new("3-1-9", "교직원포상규정", "3-학사", "regulations/3-학사/3-1-9.md", "3-1-9.md"),
            CatalogEntry::new("3-2-11", "보수 지급 규정", "3-학사", "regulations/3-학사/3-2-11.md", "3-2-11.md"),
        ])
    }

    fn at(second: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 1, 9, 5, second).unwrap()
    }

    #[test]
    fn test_unchanged_content_has_no_side_effects() {
        let dir = tempdir().unwrap();
        let catalog = catalog();
        let target = dir.path().join("regulations/3-학사/3-1-9.md");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "# 교직원포상규정\n본문\n").unwrap();

        let engine = UpdateEngine::new(&catalog, dir.path(), 7);
        let outcome = engine.update("3-1-9", "\n# 교직원포상규정\n본문  ").unwrap();

        assert!(!outcome.changed);
        assert!(outcome.backup_path.is_none());
        assert!(list_backups(&target).unwrap().is_empty());
        assert_eq!(fs::read_to_string(&target).unwrap(), "# 교직원포상규정\n본문\n");
    }

    #[test]
    fn test_changed_content_creates_one_backup() {
        let dir = tempdir().unwrap();
        let catalog = catalog();
        let target = dir.path().join("regulations/3-학사/3-1-9.md");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "# 교직원포상규정\n옛 본문\n").unwrap();

        let engine = UpdateEngine::new(&catalog, dir.path(), 7);
        let outcome = engine
            .update_at("3-1-9", "# 교직원포상규정\n새 본문", &at(7))
            .unwrap();

        assert!(outcome.changed);
        let backup = outcome.backup_path.unwrap();
        assert_eq!(
            backup.file_name().unwrap(),
            "3-1-9.md.backup.20250301_090507"
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), "# 교직원포상규정\n옛 본문\n");
        assert_eq!(fs::read_to_string(&target).unwrap(), "# 교직원포상규정\n새 본문\n");
        assert_eq!(list_backups(&target).unwrap().len(), 1);

        let diff = outcome.diff.unwrap();
        assert_eq!(diff.old_lines, vec!["# 교직원포상규정", "옛 본문"]);
        assert_eq!(diff.new_lines, vec!["# 교직원포상규정", "새 본문"]);
    }

    #[test]
    fn test_new_file_has_no_backup() {
        let dir = tempdir().unwrap();
        let catalog = catalog();
        let engine = UpdateEngine::new(&catalog, dir.path(), 7);

        let outcome = engine.update("3-2-11", "# 보수 지급 규정\n").unwrap();

        assert!(outcome.changed);
        assert!(outcome.backup_path.is_none());
        assert_eq!(
            fs::read_to_string(dir.path().join("regulations/3-학사/3-2-11.md")).unwrap(),
            "# 보수 지급 규정\n"
        );
    }

    #[test]
    fn test_same_second_backup_collision() {
        let dir = tempdir().unwrap();
        let catalog = catalog();
        let engine = UpdateEngine::new(&catalog, dir.path(), 7);
        engine.update_at("3-1-9", "v1", &at(0)).unwrap();
        engine.update_at("3-1-9", "v2", &at(1)).unwrap();

        let err = engine.update_at("3-1-9", "v3", &at(1)).unwrap_err();
        assert!(matches!(err, CorpusError::BackupCollision { .. }));
        let target = dir.path().join("regulations/3-학사/3-1-9.md");
        assert_eq!(fs::read_to_string(target).unwrap(), "v2\n");
    }

    #[test]
    fn test_unknown_code() {
        let catalog = catalog();
        let engine = UpdateEngine::new(&catalog, "/nonexistent", 7);
        assert!(matches!(
            engine.update("9-9-9", "x"),
            Err(CorpusError::UnknownCode(_))
        ));
    }

    #[test]
    fn test_apply_isolates_failures() {
        let dir = tempdir().unwrap();
        let catalog = catalog();
        let engine = UpdateEngine::new(&catalog, dir.path(), 7);

        let mut first = ContentBlock::new("3-1-9", "# 교직원포상규정");
        first.lines.push(r#"<td style="x"><p>가</p></td>"#.to_string());
        let blocks = vec![
            first,
            ContentBlock::new("7-7-7", "# 없는 규정"),
            ContentBlock::new("3-2-11", "# 보수 지급 규정"),
        ];
        let summary = engine.apply_at(blocks, &at(0));

        assert_eq!(summary.updated.len(), 2);
        assert_eq!(summary.diffs.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "7-7-7");
        assert!(summary.has_failures());

        let written =
            fs::read_to_string(dir.path().join("regulations/3-학사/3-1-9.md")).unwrap();
        assert_eq!(written, "# 교직원포상규정\n<td>\n<p>가</p>\n</td>\n");

        let again = engine.apply_at(
            vec![ContentBlock::new("3-2-11", "# 보수 지급 규정")],
            &at(1),
        );
        assert_eq!(again.unchanged, vec!["3-2-11"]);
        assert!(again.updated.is_empty());
    }
}
