//! Catalog rebuild by scanning the corpus directory tree.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::store::save_catalog;
use super::types::{Catalog, CatalogEntry};
use crate::config::{validate_code, RunConfig, CONTENT_EXTENSION};
use crate::error::Result;
use crate::matching::strip_heading_marker;
use crate::update::is_backup_file;

/// Result of scanning the corpus.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Entries for every content file with a heading.
    pub entries: Vec<CatalogEntry>,

    /// Content files without any heading line; they are not cataloged.
    pub untitled: Vec<PathBuf>,

    /// Content files whose name is not a regulation code (e.g. `README.md`).
    pub uncoded: Vec<PathBuf>,
}

/// Outcome of a catalog rebuild.
#[derive(Debug)]
pub struct RebuildOutcome {
    pub catalog: Catalog,
    pub untitled: Vec<PathBuf>,
    pub uncoded: Vec<PathBuf>,
}

/// Extract a title from content: the first non-empty heading line.
///
/// # Examples
/// ```
/// use regcorpus::catalog::extract_title;
///
/// assert_eq!(extract_title("\n## 교직원포상규정\n본문"), Some("교직원포상규정".to_string()));
/// assert_eq!(extract_title("본문만 있음"), None);
/// ```
#[must_use]
pub fn extract_title(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('#'))
        .map(strip_heading_marker)
        .find(|title| !title.is_empty())
        .map(str::to_string)
}

/// Scan `corpus_dir` for regulation content files.
///
/// Backup files and files not named after a regulation code are
/// skipped. Paths are recorded relative to `root` and
/// categories relative to `corpus_dir`, both with `/` separators. The
/// code is the file name without its extension.
pub fn scan_corpus(root: &Path, corpus_dir: &Path) -> Result<ScanResult> {
    let mut result = ScanResult::default();

    for dir_entry in WalkDir::new(corpus_dir).sort_by_file_name() {
        let dir_entry = dir_entry.map_err(|e| {
            std::io::Error::other(format!("failed to walk {}: {e}", corpus_dir.display()))
        })?;
        if !dir_entry.file_type().is_file() {
            continue;
        }

        let path = dir_entry.path();
        let file_name = dir_entry.file_name().to_string_lossy().into_owned();
        if is_backup_file(&file_name) {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(CONTENT_EXTENSION) {
            continue;
        }

        let code = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if validate_code(&code).is_err() {
            tracing::warn!(path = %path.display(), "file name is not a regulation code, skipping");
            result.uncoded.push(path.to_path_buf());
            continue;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read content file");
                continue;
            }
        };

        let Some(title) = extract_title(&content) else {
            tracing::warn!(path = %path.display(), "content file has no heading, skipping");
            result.untitled.push(path.to_path_buf());
            continue;
        };

        let category = path
            .parent()
            .and_then(|p| p.strip_prefix(corpus_dir).ok())
            .map(to_slash_path)
            .unwrap_or_default();
        let relative = path.strip_prefix(root).unwrap_or(path);

        result.entries.push(CatalogEntry::new(
            code,
            title,
            category,
            to_slash_path(relative),
            file_name,
        ));
    }

    Ok(result)
}

/// Rescan the corpus and overwrite the catalog file.
pub fn rebuild_catalog(config: &RunConfig) -> Result<RebuildOutcome> {
    let scan = scan_corpus(&config.root, &config.corpus_dir)?;
    let catalog = Catalog::from_entries(scan.entries);
    save_catalog(&catalog, &config.catalog_path)?;
    Ok(RebuildOutcome {
        catalog,
        untitled: scan.untitled,
        uncoded: scan.uncoded,
    })
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
