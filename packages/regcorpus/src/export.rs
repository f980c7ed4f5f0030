//! Export of the corpus under human-readable file names.
//!
//! Copies every cataloged regulation to `<title>.md` in a flat output
//! directory, for consumers that index documents by title.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::config::CONTENT_EXTENSION;

/// Result of an export run.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Destination files written.
    pub copied: Vec<PathBuf>,

    /// Codes whose content file does not exist.
    pub missing: Vec<String>,

    /// Codes that could not be copied, with the reason.
    pub failed: Vec<(String, String)>,
}

/// File name for a title, with path separators and control characters replaced.
///
/// # Examples
/// ```
/// use regcorpus::export::title_file_name;
///
/// assert_eq!(title_file_name("보수 지급 규정"), "보수 지급 규정.md");
/// assert_eq!(title_file_name("학칙/시행세칙"), "학칙_시행세칙.md");
/// ```
#[must_use]
pub fn title_file_name(title: &str) -> String {
    let safe: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{safe}.{CONTENT_EXTENSION}")
}

/// Copy every cataloged regulation below `root` to `out_dir/<title>.md`.
///
/// Missing sources are skipped and listed. When two regulations share a
/// title, the later one gets its code appended to the name.
pub fn export_by_title(catalog: &Catalog, root: &Path, out_dir: &Path) -> std::io::Result<ExportSummary> {
    fs::create_dir_all(out_dir)?;
    let mut summary = ExportSummary::default();
    let mut used = HashSet::new();

    for entry in catalog.iter() {
        let source = root.join(&entry.path);
        if !source.is_file() {
            tracing::warn!(code = %entry.code, path = %source.display(), "source file missing");
            summary.missing.push(entry.code.clone());
            continue;
        }

        let mut name = title_file_name(&entry.title);
        if !used.insert(name.clone()) {
            name = title_file_name(&format!("{} ({})", entry.title, entry.code));
            used.insert(name.clone());
        }
        let dest = out_dir.join(&name);

        match fs::copy(&source, &dest) {
            Ok(_) => {
                tracing::debug!(code = %entry.code, dest = %dest.display(), "exported");
                summary.copied.push(dest);
            }
            Err(e) => {
                tracing::warn!(code = %entry.code, error = %e, "export failed");
                summary.failed.push((entry.code.clone(), e.to_string()));
            }
        }
    }

    tracing::info!(
        copied = summary.copied.len(),
        missing = summary.missing.len(),
        failed = summary.failed.len(),
        "export finished"
    );
    Ok(summary)
}
