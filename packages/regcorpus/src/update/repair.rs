//! Re-sanitize regulations already stored in the corpus.

use std::fs;
use std::path::Path;

use crate::catalog::Catalog;
use crate::persist::write_atomic;
use crate::sanitize::sanitize;

/// Per-regulation results of a corpus sanitize run.
#[derive(Debug, Default)]
pub struct SanitizeSummary {
    /// Codes whose file was rewritten.
    pub fixed: Vec<String>,
    pub unchanged: usize,
    /// Codes whose file does not exist.
    pub missing: Vec<String>,
    /// `(code, reason)` for files that could not be read or written.
    pub failed: Vec<(String, String)>,
}

/// Sanitize every cataloged regulation under `root` in place.
///
/// Files that are already clean are not touched. One unreadable or
/// unwritable file does not stop the others.
pub fn sanitize_corpus(catalog: &Catalog, root: &Path) -> SanitizeSummary {
    let mut summary = SanitizeSummary::default();

    for entry in catalog.iter() {
        let path = root.join(&entry.path);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                summary.missing.push(entry.code.clone());
                continue;
            }
            Err(e) => {
                tracing::warn!(code = %entry.code, path = %path.display(), error = %e, "failed to read regulation");
                summary.failed.push((entry.code.clone(), e.to_string()));
                continue;
            }
        };

        let cleaned = sanitize(&content);
        if cleaned == content {
            summary.unchanged += 1;
            continue;
        }

        match write_atomic(&path, cleaned.as_bytes()) {
            Ok(()) => {
                tracing::info!(code = %entry.code, path = %path.display(), "sanitized regulation");
                summary.fixed.push(entry.code.clone());
            }
            Err(e) => {
                tracing::warn!(code = %entry.code, path = %path.display(), error = %e, "failed to write regulation");
                summary.failed.push((entry.code.clone(), e.to_string()));
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new("3-1-9", "교직원포상규정", "3-학사", "regulations/3-학사/3-1-9.md", "3-1-9.md"),
            CatalogEntry::new("3-2-11", "보수 지급 규정", "3-학사", "regulations/3-학사/3-2-11.md", "3-2-11.md"),
            CatalogEntry::new("3-2-17", "교직원 복무 규정", "3-학사", "regulations/3-학사/3-2-17.md", "3-2-17.md"),
        ])
    }

    #[test]
    fn test_rewrites_only_dirty_files() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("regulations/3-학사");
        fs::create_dir_all(&corpus).unwrap();
        fs::write(corpus.join("3-1-9.md"), "# 교직원포상규정\n<td style=\"width: 9%\">1~3</td>\n").unwrap();
        fs::write(corpus.join("3-2-11.md"), "# 보수 지급 규정\n본문\n").unwrap();

        let summary = sanitize_corpus(&catalog(), dir.path());

        assert_eq!(summary.fixed, vec!["3-1-9"]);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.missing, vec!["3-2-17"]);
        assert!(summary.failed.is_empty());
        assert_eq!(
            fs::read_to_string(corpus.join("3-1-9.md")).unwrap(),
            "# 교직원포상규정\n<td>1&#126;3</td>\n"
        );
        assert_eq!(
            fs::read_to_string(corpus.join("3-2-11.md")).unwrap(),
            "# 보수 지급 규정\n본문\n"
        );
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("regulations/3-학사");
        fs::create_dir_all(&corpus).unwrap();
        fs::write(corpus.join("3-1-9.md"), "# 교직원포상규정\n[밑줄]{.underline}\n").unwrap();

        let first = sanitize_corpus(&catalog(), dir.path());
        let second = sanitize_corpus(&catalog(), dir.path());

        assert_eq!(first.fixed, vec!["3-1-9"]);
        assert!(second.fixed.is_empty());
        assert_eq!(second.unchanged, 1);
    }
}
