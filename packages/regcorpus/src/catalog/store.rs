//! Catalog file loading and saving.

use std::fs;
use std::path::Path;

use super::types::{Catalog, CatalogFile};
use crate::config::CATALOG_VERSION;
use crate::error::{CorpusError, Result};
use crate::persist::write_atomic;

/// Load the catalog file.
///
/// # Errors
/// * `CorpusError::CatalogMissing` if the file does not exist
/// * `CorpusError::CatalogCorrupt` if it is not a valid catalog document
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CorpusError::CatalogMissing {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(CorpusError::Io(e)),
    };

    let file: CatalogFile =
        serde_json::from_str(&content).map_err(|source| CorpusError::CatalogCorrupt {
            path: path.to_path_buf(),
            source,
        })?;

    if file.total_regulations != file.regulations.len() {
        tracing::warn!(
            declared = file.total_regulations,
            actual = file.regulations.len(),
            "catalog total does not match entry count"
        );
    }

    let catalog = Catalog::from_entries(file.regulations);
    tracing::info!(path = %path.display(), regulations = catalog.len(), "loaded catalog");
    Ok(catalog)
}

/// Build the persisted representation of a catalog.
#[must_use]
pub fn to_catalog_file(catalog: &Catalog, last_updated: &str) -> CatalogFile {
    CatalogFile {
        version: CATALOG_VERSION.to_string(),
        last_updated: last_updated.to_string(),
        total_regulations: catalog.len(),
        regulations: catalog.entries().to_vec(),
    }
}

/// Save the catalog, replacing the whole file atomically.
///
/// The file is pretty-printed with non-ASCII titles kept verbatim.
pub fn save_catalog(catalog: &Catalog, path: &Path) -> Result<()> {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let file = to_catalog_file(catalog, &today);
    let mut json = serde_json::to_string_pretty(&file)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())?;
    tracing::info!(path = %path.display(), regulations = catalog.len(), "saved catalog");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_catalog() {
        let dir = tempdir().unwrap();
        let err = load_catalog(&dir.path().join("regulations.json")).unwrap_err();
        assert!(matches!(err, CorpusError::CatalogMissing { .. }));
    }

    #[test]
    fn test_load_corrupt_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regulations.json");
        fs::write(&path, "{ \"regulations\": [").unwrap();
        let err = load_catalog(&path).unwrap_err();
        assert!(matches!(err, CorpusError::CatalogCorrupt { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regulations.json");
        let catalog = Catalog::from_entries(vec![CatalogEntry::new(
            "3-1-9",
            "교직원포상규정",
            "3-학사행정/2-인사보수행정",
            "regulations/3-학사행정/2-인사보수행정/3-1-9.md",
            "3-1-9.md",
        )]);

        save_catalog(&catalog, &path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"version\": \"1.0\""));
        assert!(raw.contains("\"total_regulations\": 1"));
        assert!(raw.contains("교직원포상규정"), "titles should not be escaped");

        let loaded = load_catalog(&path).unwrap();
        assert_eq!(loaded.entries(), catalog.entries());
    }

    #[test]
    fn test_load_tolerates_legacy_normalization() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regulations.json");
        fs::write(
            &path,
            r#"{
  "version": "1.0",
  "last_updated": "2025-01-01",
  "total_regulations": 1,
  "regulations": [
    {
      "code": "3-3-5",
      "title": "학칙(시행세칙)",
      "title_normalized": "학칙(시행세칙)",
      "category": "3-학사행정/3-교무행정",
      "path": "regulations/3-학사행정/3-교무행정/3-3-5.md",
      "filename": "3-3-5.md"
    }
  ]
}"#,
        )
        .unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.get("3-3-5").unwrap().title_normalized, "학칙시행세칙");
    }
}
