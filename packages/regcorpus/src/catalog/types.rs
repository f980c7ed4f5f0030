//! Catalog data types.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::matching::normalize_title;

/// One known regulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable identifier (e.g., "3-2-11").
    pub code: String,

    /// Authoritative human-readable title.
    pub title: String,

    /// Cached `normalize_title(title)`.
    pub title_normalized: String,

    /// Grouping derived from the storage directory (e.g., "3-학사행정/2-인사보수행정").
    pub category: String,

    /// Storage location relative to the project root, `/` separated.
    pub path: String,

    /// File name of the content file.
    pub filename: String,
}

impl CatalogEntry {
    /// Create an entry, deriving the normalized title.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        path: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            code: code.into(),
            title_normalized: normalize_title(&title),
            title,
            category: category.into(),
            path: path.into(),
            filename: filename.into(),
        }
    }
}

/// In-memory index of known regulations, ordered by code.
///
/// Built once per run; lookups by code and by normalized title.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_code: HashMap<String, usize>,
    by_normalized: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from entries.
    ///
    /// Entries are sorted by code and their normalized titles recomputed.
    /// A duplicate code keeps the first entry. When several titles share a
    /// normalized form, the entry with the greatest code owns the key.
    /// Empty normalized titles are never indexed.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut entries: Vec<CatalogEntry> = entries
            .into_iter()
            .map(|mut entry| {
                let normalized = normalize_title(&entry.title);
                if normalized != entry.title_normalized {
                    tracing::debug!(
                        code = %entry.code,
                        stored = %entry.title_normalized,
                        "recomputed normalized title"
                    );
                    entry.title_normalized = normalized;
                }
                entry
            })
            .collect();
        entries.sort_by(|a, b| a.code.cmp(&b.code));
        entries.dedup_by(|later, first| {
            let duplicate = later.code == first.code;
            if duplicate {
                tracing::warn!(code = %later.code, path = %later.path, "duplicate regulation code, ignoring");
            }
            duplicate
        });

        let mut by_code = HashMap::with_capacity(entries.len());
        let mut by_normalized = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            by_code.insert(entry.code.clone(), index);
            if entry.title_normalized.is_empty() {
                continue;
            }
            if let Some(previous) = by_normalized.insert(entry.title_normalized.clone(), index) {
                tracing::warn!(
                    title = %entry.title,
                    shadowed = %entries[previous].code,
                    code = %entry.code,
                    "normalized title collision"
                );
            }
        }

        Self {
            entries,
            by_code,
            by_normalized,
        }
    }

    /// Look up an entry by code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&CatalogEntry> {
        self.by_code.get(code).map(|&i| &self.entries[i])
    }

    /// Look up an entry by an already normalized title.
    ///
    /// The empty key never matches.
    #[must_use]
    pub fn find_by_normalized(&self, normalized: &str) -> Option<&CatalogEntry> {
        if normalized.is_empty() {
            return None;
        }
        self.by_normalized.get(normalized).map(|&i| &self.entries[i])
    }

    /// All entries in code order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries per category, sorted by category.
    #[must_use]
    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.category.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Persisted catalog file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub version: String,

    /// Date of the last rebuild (YYYY-MM-DD).
    pub last_updated: String,

    pub total_regulations: usize,

    pub regulations: Vec<CatalogEntry>,
}
