//! Error types for the corpus updater.
//!
//! Fatal errors (catalog, conversion, matching) abort the document being
//! processed. Write errors are isolated per regulation by the caller and
//! collected into summaries instead of being propagated.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the corpus updater library.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Catalog file does not exist.
    #[error("Catalog file not found: {}", .path.display())]
    CatalogMissing { path: PathBuf },

    /// Catalog file exists but cannot be parsed.
    #[error("Catalog file {} is corrupt: {source}", .path.display())]
    CatalogCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid regulation code format.
    #[error("Invalid regulation code: '{0}'. Expected digit groups joined by '-' (e.g., 3-2-11)")]
    InvalidCode(String),

    /// Invalid runtime configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// External converter executable could not be started.
    #[error("Converter '{program}' is not available: {source}")]
    ConverterUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External converter ran but reported failure.
    #[error("Conversion of {} failed: {message}", .input.display())]
    ConversionFailed { input: PathBuf, message: String },

    /// Source file has an extension the converter does not handle.
    #[error("Unsupported source format: '{0}'. Supported: .docx, .pdf, .md")]
    UnsupportedFormat(String),

    /// No catalog entry corresponds to the input.
    #[error("No cataloged regulation matches {input}")]
    NoMatch { input: String },

    /// A match was found but its confidence is below the accepted minimum.
    #[error("Match for {input} is {code} with low confidence ({:.1}%)", .confidence * 100.0)]
    LowConfidence {
        input: String,
        code: String,
        confidence: f64,
    },

    /// Regulation code is not present in the catalog.
    #[error("Regulation code not in catalog: {0}")]
    UnknownCode(String),

    /// Copying the existing file aside failed.
    #[error("Failed to back up {}: {source}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backup with the same second-resolution timestamp already exists.
    #[error("Backup already exists: {}", .path.display())]
    BackupCollision { path: PathBuf },

    /// Writing new regulation content failed.
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl CorpusError {
    /// Whether this error is isolated to a single regulation write.
    ///
    /// Such failures are recorded and skipped; processing continues with
    /// the remaining regulations of the same document.
    #[must_use]
    pub fn is_partial_write(&self) -> bool {
        matches!(
            self,
            Self::Backup { .. } | Self::BackupCollision { .. } | Self::Write { .. }
        )
    }
}

/// Result type alias for corpus operations.
pub type Result<T> = std::result::Result<T, CorpusError>;
