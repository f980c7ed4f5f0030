//! Configuration constants, validation functions and runtime configuration.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CorpusError, Result};

/// Catalog file name, relative to the project root.
pub const CATALOG_FILE: &str = "regulations.json";

/// Corpus directory, relative to the project root.
pub const CORPUS_DIR: &str = "regulations";

/// Reports directory, relative to the project root.
pub const REPORTS_DIR: &str = "reports";

/// Inbox for revised source documents awaiting batch processing.
pub const SOURCE_INBOX_DIR: &str = "regulations_source/new";

/// Archive for processed source documents (a year subdirectory is appended).
pub const SOURCE_HISTORY_DIR: &str = "regulations_source/history";

/// Extension of regulation content files.
pub const CONTENT_EXTENSION: &str = "md";

/// Marker between the content path and the backup timestamp.
pub const BACKUP_MARKER: &str = ".backup.";

/// Timestamp format appended to backup files (second resolution).
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Default backup retention in days.
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

/// Lines whose normalized form is at least this long skip substring matching.
pub const SHORT_LINE_THRESHOLD: usize = 80;

/// Minimum similarity ratio accepted by the fallback tier.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Normalized titles must be longer than this to match as a line suffix.
pub const MIN_SUFFIX_TITLE_LEN: usize = 4;

/// Matches below this confidence are rejected unless explicitly accepted.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.8;

/// Unchanged lines shown around each change in diff reports.
pub const REPORT_CONTEXT_LINES: usize = 3;

/// Version tag written into the catalog file.
pub const CATALOG_VERSION: &str = "1.0";

/// Regulation code pattern: digit groups joined by dashes.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:-\d+)+$").expect("valid regex"));

/// Code embedded in a source filename, dash separated.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FILENAME_CODE_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+-\d+-\d+)").expect("valid regex"));

/// Code embedded in a source filename, underscore separated.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FILENAME_CODE_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+_\d+_\d+)").expect("valid regex"));

/// Validate regulation code format.
///
/// # Examples
/// ```
/// use regcorpus::config::validate_code;
///
/// assert!(validate_code("3-2-11").is_ok());
/// assert!(validate_code("3.2.11").is_err());
/// ```
pub fn validate_code(code: &str) -> Result<()> {
    if CODE_PATTERN.is_match(code) {
        Ok(())
    } else {
        Err(CorpusError::InvalidCode(code.to_string()))
    }
}

/// Extract a regulation code from a source filename.
///
/// Accepts `3-1-9` and `3_1_9` forms; the result always uses dashes.
///
/// # Examples
/// ```
/// use regcorpus::config::extract_code_from_filename;
///
/// assert_eq!(extract_code_from_filename("3-1-9_교직원포상규정.docx"), Some("3-1-9".to_string()));
/// assert_eq!(extract_code_from_filename("3_1_9.pdf"), Some("3-1-9".to_string()));
/// assert_eq!(extract_code_from_filename("교직원포상규정.docx"), None);
/// ```
pub fn extract_code_from_filename(filename: &str) -> Option<String> {
    if let Some(caps) = FILENAME_CODE_DASH.captures(filename) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    FILENAME_CODE_UNDERSCORE
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace('_', "-"))
}

/// Byte encoding used when writing report artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// Plain UTF-8.
    #[default]
    Utf8,
    /// UTF-8 prefixed with a byte order mark, for viewers that guess legacy code pages.
    Utf8Bom,
}

impl OutputEncoding {
    /// Parse from a configuration value (`utf-8`, `utf-8-bom`).
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "utf8bom" | "utf-8-bom" | "utf-8-sig" => Ok(Self::Utf8Bom),
            other => Err(CorpusError::Config(format!(
                "unknown output encoding '{other}'"
            ))),
        }
    }

    /// Encode text for writing.
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf8Bom => {
                let mut bytes = Vec::with_capacity(text.len() + 3);
                bytes.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
        }
    }
}

/// Runtime configuration, built once at process start.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub root: PathBuf,
    pub corpus_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub reports_dir: PathBuf,
    pub retention_days: u64,
    pub output_encoding: OutputEncoding,
    pub min_confidence: f64,
}

impl RunConfig {
    /// Configuration with the standard layout under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            corpus_dir: root.join(CORPUS_DIR),
            catalog_path: root.join(CATALOG_FILE),
            reports_dir: root.join(REPORTS_DIR),
            root,
            retention_days: DEFAULT_RETENTION_DAYS,
            output_encoding: OutputEncoding::Utf8,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    /// Standard layout with overrides from `REGCORPUS_*` environment variables.
    pub fn from_env(root: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self::new(root);

        if let Ok(days) = std::env::var("REGCORPUS_RETENTION_DAYS") {
            config.retention_days = days.parse().map_err(|_| {
                CorpusError::Config(format!("REGCORPUS_RETENTION_DAYS is not a number: {days}"))
            })?;
        }

        if let Ok(value) = std::env::var("REGCORPUS_MIN_CONFIDENCE") {
            let min_confidence = value.parse().map_err(|_| {
                CorpusError::Config(format!("REGCORPUS_MIN_CONFIDENCE is not a number: {value}"))
            })?;
            config = config.with_min_confidence(min_confidence)?;
        }

        if let Ok(value) = std::env::var("REGCORPUS_OUTPUT_ENCODING") {
            config.output_encoding = OutputEncoding::parse(&value)?;
        }

        Ok(config)
    }

    pub fn with_retention_days(mut self, days: u64) -> Self {
        self.retention_days = days;
        self
    }

    /// Set the minimum accepted confidence; must lie in `[0, 1]`.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(CorpusError::Config(format!(
                "minimum confidence must be between 0 and 1, got {min_confidence}"
            )));
        }
        self.min_confidence = min_confidence;
        Ok(self)
    }

    /// Inbox directory for batch processing.
    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join(SOURCE_INBOX_DIR)
    }

    /// Archive directory for the given year.
    pub fn history_dir(&self, year: i32) -> PathBuf {
        self.root.join(SOURCE_HISTORY_DIR).join(year.to_string())
    }
}
