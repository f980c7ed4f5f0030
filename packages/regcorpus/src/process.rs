//! Single-document and batch orchestration.
//!
//! A converted document is either a compilation of several regulations,
//! recognized by two or more catalog headings and split at those
//! boundaries, or a single regulation resolved from its file name or its
//! first meaningful line.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};

use crate::catalog::Catalog;
use crate::config::{extract_code_from_filename, RunConfig};
use crate::convert::{Converter, SourceFormat};
use crate::error::{CorpusError, Result};
use crate::matching::{strip_heading_marker, MatchTier, Matcher};
use crate::report::{render_report, write_report};
use crate::splitting::{catalog_headings, ContentBlock, SplitEngine};
use crate::update::{UpdateEngine, UpdateOutcome, UpdateSummary};

/// Shortest first line (in characters) considered meaningful as a title.
const MIN_TITLE_LINE_CHARS: usize = 3;

/// Shared state for processing documents in one run.
pub struct ProcessContext<'a> {
    pub config: &'a RunConfig,
    pub catalog: &'a Catalog,
    pub converter: &'a dyn Converter,

    /// Accept single-regulation matches below the configured minimum confidence.
    pub accept_low_confidence: bool,
}

impl<'a> ProcessContext<'a> {
    pub fn new(config: &'a RunConfig, catalog: &'a Catalog, converter: &'a dyn Converter) -> Self {
        Self {
            config,
            catalog,
            converter,
            accept_low_confidence: false,
        }
    }

    pub fn with_accept_low_confidence(mut self, accept: bool) -> Self {
        self.accept_low_confidence = accept;
        self
    }
}

/// How a document was attributed to regulations.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessMode {
    /// Split at catalog headings; carries the titles found.
    Compilation { headings: Vec<String> },

    /// The whole document is one regulation.
    Single {
        code: String,
        confidence: f64,
        /// `None` when the code came from the file name.
        tier: Option<MatchTier>,
    },
}

/// What happened to the change report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    /// Nothing changed, so no report was written.
    NotNeeded,
    Written(PathBuf),
    /// The corpus was updated but the report could not be written.
    Failed(String),
}

/// Result of processing one document.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub source: String,
    pub mode: ProcessMode,
    pub summary: UpdateSummary,
    pub report: ReportStatus,
}

/// Result of processing an inbox.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<ProcessOutcome>,

    /// Source files that failed, with the reason.
    pub failed: Vec<(String, String)>,

    /// Sources processed but left in the inbox because archiving failed.
    pub not_archived: Vec<(String, String)>,
}

impl BatchSummary {
    /// Every regulation changed across the batch.
    pub fn updated(&self) -> impl Iterator<Item = &UpdateOutcome> {
        self.succeeded.iter().flat_map(|o| o.summary.updated.iter())
    }

    /// Whether any document or regulation failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || self.succeeded.iter().any(|o| o.summary.has_failures())
    }
}

/// Merge an already converted document into the corpus.
///
/// # Errors
/// * `CorpusError::NoMatch` if no regulation can be attributed
/// * `CorpusError::LowConfidence` if the single-regulation match is too weak
///   and low-confidence matches are not accepted
///
/// Failures writing individual regulations are recorded in the summary.
pub fn process_markdown(
    text: &str,
    source_name: &str,
    ctx: &ProcessContext<'_>,
) -> Result<ProcessOutcome> {
    let lines: Vec<&str> = text.lines().collect();
    let headings = catalog_headings(&lines, ctx.catalog);
    tracing::info!(source = source_name, headings = headings.len(), "analyzed document");

    if headings.len() >= 2 {
        return split_and_apply(&lines, headings, source_name, ctx);
    }

    match resolve_single(&lines, source_name, ctx)? {
        Some((code, confidence, tier)) => {
            let block = ContentBlock {
                code: code.clone(),
                lines: lines.iter().map(|l| (*l).to_string()).collect(),
            };
            let mode = ProcessMode::Single {
                code,
                confidence,
                tier,
            };
            Ok(apply_blocks(mode, vec![block], source_name, ctx))
        }
        None => {
            tracing::info!(source = source_name, "no title match, trying split boundaries");
            split_and_apply(&lines, headings, source_name, ctx)
        }
    }
}

/// Split a compilation at regulation boundaries and merge every block.
///
/// Unlike [`process_markdown`] the document is never treated as a single
/// regulation.
///
/// # Errors
/// * `CorpusError::NoMatch` if no line starts a regulation
pub fn process_compilation(
    text: &str,
    source_name: &str,
    ctx: &ProcessContext<'_>,
) -> Result<ProcessOutcome> {
    let lines: Vec<&str> = text.lines().collect();
    let headings = catalog_headings(&lines, ctx.catalog);
    split_and_apply(&lines, headings, source_name, ctx)
}

fn split_and_apply(
    lines: &[&str],
    headings: Vec<String>,
    source_name: &str,
    ctx: &ProcessContext<'_>,
) -> Result<ProcessOutcome> {
    let split = SplitEngine::for_catalog(ctx.catalog).split(lines);
    if split.is_empty() {
        return Err(CorpusError::NoMatch {
            input: source_name.to_string(),
        });
    }
    let mode = ProcessMode::Compilation { headings };
    Ok(apply_blocks(mode, split.into_blocks(), source_name, ctx))
}

fn apply_blocks(
    mode: ProcessMode,
    blocks: Vec<ContentBlock>,
    source_name: &str,
    ctx: &ProcessContext<'_>,
) -> ProcessOutcome {
    let engine = UpdateEngine::from_config(ctx.catalog, ctx.config);
    let summary = engine.apply(blocks);
    let report = write_change_report(&summary, ctx.config);

    tracing::info!(
        source = source_name,
        updated = summary.updated.len(),
        unchanged = summary.unchanged.len(),
        failed = summary.failed.len(),
        "processed document"
    );

    ProcessOutcome {
        source: source_name.to_string(),
        mode,
        summary,
        report,
    }
}

/// Attribute a whole document to one regulation.
///
/// Returns the code, confidence and matcher tier (`None` for a file name
/// code), or `Ok(None)` when neither the file name nor the first
/// meaningful line identifies a regulation.
fn resolve_single(
    lines: &[&str],
    source_name: &str,
    ctx: &ProcessContext<'_>,
) -> Result<Option<(String, f64, Option<MatchTier>)>> {
    if let Some(code) = extract_code_from_filename(source_name) {
        if ctx.catalog.get(&code).is_some() {
            tracing::info!(source = source_name, code = %code, "regulation code taken from file name");
            return Ok(Some((code, 1.0, None)));
        }
        tracing::warn!(source = source_name, code = %code, "file name code is not cataloged");
    }

    let Some(title_line) = first_meaningful_line(lines) else {
        return Ok(None);
    };
    let matcher = Matcher::new(ctx.catalog);
    let Some(found) = matcher.match_line(title_line) else {
        tracing::debug!(source = source_name, line = title_line, "first line matches no regulation");
        return Ok(None);
    };

    if found.confidence < ctx.config.min_confidence {
        if !ctx.accept_low_confidence {
            return Err(CorpusError::LowConfidence {
                input: source_name.to_string(),
                code: found.entry.code.clone(),
                confidence: found.confidence,
            });
        }
        tracing::warn!(
            source = source_name,
            code = %found.entry.code,
            confidence = found.confidence,
            "accepting low-confidence match"
        );
    }

    Ok(Some((found.entry.code.clone(), found.confidence, Some(found.tier))))
}

/// First line that still has more than two characters once trimmed and
/// stripped of a heading marker.
fn first_meaningful_line<'t>(lines: &[&'t str]) -> Option<&'t str> {
    lines
        .iter()
        .map(|line| strip_heading_marker(line.trim()))
        .find(|line| line.chars().count() >= MIN_TITLE_LINE_CHARS)
}

fn write_change_report(summary: &UpdateSummary, config: &RunConfig) -> ReportStatus {
    if summary.diffs.is_empty() {
        return ReportStatus::NotNeeded;
    }
    let now = Local::now();
    let html = render_report(&summary.diffs, &now);
    match write_report(&html, &config.reports_dir, config.output_encoding, &now) {
        Ok(path) => ReportStatus::Written(path),
        Err(e) => {
            tracing::warn!(dir = %config.reports_dir.display(), error = %e, "failed to write report");
            ReportStatus::Failed(e.to_string())
        }
    }
}

/// Convert a source document and merge it into the corpus.
pub fn process_document(path: &Path, ctx: &ProcessContext<'_>) -> Result<ProcessOutcome> {
    let format = SourceFormat::from_path(path)?;
    let text = ctx.converter.convert(path, format)?;
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    process_markdown(&text, &source_name, ctx)
}

/// Source documents in `dir` eligible for batch processing, sorted by name.
///
/// Only `.docx` and `.pdf` files are listed; office lock files (`~$...`)
/// are skipped.
pub fn find_source_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_lock = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('~'));
        if is_lock {
            continue;
        }
        if SourceFormat::from_path(&path).is_ok_and(|f| f.is_batch_source()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Process every source document in `dir`.
///
/// Each document is isolated: a failure is recorded and the batch moves
/// on. With `archive`, successfully processed sources are moved to the
/// history directory for the current year. `on_document` is called
/// before each document.
pub fn process_batch(
    dir: &Path,
    ctx: &ProcessContext<'_>,
    archive: bool,
    mut on_document: impl FnMut(usize, usize, &Path),
) -> Result<BatchSummary> {
    let files = find_source_files(dir)?;
    let total = files.len();
    let mut summary = BatchSummary::default();
    tracing::info!(dir = %dir.display(), documents = total, "starting batch");

    for (index, path) in files.iter().enumerate() {
        on_document(index, total, path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match process_document(path, ctx) {
            Ok(outcome) => {
                if archive {
                    let history = ctx.config.history_dir(Local::now().year());
                    if let Err(e) = archive_source(path, &history) {
                        tracing::warn!(source = %name, error = %e, "failed to archive source");
                        summary.not_archived.push((name.clone(), e.to_string()));
                    }
                }
                summary.succeeded.push(outcome);
            }
            Err(e) => {
                tracing::warn!(source = %name, error = %e, "failed to process document");
                summary.failed.push((name, e.to_string()));
            }
        }
    }

    Ok(summary)
}

/// Move a processed source into `history_dir`, never replacing an
/// earlier archived file of the same name.
pub fn archive_source(path: &Path, history_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(history_dir)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name"))?;

    let mut dest = history_dir.join(file_name);
    if dest.exists() {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let name = match extension {
            Some(ext) => format!("{stem}_{stamp}.{ext}"),
            None => format!("{stem}_{stamp}"),
        };
        dest = history_dir.join(name);
    }

    if fs::rename(path, &dest).is_err() {
        // Rename fails across filesystems
        fs::copy(path, &dest)?;
        fs::remove_file(path)?;
    }
    tracing::info!(source = %path.display(), archived = %dest.display(), "archived source");
    Ok(dest)
}

/// Suggested commit message for the regulations changed in a run.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use regcorpus::process::commit_message;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// assert_eq!(commit_message(&[("3-1-9", "교직원포상규정")], date).unwrap(),
///            "개정: 교직원포상규정 (3-1-9) - 2025-03-01");
/// assert!(commit_message(&[], date).is_none());
/// ```
#[must_use]
pub fn commit_message(changed: &[(&str, &str)], date: NaiveDate) -> Option<String> {
    let date = date.format("%Y-%m-%d");
    match changed {
        [] => None,
        [(code, title)] => Some(format!("개정: {title} ({code}) - {date}")),
        _ => Some(format!("규정 일괄 개정 - {date}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    /// Returns canned markup for every input, or fails for names containing "broken".
    struct CannedConverter(String);

    impl Converter for CannedConverter {
        fn convert(&self, input: &Path, _format: SourceFormat) -> Result<String> {
            if input.to_string_lossy().contains("broken") {
                return Err(CorpusError::ConversionFailed {
                    input: input.to_path_buf(),
                    message: "corrupt document".to_string(),
                });
            }
            Ok(self.0.clone())
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new("3-1-9", "교직원포상규정", "3-학사", "regulations/3-학사/3-1-9.md", "3-1-9.md"),
            CatalogEntry::new("3-2-11", "보수 지급 규정", "3-학사", "regulations/3-학사/3-2-11.md", "3-2-11.md"),
        ])
    }

    fn setup() -> (TempDir, RunConfig, Catalog) {
        let dir = tempdir().unwrap();
        let config = RunConfig::new(dir.path());
        (dir, config, catalog())
    }

    fn read(config: &RunConfig, relative: &str) -> String {
        fs::read_to_string(config.root.join(relative)).unwrap()
    }

    #[test]
    fn test_compilation_is_split() {
        let (_dir, config, catalog) = setup();
        let converter = CannedConverter(String::new());
        let ctx = ProcessContext::new(&config, &catalog, &converter);

        let text = "표지\n# 교직원포상규정\n제1조 포상\n# 보수 지급 규정\n제1조 보수";
        let outcome = process_markdown(text, "규정집.md", &ctx).unwrap();

        assert!(matches!(outcome.mode, ProcessMode::Compilation { ref headings } if headings.len() == 2));
        assert_eq!(outcome.summary.updated.len(), 2);
        assert_eq!(read(&config, "regulations/3-학사/3-1-9.md"), "# 교직원포상규정\n제1조 포상\n");
        assert_eq!(read(&config, "regulations/3-학사/3-2-11.md"), "# 보수 지급 규정\n제1조 보수\n");
        assert!(matches!(outcome.report, ReportStatus::Written(ref p) if p.exists()));
    }

    #[test]
    fn test_compilation_forced_split_drops_preamble() {
        let (_dir, config, catalog) = setup();
        let converter = CannedConverter(String::new());
        let ctx = ProcessContext::new(&config, &catalog, &converter);

        let outcome = process_compilation("표지\n# 교직원포상규정\n제1조", "3-2-11.md", &ctx).unwrap();

        assert_eq!(outcome.summary.updated.len(), 1);
        assert_eq!(read(&config, "regulations/3-학사/3-1-9.md"), "# 교직원포상규정\n제1조\n");
        assert!(matches!(
            process_compilation("표지", "x.md", &ctx),
            Err(CorpusError::NoMatch { .. })
        ));
    }

    #[test]
    fn test_single_by_file_name_code() {
        let (_dir, config, catalog) = setup();
        let converter = CannedConverter(String::new());
        let ctx = ProcessContext::new(&config, &catalog, &converter);

        let outcome = process_markdown("개정 전문\n제1조 목적", "3-2-11_개정.docx", &ctx).unwrap();

        assert_eq!(
            outcome.mode,
            ProcessMode::Single {
                code: "3-2-11".to_string(),
                confidence: 1.0,
                tier: None
            }
        );
        assert_eq!(read(&config, "regulations/3-학사/3-2-11.md"), "개정 전문\n제1조 목적\n");
    }

    #[test]
    fn test_single_by_first_line_keeps_whole_document() {
        let (_dir, config, catalog) = setup();
        let converter = CannedConverter(String::new());
        let ctx = ProcessContext::new(&config, &catalog, &converter);

        let outcome = process_markdown("\n# 교직원포상규정\n제1조", "new.docx", &ctx).unwrap();

        assert!(matches!(outcome.mode, ProcessMode::Single { ref code, .. } if code == "3-1-9"));
        assert_eq!(read(&config, "regulations/3-학사/3-1-9.md"), "\n# 교직원포상규정\n제1조\n");
    }

    #[test]
    fn test_low_confidence_rejected_then_accepted() {
        let (_dir, config, catalog) = setup();
        let converter = CannedConverter(String::new());
        let text = "# 교직원 표창 규정\n제1조";

        let ctx = ProcessContext::new(&config, &catalog, &converter);
        let err = process_markdown(text, "new.docx", &ctx).unwrap_err();
        assert!(matches!(err, CorpusError::LowConfidence { ref code, .. } if code == "3-1-9"));
        assert!(!config.root.join("regulations/3-학사/3-1-9.md").exists());

        let ctx = ctx.with_accept_low_confidence(true);
        let outcome = process_markdown(text, "new.docx", &ctx).unwrap();
        match outcome.mode {
            ProcessMode::Single { confidence, tier, .. } => {
                assert!(confidence < 0.8);
                assert_eq!(tier, Some(MatchTier::Similarity));
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn test_no_match_leaves_corpus_untouched() {
        let (_dir, config, catalog) = setup();
        let converter = CannedConverter(String::new());
        let ctx = ProcessContext::new(&config, &catalog, &converter);

        let err = process_markdown("회의록\n안건 없음", "minutes.docx", &ctx).unwrap_err();
        assert!(matches!(err, CorpusError::NoMatch { .. }));
        assert!(!config.corpus_dir.exists());
        assert!(!config.reports_dir.exists());
    }

    #[test]
    fn test_unchanged_document_writes_no_report() {
        let (_dir, config, catalog) = setup();
        let converter = CannedConverter(String::new());
        let ctx = ProcessContext::new(&config, &catalog, &converter);

        process_markdown("# 교직원포상규정\n제1조", "a.md", &ctx).unwrap();
        let again = process_markdown("# 교직원포상규정\n제1조\n", "a.md", &ctx).unwrap();

        assert_eq!(again.report, ReportStatus::NotNeeded);
        assert_eq!(again.summary.unchanged, vec!["3-1-9"]);
    }

    #[test]
    fn test_batch_isolates_failures_and_archives() {
        let (_dir, config, catalog) = setup();
        let converter = CannedConverter("# 교직원포상규정\n제1조".to_string());
        let ctx = ProcessContext::new(&config, &catalog, &converter);

        let inbox = config.inbox_dir();
        fs::create_dir_all(&inbox).unwrap();
        fs::write(inbox.join("a_포상.docx"), b"").unwrap();
        fs::write(inbox.join("b_broken.pdf"), b"").unwrap();
        fs::write(inbox.join("~$a_포상.docx"), b"").unwrap();
        fs::write(inbox.join("notes.txt"), b"").unwrap();

        let mut seen = Vec::new();
        let summary = process_batch(&inbox, &ctx, true, |i, total, path| {
            seen.push((i, total, path.file_name().unwrap().to_string_lossy().into_owned()));
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![(0, 2, "a_포상.docx".to_string()), (1, 2, "b_broken.pdf".to_string())]
        );
        assert_eq!(summary.succeeded.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "b_broken.pdf");
        assert!(summary.has_failures());
        assert_eq!(summary.updated().count(), 1);

        assert!(!inbox.join("a_포상.docx").exists());
        assert!(inbox.join("b_broken.pdf").exists());
        let archived = config.history_dir(Local::now().year()).join("a_포상.docx");
        assert!(archived.exists());
    }

    #[test]
    fn test_archive_never_replaces() {
        let dir = tempdir().unwrap();
        let history = dir.path().join("history");
        fs::create_dir_all(&history).unwrap();
        fs::write(history.join("a.docx"), b"old").unwrap();
        let source = dir.path().join("a.docx");
        fs::write(&source, b"new").unwrap();

        let dest = archive_source(&source, &history).unwrap();

        assert_ne!(dest, history.join("a.docx"));
        assert_eq!(fs::read(history.join("a.docx")).unwrap(), b"old");
        assert_eq!(fs::read(dest).unwrap(), b"new");
        assert!(!source.exists());
    }

    #[test]
    fn test_commit_message_forms() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(
            commit_message(&[("3-1-9", "교직원포상규정"), ("3-2-11", "보수 지급 규정")], date).unwrap(),
            "규정 일괄 개정 - 2025-03-01"
        );
    }

    #[test]
    fn test_first_meaningful_line() {
        assert_eq!(first_meaningful_line(&["", "# 가", "  ## 교직원포상규정 "]), Some("교직원포상규정"));
        assert_eq!(first_meaningful_line(&["", "##", "가나"]), None);
    }
}
