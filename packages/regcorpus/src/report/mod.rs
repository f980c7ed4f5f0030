//! HTML change reports.
//!
//! One self-contained document per run, with a section per changed
//! regulation. Reports are timestamped and never overwrite each other.

mod diff;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::{OutputEncoding, REPORT_CONTEXT_LINES};

pub use diff::{escape_html, render_diff_table};

/// Before/after content of one changed regulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord {
    pub code: String,
    pub title: String,
    pub old_lines: Vec<String>,
    pub new_lines: Vec<String>,
}

impl DiffRecord {
    /// Record a change from `old` to `new` text.
    #[must_use]
    pub fn new(code: impl Into<String>, title: impl Into<String>, old: &str, new: &str) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            old_lines: old.lines().map(String::from).collect(),
            new_lines: new.lines().map(String::from).collect(),
        }
    }
}

const STYLE: &str = r"
body { font-family: 'Malgun Gothic', 'Apple SD Gothic Neo', sans-serif; margin: 2em; }
h1 { border-bottom: 2px solid #333; padding-bottom: 0.3em; }
h2 { margin-top: 2em; color: #1a4d8f; }
table.diff { border-collapse: collapse; width: 100%; font-family: monospace; font-size: 0.9em; }
table.diff td, table.diff th { border: 1px solid #ddd; padding: 2px 6px; vertical-align: top; white-space: pre-wrap; }
td.diff_next { color: #888; text-align: right; width: 3em; }
tr.diff_add td { background: #aaffaa; }
tr.diff_chg td { background: #ffff77; }
tr.diff_sub td { background: #ffaaaa; }
tr.diff_sep td { text-align: center; color: #888; }
";

/// Render the report document for a set of diffs.
#[must_use]
pub fn render_report(diffs: &[DiffRecord], generated_at: &DateTime<Local>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"ko\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>규정 업데이트 보고서</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<h1>규정 업데이트 보고서</h1>\n");
    html.push_str(&format!(
        "<p>Generated at {} &middot; {} regulation(s) changed</p>\n",
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        diffs.len()
    ));

    for record in diffs {
        html.push_str(&format!(
            "<section>\n<h2>{} ({})</h2>\n",
            escape_html(&record.title),
            escape_html(&record.code)
        ));
        html.push_str(&render_diff_table(
            &record.old_lines,
            &record.new_lines,
            REPORT_CONTEXT_LINES,
        ));
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Write a rendered report into `dir` under a timestamped name.
///
/// An existing report with the same name is never replaced; a counter is
/// appended instead. Returns the path written.
pub fn write_report(
    html: &str,
    dir: &Path,
    encoding: OutputEncoding,
    now: &DateTime<Local>,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let stem = format!("update_report_{}", now.format("%Y%m%d_%H%M%S"));
    let bytes = encoding.encode(html);

    let mut counter = 0;
    loop {
        let name = if counter == 0 {
            format!("{stem}.html")
        } else {
            format!("{stem}_{counter}.html")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(&bytes)?;
                tracing::info!(path = %path.display(), "wrote report");
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(e),
        }
    }
}
