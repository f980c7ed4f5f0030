//! Conversion of source documents to markup text.
//!
//! Word-processor documents go through `pandoc`. PDF input is first turned
//! into a temporary DOCX with `pdf2docx`, since converting PDF straight to
//! markup loses the heading structure the splitter depends on.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::{CorpusError, Result};

/// Source document format, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Docx,
    Pdf,
    /// Already converted markup; read as is.
    Markdown,
}

impl SourceFormat {
    /// Detect the format of `path` (case-insensitive extension).
    ///
    /// # Examples
    /// ```
    /// use regcorpus::convert::SourceFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(SourceFormat::from_path(Path::new("a.DOCX")).unwrap(), SourceFormat::Docx);
    /// assert!(SourceFormat::from_path(Path::new("a.hwp")).is_err());
    /// ```
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            "md" | "markdown" => Ok(Self::Markdown),
            _ => Err(CorpusError::UnsupportedFormat(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )),
        }
    }

    /// Whether batch processing picks up files of this format from the inbox.
    #[must_use]
    pub fn is_batch_source(&self) -> bool {
        matches!(self, Self::Docx | Self::Pdf)
    }
}

/// Turns a source document into markup text.
pub trait Converter {
    /// Convert `input` of the given format. Blocks until done.
    fn convert(&self, input: &Path, format: SourceFormat) -> Result<String>;
}

/// Converter backed by the `pandoc` and `pdf2docx` executables.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    pandoc: String,
    pdf2docx: String,
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self {
            pandoc: "pandoc".to_string(),
            pdf2docx: "pdf2docx".to_string(),
        }
    }
}

impl PandocConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use specific executables instead of the ones on `PATH`.
    pub fn with_programs(pandoc: impl Into<String>, pdf2docx: impl Into<String>) -> Self {
        Self {
            pandoc: pandoc.into(),
            pdf2docx: pdf2docx.into(),
        }
    }

    fn docx_to_markdown(&self, input: &Path) -> Result<String> {
        let input_arg = input.to_string_lossy();
        run_tool(
            &self.pandoc,
            &["-f", "docx", "-t", "markdown", "--wrap=none", &input_arg],
            input,
        )
    }

    fn pdf_to_markdown(&self, input: &Path) -> Result<String> {
        let work_dir = tempfile::tempdir()?;
        let docx = work_dir.path().join("converted.docx");
        let input_arg = input.to_string_lossy();
        let docx_arg = docx.to_string_lossy();

        run_tool(&self.pdf2docx, &["convert", &input_arg, &docx_arg], input)?;
        if !docx.exists() {
            return Err(CorpusError::ConversionFailed {
                input: input.to_path_buf(),
                message: format!("{} produced no output", self.pdf2docx),
            });
        }
        self.docx_to_markdown(&docx)
    }
}

impl Converter for PandocConverter {
    fn convert(&self, input: &Path, format: SourceFormat) -> Result<String> {
        tracing::info!(input = %input.display(), format = ?format, "converting document");
        match format {
            SourceFormat::Docx => self.docx_to_markdown(input),
            SourceFormat::Pdf => self.pdf_to_markdown(input),
            SourceFormat::Markdown => Ok(fs::read_to_string(input)?),
        }
    }
}

/// Run an external tool and return its stdout.
fn run_tool(program: &str, args: &[&str], input: &Path) -> Result<String> {
    tracing::debug!(program, args = ?args, "running converter");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| CorpusError::ConverterUnavailable {
            program: program.to_string(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !output.status.success() {
        let message = if stderr.is_empty() {
            format!("{program} exited with {:?}", output.status.code())
        } else {
            stderr
        };
        return Err(CorpusError::ConversionFailed {
            input: input.to_path_buf(),
            message,
        });
    }

    if !stderr.is_empty() {
        tracing::debug!(program, stderr = %stderr, "converter stderr (non-fatal)");
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
