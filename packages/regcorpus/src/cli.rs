//! Command-line interface for the corpus updater.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::{load_catalog, rebuild_catalog, Catalog};
use crate::config::RunConfig;
use crate::convert::PandocConverter;
use crate::error::{CorpusError, Result};
use crate::export::export_by_title;
use crate::matching::Matcher;
use crate::process::{
    commit_message, process_batch, process_compilation, process_document, BatchSummary,
    ProcessContext, ProcessMode, ProcessOutcome, ReportStatus,
};
use crate::update::{sanitize_corpus, sweep_corpus, UpdateOutcome};

/// Regcorpus - keep a regulation corpus in sync with revised source documents.
#[derive(Parser)]
#[command(name = "regcorpus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project root containing the catalog and the corpus directory
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert one DOCX/PDF/Markdown source and merge it into the corpus.
    Process {
        /// Source document
        file: PathBuf,

        /// Accept a single-regulation match below the minimum confidence
        #[arg(long)]
        accept_low_confidence: bool,

        /// Minimum accepted match confidence, between 0 and 1 (default: 0.8)
        #[arg(long)]
        min_confidence: Option<f64>,
    },

    /// Split an already converted compilation and merge every regulation.
    Split {
        /// Markdown document
        markdown: PathBuf,
    },

    /// Process every DOCX/PDF source in the inbox.
    Batch {
        /// Inbox directory (default: regulations_source/new)
        #[arg(long)]
        inbox: Option<PathBuf>,

        /// Move processed sources to regulations_source/history/<year>
        #[arg(long)]
        archive: bool,
    },

    /// Show which regulation a line of text matches.
    Match {
        /// Line to match, e.g. a heading
        line: String,
    },

    /// Rescan the corpus and rewrite the catalog file.
    RebuildCatalog,

    /// Delete expired backups of every cataloged regulation.
    Sweep {
        /// Maximum backup age in days (default: 7)
        #[arg(long)]
        days: Option<u64>,
    },

    /// Rewrite stored regulations the site renderer would reject.
    #[command(alias = "fix")]
    Sanitize,

    /// Copy every regulation to <OUT_DIR>/<title>.md.
    Export {
        /// Output directory
        out_dir: PathBuf,
    },
}

/// Run the CLI.
pub fn run() -> Result<ExitCode> {
    run_with(Cli::parse())
}

/// Run a parsed command line.
pub fn run_with(cli: Cli) -> Result<ExitCode> {
    let config = RunConfig::from_env(&cli.root)?;

    match cli.command {
        Commands::Process {
            file,
            accept_low_confidence,
            min_confidence,
        } => {
            let config = match min_confidence {
                Some(value) => config.with_min_confidence(value)?,
                None => config,
            };
            process_command(&config, &file, accept_low_confidence)
        }
        Commands::Split { markdown } => split_command(&config, &markdown),
        Commands::Batch { inbox, archive } => {
            let inbox = inbox.unwrap_or_else(|| config.inbox_dir());
            batch_command(&config, &inbox, archive)
        }
        Commands::Match { line } => match_command(&config, &line),
        Commands::RebuildCatalog => rebuild_command(&config),
        Commands::Sweep { days } => {
            let config = match days {
                Some(days) => config.with_retention_days(days),
                None => config,
            };
            sweep_command(&config)
        }
        Commands::Sanitize => sanitize_command(&config),
        Commands::Export { out_dir } => export_command(&config, &out_dir),
    }
}

fn load(config: &RunConfig) -> Result<Catalog> {
    let catalog = load_catalog(&config.catalog_path)?;
    println!(
        "{} {} regulations",
        style("Catalog:").bold(),
        style(catalog.len()).cyan()
    );
    Ok(catalog)
}

fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(CorpusError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Source file does not exist: {}", path.display()),
        )));
    }
    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Execute the process command.
fn process_command(config: &RunConfig, file: &Path, accept_low_confidence: bool) -> Result<ExitCode> {
    require_file(file)?;
    let catalog = load(config)?;
    let converter = PandocConverter::new();
    let ctx = ProcessContext::new(config, &catalog, &converter)
        .with_accept_low_confidence(accept_low_confidence);

    println!("{} {}", style("Processing").bold(), style(file.display()).cyan());
    let pb = spinner();
    pb.set_message("Converting and merging...");
    let result = process_document(file, &ctx);
    pb.finish_and_clear();

    let outcome = result?;
    print_outcome(&outcome);
    print_commit_hint(&outcome.summary.updated);
    Ok(exit_code(!outcome.summary.has_failures()))
}

/// Execute the split command.
fn split_command(config: &RunConfig, markdown: &Path) -> Result<ExitCode> {
    require_file(markdown)?;
    let catalog = load(config)?;
    let converter = PandocConverter::new();
    let ctx = ProcessContext::new(config, &catalog, &converter);

    let text = std::fs::read_to_string(markdown)?;
    let name = markdown
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let outcome = process_compilation(&text, &name, &ctx)?;

    print_outcome(&outcome);
    print_commit_hint(&outcome.summary.updated);
    Ok(exit_code(!outcome.summary.has_failures()))
}

/// Execute the batch command.
fn batch_command(config: &RunConfig, inbox: &Path, archive: bool) -> Result<ExitCode> {
    if !inbox.is_dir() {
        return Err(CorpusError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Inbox directory does not exist: {}", inbox.display()),
        )));
    }
    let catalog = load(config)?;
    let converter = PandocConverter::new();
    let ctx = ProcessContext::new(config, &catalog, &converter);

    let pb = ProgressBar::new(0);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:30.green} {pos}/{len} {msg}")
            .expect("valid template"),
    );
    let result = process_batch(inbox, &ctx, archive, |index, total, path| {
        pb.set_length(total as u64);
        pb.set_position(index as u64);
        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
    });
    pb.finish_and_clear();

    let summary = result?;
    print_batch_summary(&summary);
    let updated: Vec<UpdateOutcome> = summary.updated().cloned().collect();
    print_commit_hint(&updated);
    Ok(exit_code(!summary.has_failures()))
}

/// Execute the match command.
fn match_command(config: &RunConfig, line: &str) -> Result<ExitCode> {
    let catalog = load(config)?;
    let matcher = Matcher::new(&catalog);

    match matcher.match_line(line) {
        Some(found) => {
            println!(
                "{} {} ({})",
                style("Match:").green().bold(),
                style(&found.entry.title).green(),
                found.entry.code
            );
            println!("  Tier: {}", found.tier.as_str());
            println!("  Confidence: {:.1}%", found.confidence * 100.0);
            if found.confidence < config.min_confidence {
                println!("  {}", style("Below minimum confidence").yellow());
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("{}", style("No matching regulation").yellow().bold());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Execute the rebuild-catalog command.
fn rebuild_command(config: &RunConfig) -> Result<ExitCode> {
    let pb = spinner();
    pb.set_message("Scanning corpus...");
    let result = rebuild_catalog(config);
    pb.finish_and_clear();
    let outcome = result?;

    println!(
        "{} {} ({} regulations)",
        style("Saved to:").green().bold(),
        config.catalog_path.display(),
        outcome.catalog.len()
    );
    for (category, count) in outcome.catalog.category_counts() {
        let category = if category.is_empty() { "(root)" } else { category };
        println!("  {category}: {count}");
    }
    for path in &outcome.untitled {
        println!("  {} no heading: {}", style("Skipped").yellow(), path.display());
    }
    for path in &outcome.uncoded {
        println!("  {} not a regulation code: {}", style("Skipped").yellow(), path.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute the sweep command.
fn sweep_command(config: &RunConfig) -> Result<ExitCode> {
    let catalog = load(config)?;
    let days = config.retention_days;
    let removed = sweep_corpus(&catalog, &config.root, days);
    println!(
        "{} {removed} backups older than {days} days",
        style("Removed").green().bold()
    );
    Ok(ExitCode::SUCCESS)
}

/// Execute the sanitize command.
fn sanitize_command(config: &RunConfig) -> Result<ExitCode> {
    let catalog = load(config)?;
    let summary = sanitize_corpus(&catalog, &config.root);

    for code in &summary.fixed {
        println!("  {} {code}", style("Fixed").green());
    }
    for code in &summary.missing {
        println!("  {} {code}", style("Missing:").yellow());
    }
    for (code, reason) in &summary.failed {
        println!("  {} {code}: {reason}", style("Failed:").red());
    }
    println!(
        "{} {} fixed, {} unchanged, {} missing, {} failed",
        style("Sanitize:").bold(),
        style(summary.fixed.len()).green(),
        summary.unchanged,
        summary.missing.len(),
        style(summary.failed.len()).red()
    );
    Ok(exit_code(summary.failed.is_empty()))
}

/// Execute the export command.
fn export_command(config: &RunConfig, out_dir: &Path) -> Result<ExitCode> {
    let catalog = load(config)?;
    let summary = export_by_title(&catalog, &config.root, out_dir)?;

    println!(
        "{} {} files to {}",
        style("Exported").green().bold(),
        summary.copied.len(),
        out_dir.display()
    );
    for code in &summary.missing {
        println!("  {} {code}", style("Missing:").yellow());
    }
    for (code, reason) in &summary.failed {
        println!("  {} {code}: {reason}", style("Failed:").red());
    }
    Ok(exit_code(summary.failed.is_empty()))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_outcome(outcome: &ProcessOutcome) {
    match &outcome.mode {
        ProcessMode::Compilation { headings } => println!(
            "  Mode: compilation ({} catalog headings)",
            headings.len()
        ),
        ProcessMode::Single {
            code, confidence, ..
        } => println!(
            "  Mode: single regulation {} ({:.1}%)",
            style(code).cyan(),
            confidence * 100.0
        ),
    }

    let summary = &outcome.summary;
    for updated in &summary.updated {
        println!(
            "  {} {} ({})",
            style("Updated").green(),
            updated.title,
            updated.code
        );
        if let Some(backup) = &updated.backup_path {
            println!("    backup: {}", backup.display());
        }
    }
    if !summary.unchanged.is_empty() {
        println!("  Unchanged: {}", summary.unchanged.len());
    }
    for (code, reason) in &summary.failed {
        println!("  {} {code}: {reason}", style("Failed").red().bold());
    }

    match &outcome.report {
        ReportStatus::NotNeeded => {}
        ReportStatus::Written(path) => {
            println!("{} {}", style("Report:").green().bold(), path.display());
        }
        ReportStatus::Failed(reason) => {
            println!("{} {reason}", style("Report not written:").yellow().bold());
        }
    }
}

fn print_batch_summary(summary: &BatchSummary) {
    for outcome in &summary.succeeded {
        println!("{} {}", style("Processed").bold(), outcome.source);
        print_outcome(outcome);
    }
    println!();
    println!(
        "{} {} succeeded, {} failed",
        style("Batch:").bold(),
        style(summary.succeeded.len()).green(),
        style(summary.failed.len()).red()
    );
    for (file, reason) in &summary.failed {
        println!("  {} {file}: {reason}", style("Failed").red().bold());
    }
    for (file, reason) in &summary.not_archived {
        println!("  {} {file}: {reason}", style("Not archived").yellow());
    }
}

fn print_commit_hint(updated: &[UpdateOutcome]) {
    let changed: Vec<(&str, &str)> = updated
        .iter()
        .map(|u| (u.code.as_str(), u.title.as_str()))
        .collect();
    if let Some(message) = commit_message(&changed, chrono::Local::now().date_naive()) {
        println!();
        println!("{}", style("Suggested commit:").bold());
        println!("  git commit -m \"{message}\"");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_process() {
        let cli = Cli::parse_from(["regcorpus", "process", "규정집.docx"]);

        assert_eq!(cli.root, PathBuf::from("."));
        let Commands::Process {
            file,
            accept_low_confidence,
            min_confidence,
        } = cli.command
        else {
            panic!("expected process command");
        };
        assert_eq!(file, PathBuf::from("규정집.docx"));
        assert!(!accept_low_confidence);
        assert!(min_confidence.is_none());
    }

    #[test]
    fn test_cli_parse_global_root_after_subcommand() {
        let cli = Cli::parse_from([
            "regcorpus",
            "sweep",
            "--days",
            "3",
            "--root",
            "/srv/rules",
        ]);

        assert_eq!(cli.root, PathBuf::from("/srv/rules"));
        assert!(matches!(cli.command, Commands::Sweep { days: Some(3) }));
    }

    #[test]
    fn test_cli_parse_batch_flags() {
        let cli = Cli::parse_from(["regcorpus", "batch", "--inbox", "in", "--archive"]);

        let Commands::Batch { inbox, archive } = cli.command else {
            panic!("expected batch command");
        };
        assert_eq!(inbox, Some(PathBuf::from("in")));
        assert!(archive);
    }

    #[test]
    fn test_cli_parse_fix_alias() {
        let cli = Cli::parse_from(["regcorpus", "fix"]);
        assert!(matches!(cli.command, Commands::Sanitize));
    }

    #[test]
    fn test_cli_parse_rebuild_catalog() {
        let cli = Cli::parse_from(["regcorpus", "rebuild-catalog"]);
        assert!(matches!(cli.command, Commands::RebuildCatalog));
    }
}
