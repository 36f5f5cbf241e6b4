//! Validate command implementation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use blueprint_compiler::PolicyBuilder;
use blueprint_core::PolicyReport;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{is_document, load_tree, report_lines, BuilderOptions};

/// Report output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per finding
    #[default]
    Text,
    /// A JSON array of reports
    Json,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to a policy document or a directory of documents
    #[arg(default_value = "policies")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub options: BuilderOptions,
}

/// Validation outcome for one document.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// Path of the document.
    pub file: String,
    /// Whether the findings block compilation.
    pub blocked: bool,
    /// Findings, absent if the document could not be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PolicyReport>,
    /// Load failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the validate command.
pub fn run(args: &ValidateArgs) -> Result<()> {
    info!(path = ?args.path, "Validating policy documents");

    let files = collect_documents(&args.path)?;
    let builder = PolicyBuilder::with_config(args.options.load()?);
    let reports: Vec<FileReport> = files.iter().map(|path| validate_file(&builder, path)).collect();

    match args.format {
        OutputFormat::Text => print_text(&reports),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    let failed = reports.iter().filter(|r| r.blocked).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} documents failed validation", reports.len());
    }
    Ok(())
}

/// Lists the documents under `path`, sorted by path.
pub fn collect_documents(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_document(entry.path()) {
            files.push(entry.into_path());
        }
    }
    if files.is_empty() {
        warn!(path = %path.display(), "No policy documents found");
    }
    Ok(files)
}

fn validate_file(builder: &PolicyBuilder, path: &Path) -> FileReport {
    let file = path.display().to_string();
    match load_tree(path) {
        Ok(tree) => {
            let report = builder.validate_configured(&tree);
            FileReport {
                file,
                blocked: builder.blocks(&report),
                report: Some(report),
                error: None,
            }
        }
        Err(e) => FileReport {
            file,
            blocked: true,
            report: None,
            error: Some(format!("{e:#}")),
        },
    }
}

fn print_text(reports: &[FileReport]) {
    for file in reports {
        let symbol = if file.blocked { '✗' } else { '✓' };
        println!("{symbol} {}", file.file);
        if let Some(error) = &file.error {
            println!("  ✗ {error}");
        }
        if let Some(report) = &file.report {
            for line in report_lines(report) {
                println!("{line}");
            }
        }
    }
    let passed = reports.iter().filter(|r| !r.blocked).count();
    println!("\nValidated {} documents, {passed} passed", reports.len());
}
