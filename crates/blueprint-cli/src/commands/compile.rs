//! Compile command implementation.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use blueprint_compiler::{checksum, PolicyBuilder};
use clap::Args;
use tracing::info;

use super::{load_tree, report_lines, BuilderOptions};

/// Arguments for the compile command.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Path to the policy document
    pub file: PathBuf,

    /// Write Rego to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Generate without validating
    #[arg(long)]
    pub no_validate: bool,

    #[command(flatten)]
    pub options: BuilderOptions,
}

/// Runs the compile command.
pub fn run(args: &CompileArgs) -> Result<()> {
    info!(file = ?args.file, "Compiling policy document");

    let tree = load_tree(&args.file)?;
    let builder = PolicyBuilder::with_config(args.options.load()?);

    let (rego, digest) = if args.no_validate {
        let rego = builder.generate_rego(&tree)?;
        let digest = checksum(&rego);
        (rego, digest)
    } else {
        let output = builder.build_configured(&tree)?;
        if !output.report.is_empty() {
            eprintln!("{}", args.file.display());
            for line in report_lines(&output.report) {
                eprintln!("{line}");
            }
        }
        let digest = output.checksum.clone().unwrap_or_default();
        (output.into_rego()?, digest)
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &rego)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Wrote {}", path.display());
            println!("  sha256: {digest}");
        }
        None => print!("{rego}"),
    }
    Ok(())
}
