//! CLI commands and argument parsing.

pub mod compile;
pub mod validate;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blueprint_compiler::BuilderConfig;
use blueprint_core::{PolicyDocument, PolicyReport, PolicyTree, RuleSeverity};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

/// Blueprint - Policy builder producing Rego
#[derive(Parser)]
#[command(name = "blueprint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Validate policy documents
    Validate(validate::ValidateArgs),

    /// Validate a policy document and generate Rego
    Compile(compile::CompileArgs),

    /// Print version information
    Version,
}

/// Options selecting which rulesets run and how Rego is generated.
///
/// Flags override values loaded from `--config`.
#[derive(Args, Debug, Default)]
pub struct BuilderOptions {
    /// YAML builder configuration file
    #[arg(short, long, env = "BLUEPRINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fail on warnings and check generated syntax
    #[arg(long, conflicts_with = "lenient")]
    pub strict: bool,

    /// Skip the logic ruleset
    #[arg(long)]
    pub lenient: bool,

    /// Also apply the saved policy ruleset
    #[arg(long)]
    pub saved: bool,

    /// Package header for generated Rego
    #[arg(long)]
    pub package: Option<String>,
}

impl BuilderOptions {
    /// Resolves the effective builder configuration.
    pub fn load(&self) -> Result<BuilderConfig> {
        let mut config = if let Some(path) = &self.config {
            BuilderConfig::from_yaml_file(path)?
        } else if self.strict {
            BuilderConfig::strict()
        } else if self.lenient {
            BuilderConfig::lenient()
        } else {
            BuilderConfig::default()
        };
        if self.strict {
            config.fail_on_warnings = true;
            config.check_syntax = true;
        }
        if self.lenient {
            config.run_logic = false;
        }
        if self.saved {
            config.run_saved_policy = true;
        }
        if let Some(package) = &self.package {
            config.package = Some(package.clone());
        }
        debug!(?config, "Resolved builder config");
        Ok(config)
    }
}

/// Returns true if `path` looks like a policy document.
pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e, "json" | "yaml" | "yml"))
}

/// Reads a JSON or YAML policy document and resolves it into a tree.
pub fn load_tree(path: &Path) -> Result<PolicyTree> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: PolicyDocument = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid policy document {}", path.display()))?,
        _ => PolicyDocument::from_json(&content)
            .with_context(|| format!("Invalid policy document {}", path.display()))?,
    };
    document
        .into_tree()
        .with_context(|| format!("Unresolved reference in {}", path.display()))
}

/// Formats every finding of `report`, one per line.
pub fn report_lines(report: &PolicyReport) -> Vec<String> {
    let errors = report.errors().iter().map(|error| format!("  ✗ error {error}"));
    let violations = report.violations().iter().map(|violation| {
        let symbol = match violation.severity {
            RuleSeverity::Error => '✗',
            RuleSeverity::Warn => '⚠',
            RuleSeverity::Info => 'ℹ',
        };
        format!(
            "  {symbol} {} {}: {} ({})",
            violation.severity, violation.location, violation.message, violation.rule
        )
    });
    errors.chain(violations).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_report_lines() {
        let mut fixture = blueprint_test::PolicyFixture::valid();
        fixture.policy.policy_type = String::new();
        let report = blueprint_compiler::PolicyBuilder::new().validate_configured(&fixture.into_tree());
        assert_eq!(
            report_lines(&report),
            vec!["  ✗ error policy.policyType: A policy must have a policy type (Constraint Validation Rule)"]
        );
    }

    #[test]
    fn test_is_document() {
        assert!(is_document(Path::new("policy.json")));
        assert!(is_document(Path::new("policy.yml")));
        assert!(!is_document(Path::new("policy.rego")));
        assert!(!is_document(Path::new("README")));
    }

    #[test]
    fn test_options_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "package: from_file\nrun_saved_policy: false").unwrap();
        let options = BuilderOptions {
            config: Some(file.path().to_path_buf()),
            saved: true,
            package: Some("from_flag".to_string()),
            ..Default::default()
        };
        let config = options.load().unwrap();
        assert!(config.run_saved_policy);
        assert_eq!(config.package.as_deref(), Some("from_flag"));
    }

    #[test]
    fn test_strict_preset() {
        let options = BuilderOptions {
            strict: true,
            ..Default::default()
        };
        assert_eq!(options.load().unwrap(), BuilderConfig::strict());
    }

    #[test]
    fn test_load_yaml_document() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let yaml = serde_yaml::to_string(&blueprint_test::valid_document_json()).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let tree = load_tree(file.path()).unwrap();
        assert!(tree.root_policy().is_some());
    }

    #[test]
    fn test_load_invalid_document() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{\"policy\": 3}").unwrap();
        let err = load_tree(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid policy document"));
    }
}
