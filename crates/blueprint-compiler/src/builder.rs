//! Validation pipeline and Rego generation.
//!
//! The constraint ruleset always runs first. Its findings mean the tree is
//! not well-formed, so when it reports anything blocking the remaining
//! rulesets are skipped.
//!
//! # Example
//!
//! ```rust,ignore
//! use blueprint_compiler::PolicyBuilder;
//!
//! let builder = PolicyBuilder::new();
//! let output = builder.build_configured(&tree)?;
//! if let Some(rego) = &output.rego {
//!     println!("{rego}");
//! }
//! ```

use blueprint_core::{PolicyReport, PolicyRuleset, PolicyTree, RuleSeverity};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::config::BuilderConfig;
use crate::error::{CompilerError, Result};
use crate::rego::RegoCompiler;
use crate::rulesets::constraint_ruleset;

/// Result of [`PolicyBuilder::build`].
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    /// Findings of every ruleset that ran.
    pub report: PolicyReport,
    /// Generated source, absent when validation blocked the build.
    pub rego: Option<String>,
    /// Hex SHA-256 of `rego`.
    pub checksum: Option<String>,
}

impl BuildOutput {
    /// Returns true if Rego was generated.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.rego.is_some()
    }

    /// Returns the generated source.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::ValidationFailed`] if validation blocked the
    /// build.
    pub fn into_rego(self) -> Result<String> {
        self.rego.ok_or_else(|| CompilerError::ValidationFailed {
            violations: self.report.count(RuleSeverity::Warn)
                + self.report.count(RuleSeverity::Error),
            errors: self.report.errors().len(),
        })
    }
}

/// Validates policy trees and generates Rego for them.
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    config: BuilderConfig,
    compiler: RegoCompiler,
}

impl PolicyBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with the given configuration.
    #[must_use]
    pub fn with_config(config: BuilderConfig) -> Self {
        let compiler = RegoCompiler::new(config.template());
        Self { config, compiler }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Runs the constraint ruleset, then `rulesets` in order.
    #[instrument(skip_all, fields(root = tree.root().identifier()))]
    pub fn validate(&self, tree: &PolicyTree, rulesets: &[&PolicyRuleset]) -> PolicyReport {
        let mut report = PolicyReport::new();
        constraint_ruleset().apply(tree, &mut report);
        if report.is_blocking() {
            debug!(
                errors = report.errors().len(),
                violations = report.violations().len(),
                "Constraint ruleset failed, skipping remaining rulesets"
            );
            return report;
        }
        for ruleset in rulesets {
            ruleset.apply(tree, &mut report);
        }
        info!(
            rulesets = rulesets.len() + 1,
            violations = report.violations().len(),
            errors = report.errors().len(),
            "Validated policy tree"
        );
        report
    }

    /// Runs the constraint ruleset, then the rulesets chosen by the
    /// configuration.
    pub fn validate_configured(&self, tree: &PolicyTree) -> PolicyReport {
        let rulesets = self.config.rulesets();
        let refs: Vec<&PolicyRuleset> = rulesets.iter().collect();
        self.validate(tree, &refs)
    }

    /// Generates Rego without validating.
    ///
    /// # Errors
    ///
    /// See [`RegoCompiler::compile`].
    pub fn generate_rego(&self, tree: &PolicyTree) -> Result<String> {
        self.compiler.compile(tree)
    }

    /// Returns true if `report` should prevent a build.
    ///
    /// Errors and error-level violations always block; warnings block only
    /// with `fail_on_warnings`.
    #[must_use]
    pub fn blocks(&self, report: &PolicyReport) -> bool {
        let threshold = if self.config.fail_on_warnings {
            RuleSeverity::Warn
        } else {
            RuleSeverity::Error
        };
        report.has_errors() || report.has_violations_at_least(threshold)
    }

    /// Validates with `rulesets` and, unless the report blocks, generates
    /// Rego and its checksum.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails. A blocked build is not an
    /// error; its output has no source.
    pub fn build(&self, tree: &PolicyTree, rulesets: &[&PolicyRuleset]) -> Result<BuildOutput> {
        let report = self.validate(tree, rulesets);
        if self.blocks(&report) {
            warn!(
                violations = report.violations().len(),
                errors = report.errors().len(),
                "Validation blocked the build"
            );
            return Ok(BuildOutput {
                report,
                rego: None,
                checksum: None,
            });
        }
        let rego = self.generate_rego(tree)?;
        let checksum = checksum(&rego);
        info!(checksum = %checksum, "Built policy");
        Ok(BuildOutput {
            report,
            rego: Some(rego),
            checksum: Some(checksum),
        })
    }

    /// [`build`](Self::build) with the configured rulesets.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    pub fn build_configured(&self, tree: &PolicyTree) -> Result<BuildOutput> {
        let rulesets = self.config.rulesets();
        let refs: Vec<&PolicyRuleset> = rulesets.iter().collect();
        self.build(tree, &refs)
    }
}

/// Hex SHA-256 of `source`.
#[must_use]
pub fn checksum(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}
