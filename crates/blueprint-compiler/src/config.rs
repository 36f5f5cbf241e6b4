//! Policy builder configuration.
//!
//! ```yaml
//! run_configuration: true
//! run_logic: true
//! logic_stop_on_first_failure: false
//! run_saved_policy: false
//! fail_on_warnings: false
//! package: authz
//! check_syntax: true
//! ```

use std::fs;
use std::path::Path;

use blueprint_core::PolicyRuleset;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CompilerError, Result};
use crate::rego::RegoTemplate;
use crate::rulesets;

/// Which rulesets run and how Rego is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct BuilderConfig {
    /// Whether to run the configuration ruleset.
    pub run_configuration: bool,
    /// Whether to run the logic ruleset.
    pub run_logic: bool,
    /// Whether the logic ruleset stops after its first failing rule.
    pub logic_stop_on_first_failure: bool,
    /// Whether to run the saved policy ruleset.
    pub run_saved_policy: bool,
    /// Whether warnings prevent a build.
    pub fail_on_warnings: bool,
    /// Package header for generated Rego.
    pub package: Option<String>,
    /// Whether to parse generated Rego before returning it.
    pub check_syntax: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            run_configuration: true,
            run_logic: true,
            logic_stop_on_first_failure: false,
            run_saved_policy: false,
            fail_on_warnings: false,
            package: None,
            check_syntax: false,
        }
    }
}

impl BuilderConfig {
    /// Creates a strict configuration that fails on warnings and checks
    /// generated syntax.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            fail_on_warnings: true,
            check_syntax: true,
            ..Default::default()
        }
    }

    /// Creates a lenient configuration that skips the logic checks.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            run_logic: false,
            fail_on_warnings: false,
            ..Default::default()
        }
    }

    /// Loads a configuration from a YAML file. Missing keys take their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CompilerError::ConfigReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| CompilerError::ConfigParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(path = %path.display(), ?config, "Loaded builder config");
        Ok(config)
    }

    /// Builds the rulesets to run after the constraint ruleset.
    #[must_use]
    pub fn rulesets(&self) -> Vec<PolicyRuleset> {
        let mut sets = Vec::new();
        if self.run_configuration {
            sets.push(rulesets::configuration_ruleset());
        }
        if self.run_logic {
            sets.push(rulesets::logic_ruleset(self.logic_stop_on_first_failure));
        }
        if self.run_saved_policy {
            sets.push(rulesets::saved_policy_ruleset());
        }
        sets
    }

    /// Returns the Rego template described by this configuration.
    #[must_use]
    pub fn template(&self) -> RegoTemplate {
        RegoTemplate {
            package: self.package.clone(),
            check_syntax: self.check_syntax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_rulesets() {
        let names: Vec<_> = BuilderConfig::default()
            .rulesets()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["Configuration Ruleset", "Logic Ruleset"]);
    }

    #[test]
    fn test_presets() {
        assert!(BuilderConfig::strict().fail_on_warnings);
        assert!(BuilderConfig::strict().check_syntax);
        assert!(!BuilderConfig::lenient().run_logic);
        assert_eq!(BuilderConfig::lenient().rulesets().len(), 1);
    }

    #[test]
    fn test_saved_policy_ruleset_is_last() {
        let config = BuilderConfig {
            run_saved_policy: true,
            ..Default::default()
        };
        let sets = config.rulesets();
        assert_eq!(sets.last().unwrap().name(), "Saved Policy Ruleset");
    }

    #[test]
    fn test_from_yaml_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "package: authz\nrun_logic: false").unwrap();
        let config = BuilderConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.package.as_deref(), Some("authz"));
        assert!(!config.run_logic);
        assert!(config.run_configuration);
        assert_eq!(config.template().package.as_deref(), Some("authz"));
    }

    #[test]
    fn test_from_yaml_file_errors() {
        let err = BuilderConfig::from_yaml_file("/nonexistent/blueprint.yaml").unwrap_err();
        assert!(matches!(err, CompilerError::ConfigReadError { .. }));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "run_logic: [nope").unwrap();
        let err = BuilderConfig::from_yaml_file(file.path()).unwrap_err();
        assert!(matches!(err, CompilerError::ConfigParseError { .. }));
    }
}
