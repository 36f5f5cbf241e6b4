//! Embedded Rego engine used to check generated policies.
//!
//! Generated source uses the v0 rule syntax (`allow { ... }`), so the
//! wrapped `regorus` engine is switched to v0 parsing before loading.
//!
//! # Examples
//!
//! ```rust,ignore
//! use blueprint_compiler::RegoEngine;
//!
//! let mut engine = RegoEngine::new();
//! engine.add_policy("policy.rego", &rego)?;
//! let allowed = engine.eval_bool("data.blueprint.allow")?;
//! ```

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{CompilerError, Result};

/// Package used when generated source has no `package` header.
pub const DEFAULT_PACKAGE: &str = "blueprint";

/// A Rego engine based on `regorus`.
#[derive(Debug)]
pub struct RegoEngine {
    inner: regorus::Engine,
}

impl Default for RegoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RegoEngine {
    /// Creates an engine that parses v0 Rego.
    #[must_use]
    pub fn new() -> Self {
        let mut inner = regorus::Engine::new();
        inner.set_rego_v0(true);
        Self { inner }
    }

    /// Loads a policy.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::SyntaxError`] if the source does not parse.
    #[instrument(skip(self, source))]
    pub fn add_policy(&mut self, name: &str, source: &str) -> Result<()> {
        debug!(name, "Adding policy");
        self.inner
            .add_policy(name.to_string(), source.to_string())
            .map_err(|e| CompilerError::SyntaxError {
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Sets the input document.
    pub fn set_input(&mut self, input: Value) {
        self.inner.set_input(input.into());
    }

    /// Evaluates `query`, treating an undefined result as false.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::EvaluationError`] if evaluation fails.
    #[instrument(skip(self))]
    pub fn eval_bool(&mut self, query: &str) -> Result<bool> {
        let results = self
            .inner
            .eval_query(query.to_string(), false)
            .map_err(|e| CompilerError::EvaluationError {
                message: e.to_string(),
            })?;
        let value = results
            .result
            .first()
            .and_then(|r| r.expressions.first())
            .map(|e| &e.value);
        Ok(matches!(value, Some(regorus::Value::Bool(true))))
    }
}

/// Parses generated source, adding a `package` header when it has none.
///
/// # Errors
///
/// Returns [`CompilerError::SyntaxError`] if the source does not parse.
pub fn check_syntax(source: &str) -> Result<()> {
    let mut engine = RegoEngine::new();
    if has_package(source) {
        engine.add_policy("generated.rego", source)?;
    } else {
        engine.add_policy(
            "generated.rego",
            &format!("package {DEFAULT_PACKAGE}\n\n{source}"),
        )?;
    }
    Ok(())
}

fn has_package(source: &str) -> bool {
    source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .is_some_and(|line| line.starts_with("package "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const POLICY: &str = "package blueprint\n\ndefault allow = false\n\nallow {\n\tinput.role == \"admin\"\n}\n\n";

    #[test]
    fn test_has_package() {
        assert!(has_package(POLICY));
        assert!(has_package("# comment\npackage x\n"));
        assert!(!has_package("default allow = false\n"));
    }

    #[test]
    fn test_check_syntax_without_package() {
        assert!(check_syntax("default allow = false\n\nallow {\n\t1 == 1\n}\n\n").is_ok());
    }

    #[test]
    fn test_check_syntax_rejects_garbage() {
        let err = check_syntax("allow {\n\tnot\n").unwrap_err();
        assert!(matches!(err, CompilerError::SyntaxError { .. }));
    }

    #[test]
    fn test_eval_bool() {
        let mut engine = RegoEngine::new();
        engine.add_policy("policy.rego", POLICY).unwrap();
        engine.set_input(json!({ "role": "admin" }));
        assert!(engine.eval_bool("data.blueprint.allow").unwrap());
        engine.set_input(json!({ "role": "guest" }));
        assert!(!engine.eval_bool("data.blueprint.allow").unwrap());
    }
}
