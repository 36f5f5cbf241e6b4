//! Rego generation for validated policies.
//!
//! Output layout:
//!
//! ```text
//! package <name>            (optional)
//!
//! default allow = false
//!
//! allow {                   (one block per clause)
//!     [not ]name[(args)]
//! }
//!
//! name[(params)] {          (one block per function, sorted by name)
//!     <expression>
//! }
//! ```
//!
//! Every function reachable from a statement is emitted, including
//! transitive dependencies. Constant arguments never appear in calls;
//! their values are bound at the top of the function body instead.
//!
//! # Examples
//!
//! ```rust,ignore
//! use blueprint_compiler::{RegoCompiler, RegoTemplate};
//!
//! let compiler = RegoCompiler::new(RegoTemplate::new().with_package("authz"));
//! let rego = compiler.compile(&tree)?;
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use blueprint_core::identity::FunctionIdentity;
use blueprint_core::{
    BaseStatement, BaseStatementFunction, Catalog, ConfiguredStatement, FunctionId, Location,
    PolicyTree, RootNode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::engine;
use crate::error::{CompilerError, Result};

/// Options controlling the generated source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegoTemplate {
    /// Package header, omitted when `None`.
    #[serde(default)]
    pub package: Option<String>,
    /// Parse the output with the embedded engine before returning it.
    #[serde(default)]
    pub check_syntax: bool,
}

impl RegoTemplate {
    /// Creates a template with no package and no syntax check.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the package header.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Enables or disables the syntax check.
    #[must_use]
    pub const fn with_syntax_check(mut self, check_syntax: bool) -> Self {
        self.check_syntax = check_syntax;
        self
    }
}

/// Constant parameter bindings, by parameter position.
type Bindings = Vec<(usize, String)>;

/// Compiles policy trees into Rego source.
#[derive(Debug, Clone, Default)]
pub struct RegoCompiler {
    template: RegoTemplate,
}

impl RegoCompiler {
    /// Creates a compiler for `template`.
    #[must_use]
    pub const fn new(template: RegoTemplate) -> Self {
        Self { template }
    }

    /// Returns the template.
    #[must_use]
    pub const fn template(&self) -> &RegoTemplate {
        &self.template
    }

    /// Generates Rego for a policy tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a policy, a reference does not
    /// resolve, a statement has the wrong number of values, a value cannot
    /// be rendered, functions conflict, or the syntax check fails.
    #[instrument(skip_all)]
    pub fn compile(&self, tree: &PolicyTree) -> Result<String> {
        let RootNode::Policy(policy) = tree.root() else {
            return Err(CompilerError::NotAPolicy {
                root: tree.root().identifier(),
            });
        };
        let catalog = tree.catalog();
        let root = Location::root("policy");

        let mut clauses: Vec<Vec<String>> = Vec::with_capacity(policy.clauses.len());
        let mut used: Vec<FunctionId> = Vec::new();
        let mut specializations: HashMap<FunctionIdentity, Bindings> = HashMap::new();

        for (i, clause) in policy.clauses.iter().enumerate() {
            let clause_location = root.indexed_child("clauses", i);
            let mut lines = Vec::with_capacity(clause.statements.len());
            for (j, statement) in clause.statements.iter().enumerate() {
                let location = clause_location.indexed_child("statements", j);
                let base = catalog.statement_base(statement).ok_or_else(|| {
                    CompilerError::UnresolvedBaseStatement {
                        location: location.to_string(),
                    }
                })?;
                let Some(function_id) = base.function else {
                    return Err(CompilerError::UnresolvedFunction {
                        base_statement: base.versioned_name(),
                    });
                };
                let function = catalog.function(function_id).ok_or_else(|| {
                    CompilerError::UnresolvedFunction {
                        base_statement: base.versioned_name(),
                    }
                })?;

                // Every call of one function must bind the same constants, possibly none.
                let bindings = constant_bindings(base, function, &location)?;
                let identity = FunctionIdentity::of(catalog, function);
                match specializations.get(&identity) {
                    Some(existing) if *existing != bindings => {
                        return Err(CompilerError::ConflictingConstants {
                            function: function.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        specializations.insert(identity, bindings);
                    }
                }

                lines.push(render_call(statement, base, function, &location)?);
                used.push(function_id);
            }
            clauses.push(lines);
        }

        let functions = collect_functions(catalog, used)?;
        for (_, function) in &functions {
            for dependency in catalog.dependencies(function) {
                let identity = FunctionIdentity::of(catalog, dependency);
                if specializations.get(&identity).is_some_and(|b| !b.is_empty()) {
                    return Err(CompilerError::ConstantDependency {
                        function: dependency.name.clone(),
                        dependent: function.name.clone(),
                    });
                }
            }
        }

        let mut out = String::new();
        if let Some(package) = &self.template.package {
            write!(out, "package {package}\n\n")?;
        }
        out.push_str("default allow = false\n\n");
        for lines in &clauses {
            out.push_str("allow {\n");
            for line in lines {
                writeln!(out, "\t{line}")?;
            }
            out.push_str("}\n\n");
        }
        for (identity, function) in &functions {
            let bindings = specializations.get(identity).map_or(&[][..], Vec::as_slice);
            render_function(&mut out, function, bindings)?;
        }

        if self.template.check_syntax {
            engine::check_syntax(&out)?;
        }

        info!(
            clauses = clauses.len(),
            functions = functions.len(),
            "Generated Rego"
        );
        Ok(out)
    }
}

/// Renders `[not ]name[(args)]` for a statement.
fn render_call(
    statement: &ConfiguredStatement,
    base: &BaseStatement,
    function: &BaseStatementFunction,
    location: &Location,
) -> Result<String> {
    let expected = base.configured_arguments().count();
    let actual = statement.argument_values.len();
    if expected != actual {
        return Err(CompilerError::ArgumentCount {
            location: location.to_string(),
            expected,
            actual,
        });
    }

    let mut args = Vec::with_capacity(actual);
    for (k, (argument, value)) in base
        .configured_arguments()
        .zip(&statement.argument_values)
        .enumerate()
    {
        let rendered = argument.argument_type.and_then(|t| t.generate_rego(value));
        let Some(rendered) = rendered else {
            return Err(CompilerError::ArgumentRender {
                location: location.indexed_child("argumentValues", k).to_string(),
                value: value.clone(),
                argument_type: type_name(argument.argument_type),
            });
        };
        args.push(rendered);
    }

    let mut line = String::new();
    if statement.negated {
        line.push_str("not ");
    }
    line.push_str(&function.name);
    if !args.is_empty() {
        write!(line, "({})", args.join(", "))?;
    }
    Ok(line)
}

/// Renders the constant arguments of `base` as `(position, "param := value")`.
fn constant_bindings(
    base: &BaseStatement,
    function: &BaseStatementFunction,
    location: &Location,
) -> Result<Bindings> {
    let mut bindings = Vec::new();
    for (k, argument) in base.arguments.iter().enumerate() {
        if !argument.constant {
            continue;
        }
        let value = argument.constant_value.as_deref().unwrap_or_default();
        let rendered = argument.argument_type.and_then(|t| t.generate_rego(value));
        let Some(rendered) = rendered else {
            return Err(CompilerError::ArgumentRender {
                location: location
                    .child("baseStatement")
                    .indexed_child("arguments", k)
                    .field("constantValue"),
                value: value.to_string(),
                argument_type: type_name(argument.argument_type),
            });
        };
        let parameter = function
            .parameters
            .get(k)
            .unwrap_or(&argument.parameter);
        bindings.push((k, format!("{parameter} := {rendered}")));
    }
    Ok(bindings)
}

/// Renders one function definition, leaving out bound parameters.
fn render_function(
    out: &mut String,
    function: &BaseStatementFunction,
    bindings: &[(usize, String)],
) -> Result<()> {
    let parameters: Vec<&str> = function
        .parameters
        .iter()
        .enumerate()
        .filter(|(k, _)| !bindings.iter().any(|(bound, _)| bound == k))
        .map(|(_, p)| p.as_str())
        .collect();

    out.push_str(&function.name);
    if !parameters.is_empty() {
        write!(out, "({})", parameters.join(", "))?;
    }
    out.push_str(" {\n");
    for (_, binding) in bindings {
        writeln!(out, "\t{binding}")?;
    }
    for line in function.expression.lines() {
        writeln!(out, "\t{line}")?;
    }
    out.push_str("}\n\n");
    Ok(())
}

/// Collects every function reachable from `roots`, deduplicated by
/// identity and sorted by name.
fn collect_functions(
    catalog: &Catalog,
    roots: Vec<FunctionId>,
) -> Result<Vec<(FunctionIdentity, &BaseStatementFunction)>> {
    let mut visited = HashSet::new();
    let mut seen = HashSet::new();
    let mut functions = Vec::new();
    let mut stack = roots;

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(function) = catalog.function(id) else {
            return Err(CompilerError::UnresolvedDependency {
                dependency: id.to_string(),
            });
        };
        stack.extend(function.dependencies.iter().copied());
        let identity = FunctionIdentity::of(catalog, function);
        if seen.insert(identity.clone()) {
            functions.push((identity, function));
        }
    }

    functions.sort_by(|a, b| a.1.name.cmp(&b.1.name));
    if let Some(pair) = functions.windows(2).find(|w| w[0].1.name == w[1].1.name) {
        return Err(CompilerError::ConflictingFunction {
            name: pair[0].1.name.clone(),
        });
    }
    debug!(functions = functions.len(), "Collected function closure");
    Ok(functions)
}

fn type_name(argument_type: Option<blueprint_core::ArgumentType>) -> String {
    argument_type.map_or_else(|| "missing type".to_string(), |t| t.display_name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::{ArgumentType, BaseStatementArgument, PolicyClause};
    use blueprint_test::fixtures::{self, PolicyFixture};

    fn compile(fixture: PolicyFixture) -> Result<String> {
        RegoCompiler::default().compile(&fixture.into_tree())
    }

    #[test]
    fn test_tautology_round_trip() {
        let rego = compile(PolicyFixture::tautology()).unwrap();
        assert_eq!(
            rego,
            "default allow = false\n\nallow {\n\ttautology\n}\n\ntautology {\n\t1 == 1\n}\n\n"
        );
    }

    #[test]
    fn test_valid_policy_with_package() {
        let compiler = RegoCompiler::new(RegoTemplate::new().with_package("blueprint"));
        let rego = compiler.compile(&PolicyFixture::valid().into_tree()).unwrap();
        assert_eq!(
            rego,
            "package blueprint\n\ndefault allow = false\n\nallow {\n\tnot function_name([\"foo\", \"bar\"], \"foo\")\n\ttautology\n}\n\nfunction_name(array, value) {\n\tarray[_] == value\n}\n\ntautology {\n\t1 == 1\n}\n\n"
        );
    }

    #[test]
    fn test_one_block_per_clause() {
        let mut fixture = PolicyFixture::tautology();
        let clause = fixture.policy.clauses[0].clone();
        fixture.policy.clauses.push(clause);
        let rego = compile(fixture).unwrap();
        assert_eq!(rego.matches("allow {\n").count(), 2);
        assert_eq!(rego.matches("tautology {\n").count(), 1);
    }

    #[test]
    fn test_dependencies_are_emitted() {
        let mut fixture = PolicyFixture::tautology();
        let helper = fixture.catalog.add_function(
            fixtures::tautology_function().with_expression("true"),
        );
        fixture.catalog.function_mut(helper).unwrap().name = "always".to_string();
        fixture
            .catalog
            .function_mut(fixture.tautology_function)
            .unwrap()
            .dependencies
            .push(helper);
        let rego = compile(fixture).unwrap();
        assert!(rego.contains("always {\n\ttrue\n}\n\n"));
        assert!(rego.find("always {").unwrap() < rego.find("tautology {").unwrap());
    }

    #[test]
    fn test_identical_functions_are_deduplicated() {
        let mut fixture = PolicyFixture::tautology();
        let copy = fixture.catalog.add_function(fixtures::tautology_function());
        let base = fixture
            .catalog
            .add_base_statement(fixtures::tautology_base_statement(copy));
        fixture.policy.clauses[0]
            .statements
            .push(ConfiguredStatement::new(base));
        let rego = compile(fixture).unwrap();
        assert_eq!(rego.matches("tautology {\n").count(), 1);
    }

    #[test]
    fn test_conflicting_function_names() {
        let mut fixture = PolicyFixture::tautology();
        let other = fixture
            .catalog
            .add_function(fixtures::tautology_function().with_expression("2 == 2"));
        let base = fixture
            .catalog
            .add_base_statement(fixtures::tautology_base_statement(other));
        fixture.policy.clauses[0]
            .statements
            .push(ConfiguredStatement::new(base));
        let err = compile(fixture).unwrap_err();
        assert!(matches!(err, CompilerError::ConflictingFunction { name } if name == "tautology"));
    }

    #[test]
    fn test_function_root_is_rejected() {
        let fixture = PolicyFixture::valid();
        let tree = PolicyTree::function(fixture.catalog, fixture.function);
        let err = RegoCompiler::default().compile(&tree).unwrap_err();
        assert!(matches!(err, CompilerError::NotAPolicy { root: "function" }));
    }

    #[test]
    fn test_unresolved_base_statement() {
        let mut fixture = PolicyFixture::tautology();
        fixture.policy.clauses[0].statements[0].base_statement = None;
        let err = compile(fixture).unwrap_err();
        assert!(
            matches!(err, CompilerError::UnresolvedBaseStatement { location } if location == "clauses[0].statements[0]")
        );
    }

    #[test]
    fn test_argument_count_mismatch() {
        let mut fixture = PolicyFixture::valid();
        fixture.policy.clauses[0].statements[0].argument_values.pop();
        let err = compile(fixture).unwrap_err();
        assert!(matches!(
            err,
            CompilerError::ArgumentCount { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_unrenderable_value() {
        let mut fixture = PolicyFixture::valid();
        let base = fixture.catalog.base_statement_mut(fixture.base_statement).unwrap();
        base.arguments[1].argument_type = Some(ArgumentType::Integer);
        let err = compile(fixture).unwrap_err();
        assert!(matches!(
            err,
            CompilerError::ArgumentRender { location, .. } if location == "clauses[0].statements[0].argumentValues[1]"
        ));
    }

    fn constant_fixture(value: &str) -> PolicyFixture {
        let mut fixture = PolicyFixture::valid();
        let base = fixture.catalog.base_statement_mut(fixture.base_statement).unwrap();
        base.arguments[1] = BaseStatementArgument::constant("value", ArgumentType::String, value)
            .with_description("Value to find");
        fixture.policy.clauses[0].statements[0].argument_values.pop();
        fixture
    }

    #[test]
    fn test_constant_arguments_are_bound_in_body() {
        let rego = compile(constant_fixture("admin")).unwrap();
        assert!(rego.contains("\tnot function_name([\"foo\", \"bar\"])\n"));
        assert!(rego.contains("function_name(array) {\n\tvalue := \"admin\"\n\tarray[_] == value\n}\n\n"));
    }

    #[test]
    fn test_conflicting_constants() {
        let mut fixture = constant_fixture("admin");
        let mut other = fixtures::valid_base_statement(fixture.function);
        other.name = "Other Statement".to_string();
        other.arguments[1] = BaseStatementArgument::constant("value", ArgumentType::String, "guest")
            .with_description("Value to find");
        let other = fixture.catalog.add_base_statement(other);
        fixture.policy = fixture.policy.with_clause(
            PolicyClause::new()
                .with_statement(ConfiguredStatement::new(other).with_argument_value("foo")),
        );
        let err = compile(fixture).unwrap_err();
        assert!(matches!(err, CompilerError::ConflictingConstants { .. }));
    }

    #[test]
    fn test_constant_and_plain_calls_conflict() {
        let mut fixture = constant_fixture("admin");
        let plain = fixture
            .catalog
            .add_base_statement(fixtures::valid_base_statement(fixture.function));
        fixture.catalog.base_statement_mut(plain).unwrap().name = "Plain Statement".to_string();
        fixture.policy = fixture.policy.with_clause(
            PolicyClause::new().with_statement(
                ConfiguredStatement::new(plain)
                    .with_argument_value("foo, bar")
                    .with_argument_value("foo"),
            ),
        );
        let err = compile(fixture).unwrap_err();
        assert!(matches!(
            err,
            CompilerError::ConflictingConstants { function } if function == "function_name"
        ));
    }

    #[test]
    fn test_constant_dependency() {
        let mut fixture = constant_fixture("admin");
        let function = fixture.function;
        fixture
            .catalog
            .function_mut(fixture.tautology_function)
            .unwrap()
            .dependencies
            .push(function);
        let err = compile(fixture).unwrap_err();
        assert!(matches!(
            err,
            CompilerError::ConstantDependency { function, dependent }
                if function == "function_name" && dependent == "tautology"
        ));
    }

    #[test]
    fn test_multiline_expression_is_indented() {
        let mut fixture = PolicyFixture::tautology();
        fixture
            .catalog
            .function_mut(fixture.tautology_function)
            .unwrap()
            .expression = "x := 1\nx == 1".to_string();
        let rego = compile(fixture).unwrap();
        assert!(rego.contains("tautology {\n\tx := 1\n\tx == 1\n}\n\n"));
    }

    #[test]
    fn test_syntax_check_accepts_output() {
        let compiler = RegoCompiler::new(RegoTemplate::new().with_syntax_check(true));
        assert!(compiler.compile(&PolicyFixture::valid().into_tree()).is_ok());
    }

    #[test]
    fn test_syntax_check_rejects_bad_expression() {
        let mut fixture = PolicyFixture::tautology();
        fixture
            .catalog
            .function_mut(fixture.tautology_function)
            .unwrap()
            .expression = "1 ==".to_string();
        let compiler = RegoCompiler::new(RegoTemplate::new().with_syntax_check(true));
        let err = compiler.compile(&fixture.into_tree()).unwrap_err();
        assert!(matches!(err, CompilerError::SyntaxError { .. }));
    }
}
