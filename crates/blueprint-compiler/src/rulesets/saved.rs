//! Requirements for policies that are about to be stored.

use blueprint_core::validation::is_blank;
use blueprint_core::{
    Node, Policy, PolicyReport, PolicyRule, PolicyRuleset, PolicyVisitor, RuleSeverity,
};

use super::{is_capitalized_words, CAPITALIZED_WORDS_MESSAGE};

/// Name of the saved policy ruleset.
pub const SAVED_POLICY_RULESET: &str = "Saved Policy Ruleset";

/// Creates the saved policy ruleset.
#[must_use]
pub fn saved_policy_ruleset() -> PolicyRuleset {
    PolicyRuleset::sealed(SAVED_POLICY_RULESET, false, vec![Box::new(SavedPolicyRule)])
}

/// A stored policy needs a well-formed name and an author.
#[derive(Debug, Clone, Copy, Default)]
pub struct SavedPolicyRule;

impl PolicyVisitor for SavedPolicyRule {
    fn visit_policy(&self, node: &Node<'_, Policy>, report: &mut PolicyReport) {
        if is_blank(&node.name) {
            report.add_violation(self, node.field("name"), "Name cannot be blank");
        } else if !is_capitalized_words(&node.name) {
            report.add_violation(
                self,
                node.field("name"),
                format!(
                    "The policy name '{}' is invalid. Policy names {CAPITALIZED_WORDS_MESSAGE}",
                    node.name
                ),
            );
        }
        if is_blank(&node.author) {
            report.add_violation(self, node.field("author"), "Author cannot be blank");
        }
    }
}

impl PolicyRule for SavedPolicyRule {
    fn name(&self) -> &'static str {
        "Saved Policy Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
}
