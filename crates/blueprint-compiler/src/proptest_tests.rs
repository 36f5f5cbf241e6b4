//! Property-based tests for the logic ruleset.
//!
//! The falsifiability search is compared against a direct evaluation of
//! every assignment over small variable counts.

use blueprint_core::identity::LiteralIdentity;
use blueprint_core::ConfiguredStatement;
use blueprint_test::PolicyFixture;
use proptest::prelude::*;

use crate::rulesets::FalsifiabilityRule;

const VARIABLES: usize = 4;

/// Strategy for clauses of `(variable, negated)` literals.
fn clauses_strategy() -> impl Strategy<Value = Vec<Vec<(usize, bool)>>> {
    prop::collection::vec(
        prop::collection::vec((0..VARIABLES, any::<bool>()), 1..4),
        1..5,
    )
}

fn literals(fixture: &PolicyFixture, clauses: &[Vec<(usize, bool)>]) -> Vec<Vec<LiteralIdentity>> {
    clauses
        .iter()
        .map(|clause| {
            clause
                .iter()
                .map(|&(variable, negated)| {
                    let statement = ConfiguredStatement::new(fixture.base_statement)
                        .with_negated(negated)
                        .with_argument_value("foo, bar")
                        .with_argument_value(format!("v{variable}"));
                    LiteralIdentity::of(&fixture.catalog, &statement)
                })
                .collect()
        })
        .collect()
}

// Variable i is true in `mask` when bit i is set.
fn holds_everywhere(clauses: &[Vec<(usize, bool)>]) -> bool {
    (0..1u32 << VARIABLES).all(|mask| {
        clauses.iter().any(|clause| {
            clause
                .iter()
                .all(|&(variable, negated)| ((mask >> variable) & 1 == 1) != negated)
        })
    })
}

proptest! {
    #[test]
    fn tautology_matches_exhaustive_evaluation(clauses in clauses_strategy()) {
        let fixture = PolicyFixture::valid();
        prop_assert_eq!(
            FalsifiabilityRule::is_tautology(&literals(&fixture, &clauses)),
            holds_everywhere(&clauses)
        );
    }

    #[test]
    fn clause_order_does_not_change_tautology(clauses in clauses_strategy()) {
        let fixture = PolicyFixture::valid();
        let mut reversed = clauses.clone();
        reversed.reverse();
        prop_assert_eq!(
            FalsifiabilityRule::is_tautology(&literals(&fixture, &clauses)),
            FalsifiabilityRule::is_tautology(&literals(&fixture, &reversed))
        );
    }
}
