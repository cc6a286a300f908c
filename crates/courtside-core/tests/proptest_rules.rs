// crates/courtside-core/tests/proptest_rules.rs
// ============================================================================
// Module: Rule Set Property Tests
// Description: Mutation closure and validation properties.
// ============================================================================
//! ## Overview
//! Every successful `apply` must yield a rule set that still validates, and
//! every rejected value must leave defaults reachable. This is the atomic
//! mutation guarantee the governance kernel leans on.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use proptest::prelude::*;
use courtside_core::RuleSet;
use courtside_core::RuleValue;

proptest! {
    /// Successful applications stay inside the validated space.
    #[test]
    fn successful_apply_preserves_validity(
        index in 0usize..32,
        int_value in -100i64..1_000,
        float_value in -2.0..2.0_f64,
    ) {
        let names = RuleSet::parameter_names();
        let parameter = names[index % names.len()];
        let base = RuleSet::default();
        for value in [RuleValue::Int(int_value), RuleValue::Float(float_value)] {
            if let Ok(next) = base.apply(parameter, value) {
                prop_assert!(next.validate().is_ok());
            }
        }
        // The receiver is never perturbed, success or failure.
        prop_assert_eq!(base, RuleSet::default());
    }

    /// Diff is symmetric in size and names exactly the changed parameters.
    #[test]
    fn diff_names_exactly_the_changes(margin in 1i64..=30) {
        let base = RuleSet::default();
        let next = base.apply("elam_margin", RuleValue::Int(margin)).unwrap();
        let forward = base.diff(&next);
        let backward = next.diff(&base);
        prop_assert_eq!(forward.len(), backward.len());
        if margin == 11 {
            prop_assert!(forward.is_empty());
        } else {
            prop_assert_eq!(forward.len(), 1);
            prop_assert_eq!(forward[0].parameter.as_str(), "elam_margin");
        }
    }
}
