//! Property-based tests for tally arithmetic.
//!
//! - Property 1: Tally consistency (parent equals sum of children)
//! - Property 2: Apply/remove round trips back to the starting tally

use proptest::prelude::*;

use super::types::{Tally, TallyDelta};

/// Strategy for charge values in whole pence (0 to 1,000,000).
fn charge_value() -> impl Strategy<Value = i64> {
    0i64..1_000_000i64
}

/// Strategy for one transaction's delta inputs.
fn transaction_inputs() -> impl Strategy<Value = (i64, bool, bool)> {
    (charge_value(), any::<bool>(), any::<bool>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any transaction, exactly one line counter moves by one.
    #[test]
    fn prop_delta_moves_exactly_one_line_counter(
        (value, credit, min_charge) in transaction_inputs(),
    ) {
        let delta = TallyDelta::for_transaction(value, credit, min_charge);
        let lines = delta.credit_line_count + delta.debit_line_count + delta.zero_line_count;
        prop_assert_eq!(lines, 1);
    }

    /// For any transaction, values land only on the side its flags select.
    #[test]
    fn prop_delta_values_respect_side(
        (value, credit, min_charge) in transaction_inputs(),
    ) {
        let delta = TallyDelta::for_transaction(value, credit, min_charge);
        if credit {
            prop_assert_eq!(delta.debit_line_value, 0);
            prop_assert_eq!(delta.subject_to_minimum_charge_debit_value, 0);
        } else {
            prop_assert_eq!(delta.credit_line_value, 0);
            prop_assert_eq!(delta.subject_to_minimum_charge_credit_value, 0);
        }
        if !min_charge {
            prop_assert_eq!(delta.subject_to_minimum_charge_count, 0);
        }
    }

    /// Applying a delta then its inversion restores the original tally.
    #[test]
    fn prop_apply_inverted_round_trips(
        seed in prop::collection::vec(transaction_inputs(), 0..20),
        (value, credit, min_charge) in transaction_inputs(),
    ) {
        let mut tally = Tally::default();
        for (v, c, m) in &seed {
            tally.apply(&TallyDelta::for_transaction(*v, *c, *m));
        }
        let before = tally;

        let delta = TallyDelta::for_transaction(value, credit, min_charge);
        tally.apply(&delta);
        tally.apply(&delta.inverted());

        prop_assert_eq!(tally, before);
    }

    /// A parent tallied from whole-child removal matches per-line removal.
    ///
    /// Simulates the deletion cascade: removing a child subtree in one
    /// subtraction must equal having never applied the child's lines.
    #[test]
    fn prop_subtree_removal_matches_never_applied(
        kept in prop::collection::vec(transaction_inputs(), 0..15),
        removed in prop::collection::vec(transaction_inputs(), 0..15),
    ) {
        let mut parent = Tally::default();
        let mut child = Tally::default();
        for (v, c, m) in &kept {
            parent.apply(&TallyDelta::for_transaction(*v, *c, *m));
        }
        for (v, c, m) in &removed {
            let delta = TallyDelta::for_transaction(*v, *c, *m);
            parent.apply(&delta);
            child.apply(&delta);
        }

        parent.remove(&child);

        let mut expected = Tally::default();
        for (v, c, m) in &kept {
            expected.apply(&TallyDelta::for_transaction(*v, *c, *m));
        }
        prop_assert_eq!(parent, expected);
    }

    /// Parent equals the sum of its children after any insert sequence.
    #[test]
    fn prop_parent_equals_sum_of_children(
        inputs in prop::collection::vec((transaction_inputs(), 0usize..4), 1..30),
    ) {
        let mut parent = Tally::default();
        let mut children = [Tally::default(); 4];

        for ((v, c, m), child_index) in &inputs {
            let delta = TallyDelta::for_transaction(*v, *c, *m);
            parent.apply(&delta);
            children[*child_index].apply(&delta);
        }

        let mut sum = Tally::default();
        for child in &children {
            sum.credit_line_count += child.credit_line_count;
            sum.credit_line_value += child.credit_line_value;
            sum.debit_line_count += child.debit_line_count;
            sum.debit_line_value += child.debit_line_value;
            sum.zero_line_count += child.zero_line_count;
            sum.subject_to_minimum_charge_count += child.subject_to_minimum_charge_count;
            sum.subject_to_minimum_charge_credit_value +=
                child.subject_to_minimum_charge_credit_value;
            sum.subject_to_minimum_charge_debit_value +=
                child.subject_to_minimum_charge_debit_value;
        }

        prop_assert_eq!(parent, sum);
    }
}
