//! Property-based tests for the minimum charge calculator.

use proptest::prelude::*;

use super::service::MinimumChargeService;

const LIMIT: i64 = 2500;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A side strictly inside (0, limit) is always topped up exactly to
    /// the limit.
    #[test]
    fn prop_adjustment_tops_up_to_limit(value in 1i64..LIMIT) {
        let top_up = MinimumChargeService::side_adjustment(value, LIMIT);
        prop_assert_eq!(top_up, Some(LIMIT - value));
        prop_assert_eq!(value + top_up.unwrap(), LIMIT);
    }

    /// A side at or above the limit never yields an adjustment.
    #[test]
    fn prop_no_adjustment_at_or_above_limit(value in LIMIT..1_000_000i64) {
        prop_assert_eq!(MinimumChargeService::side_adjustment(value, LIMIT), None);
    }

    /// A non-positive side never yields an adjustment.
    #[test]
    fn prop_no_adjustment_for_non_positive(value in -1_000_000i64..=0i64) {
        prop_assert_eq!(MinimumChargeService::side_adjustment(value, LIMIT), None);
    }

    /// Top-ups are always strictly positive and below the limit.
    #[test]
    fn prop_top_up_in_range(value in 1i64..LIMIT) {
        let top_up = MinimumChargeService::side_adjustment(value, LIMIT).unwrap();
        prop_assert!(top_up >= 1);
        prop_assert!(top_up < LIMIT);
    }
}
