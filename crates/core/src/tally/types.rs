//! Tally aggregate fields and the per-transaction delta.

use serde::{Deserialize, Serialize};

/// Running count/value aggregates shared by bill runs, invoices, and
/// licences.
///
/// All values are whole pence. Credit values are stored as positive
/// magnitudes; the credit/debit split carries the sign convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Number of credit lines.
    pub credit_line_count: i64,
    /// Sum of credit line values (positive magnitude).
    pub credit_line_value: i64,
    /// Number of non-zero debit lines.
    pub debit_line_count: i64,
    /// Sum of debit line values.
    pub debit_line_value: i64,
    /// Number of zero-value debit lines.
    pub zero_line_count: i64,
    /// Number of lines flagged subject to minimum charge.
    pub subject_to_minimum_charge_count: i64,
    /// Credit value across minimum-charge lines.
    pub subject_to_minimum_charge_credit_value: i64,
    /// Debit value across minimum-charge lines.
    pub subject_to_minimum_charge_debit_value: i64,
}

impl Tally {
    /// Returns true if no lines have been tallied at any side.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.credit_line_count == 0 && self.debit_line_count == 0 && self.zero_line_count == 0
    }

    /// Net value of the tallied lines (debit minus credit).
    #[must_use]
    pub const fn net_total(&self) -> i64 {
        self.debit_line_value - self.credit_line_value
    }

    /// Applies a transaction delta to this tally.
    pub fn apply(&mut self, delta: &TallyDelta) {
        self.credit_line_count += delta.credit_line_count;
        self.credit_line_value += delta.credit_line_value;
        self.debit_line_count += delta.debit_line_count;
        self.debit_line_value += delta.debit_line_value;
        self.zero_line_count += delta.zero_line_count;
        self.subject_to_minimum_charge_count += delta.subject_to_minimum_charge_count;
        self.subject_to_minimum_charge_credit_value += delta.subject_to_minimum_charge_credit_value;
        self.subject_to_minimum_charge_debit_value += delta.subject_to_minimum_charge_debit_value;
    }

    /// Removes a child subtree's contribution from this tally.
    ///
    /// Used when an invoice or licence is deleted and the parent must be
    /// re-aggregated without rescanning every sibling.
    pub fn remove(&mut self, subtree: &Tally) {
        self.credit_line_count -= subtree.credit_line_count;
        self.credit_line_value -= subtree.credit_line_value;
        self.debit_line_count -= subtree.debit_line_count;
        self.debit_line_value -= subtree.debit_line_value;
        self.zero_line_count -= subtree.zero_line_count;
        self.subject_to_minimum_charge_count -= subtree.subject_to_minimum_charge_count;
        self.subject_to_minimum_charge_credit_value -=
            subtree.subject_to_minimum_charge_credit_value;
        self.subject_to_minimum_charge_debit_value -=
            subtree.subject_to_minimum_charge_debit_value;
    }
}

/// Signed delta one transaction contributes to each tally level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TallyDelta {
    /// Change to the credit line count.
    pub credit_line_count: i64,
    /// Change to the credit line value.
    pub credit_line_value: i64,
    /// Change to the debit line count.
    pub debit_line_count: i64,
    /// Change to the debit line value.
    pub debit_line_value: i64,
    /// Change to the zero line count.
    pub zero_line_count: i64,
    /// Change to the minimum-charge line count.
    pub subject_to_minimum_charge_count: i64,
    /// Change to the minimum-charge credit value.
    pub subject_to_minimum_charge_credit_value: i64,
    /// Change to the minimum-charge debit value.
    pub subject_to_minimum_charge_debit_value: i64,
}

impl TallyDelta {
    /// Computes the delta a single transaction contributes.
    ///
    /// Credits land in the credit fields; zero-value debits only bump the
    /// zero line count; everything else is a debit line. Lines flagged
    /// subject to minimum charge additionally feed the minimum-charge count
    /// and the matching side's value split.
    #[must_use]
    pub const fn for_transaction(
        charge_value: i64,
        charge_credit: bool,
        subject_to_minimum_charge: bool,
    ) -> Self {
        let mut delta = Self {
            credit_line_count: 0,
            credit_line_value: 0,
            debit_line_count: 0,
            debit_line_value: 0,
            zero_line_count: 0,
            subject_to_minimum_charge_count: 0,
            subject_to_minimum_charge_credit_value: 0,
            subject_to_minimum_charge_debit_value: 0,
        };

        if charge_credit {
            delta.credit_line_count = 1;
            delta.credit_line_value = charge_value;
        } else if charge_value == 0 {
            delta.zero_line_count = 1;
        } else {
            delta.debit_line_count = 1;
            delta.debit_line_value = charge_value;
        }

        if subject_to_minimum_charge {
            delta.subject_to_minimum_charge_count = 1;
            if charge_credit {
                delta.subject_to_minimum_charge_credit_value = charge_value;
            } else {
                delta.subject_to_minimum_charge_debit_value = charge_value;
            }
        }

        delta
    }

    /// Returns the delta that undoes this one.
    #[must_use]
    pub const fn inverted(&self) -> Self {
        Self {
            credit_line_count: -self.credit_line_count,
            credit_line_value: -self.credit_line_value,
            debit_line_count: -self.debit_line_count,
            debit_line_value: -self.debit_line_value,
            zero_line_count: -self.zero_line_count,
            subject_to_minimum_charge_count: -self.subject_to_minimum_charge_count,
            subject_to_minimum_charge_credit_value: -self.subject_to_minimum_charge_credit_value,
            subject_to_minimum_charge_debit_value: -self.subject_to_minimum_charge_debit_value,
        }
    }
}
