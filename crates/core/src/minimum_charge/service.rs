//! Minimum charge calculator.
//!
//! Scans licences for minimum-charge credit/debit totals strictly between
//! zero and the configured limit and synthesizes top-up transactions that
//! bring each side exactly to the limit. The synthesized lines are not
//! persisted here; the caller pushes them through the tally maintainer so
//! aggregates stay correct.

use crate::invoice::Licence;
use crate::transaction::{Transaction, TransactionInput};

/// Fixed regulatory line description for synthesized top-up lines.
pub const MINIMUM_CHARGE_DESCRIPTION: &str =
    "Minimum Charge Calculation - raised under Schedule 23 of the Environment Act 1995";

/// Minimum charge calculation service.
pub struct MinimumChargeService;

impl MinimumChargeService {
    /// Returns true if the licence can yield at least one adjustment.
    ///
    /// Only licences carrying minimum-charge lines qualify, and only when a
    /// side's total sits strictly inside `(0, limit)`.
    #[must_use]
    pub const fn licence_qualifies(licence: &Licence, limit: i64) -> bool {
        licence.tally.subject_to_minimum_charge_count > 0
            && (Self::side_adjustment(licence.tally.subject_to_minimum_charge_credit_value, limit)
                .is_some()
                || Self::side_adjustment(
                    licence.tally.subject_to_minimum_charge_debit_value,
                    limit,
                )
                .is_some())
    }

    /// The top-up needed to bring one side's total to the limit.
    ///
    /// A side exactly at 0 or at/above the limit needs no adjustment.
    #[must_use]
    pub const fn side_adjustment(value: i64, limit: i64) -> Option<i64> {
        if value > 0 && value < limit {
            Some(limit - value)
        } else {
            None
        }
    }

    /// Synthesizes the adjustment transactions for one licence.
    ///
    /// The credit and debit sides are evaluated independently, so a licence
    /// yields zero, one, or two adjustments. `template` is an arbitrary
    /// existing transaction on the licence, used purely to copy the
    /// regime/customer/licence/region/ruleset/financial-year fields.
    #[must_use]
    pub fn adjustments_for_licence(
        licence: &Licence,
        template: &Transaction,
        limit: i64,
    ) -> Vec<TransactionInput> {
        let mut adjustments = Vec::with_capacity(2);

        let sides = [
            (licence.tally.subject_to_minimum_charge_credit_value, true),
            (licence.tally.subject_to_minimum_charge_debit_value, false),
        ];

        for (value, charge_credit) in sides {
            if let Some(top_up) = Self::side_adjustment(value, limit) {
                adjustments.push(Self::adjustment(template, top_up, charge_credit));
            }
        }

        adjustments
    }

    /// Builds one adjustment line from the template transaction.
    fn adjustment(template: &Transaction, charge_value: i64, charge_credit: bool) -> TransactionInput {
        TransactionInput {
            bill_run_id: template.bill_run_id,
            regime_id: template.regime_id,
            created_by: template.created_by,
            // No client id: these lines are system-generated.
            client_id: None,
            region: template.region.clone(),
            ruleset: template.ruleset,
            customer_reference: template.customer_reference.clone(),
            licence_number: template.licence_number.clone(),
            financial_year: template.financial_year,
            charge_value,
            charge_credit,
            subject_to_minimum_charge: true,
            minimum_charge_adjustment: true,
            line_description: MINIMUM_CHARGE_DESCRIPTION.to_string(),
            rebilled_transaction_id: None,
        }
    }
}
