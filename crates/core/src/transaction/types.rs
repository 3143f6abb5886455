//! Transaction domain types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aquabill_shared::types::{BillRunId, InvoiceId, LicenceId, RegimeId, TransactionId};

use crate::billrun::Ruleset;
use crate::tally::TallyDelta;

/// One charge line. Immutable once written except by deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identity.
    pub id: TransactionId,
    /// Owning bill run.
    pub bill_run_id: BillRunId,
    /// Owning invoice.
    pub invoice_id: InvoiceId,
    /// Owning licence aggregate.
    pub licence_id: LicenceId,
    /// Owning regime.
    pub regime_id: RegimeId,
    /// System that created the transaction.
    pub created_by: Uuid,
    /// Externally supplied identifier, unique per bill run when present.
    pub client_id: Option<String>,
    /// Region code.
    pub region: String,
    /// Charge-calculation variant.
    pub ruleset: Ruleset,
    /// Customer billed by this line.
    pub customer_reference: String,
    /// Licence number the charge applies to.
    pub licence_number: String,
    /// Financial year the charge falls in.
    pub financial_year: i32,
    /// Charge value in whole pence (positive magnitude).
    pub charge_value: i64,
    /// True for a credit line, false for a debit line.
    pub charge_credit: bool,
    /// Line counts toward the minimum-charge rules.
    pub subject_to_minimum_charge: bool,
    /// True only for synthesized minimum-charge top-up lines.
    pub minimum_charge_adjustment: bool,
    /// Regulatory line description.
    pub line_description: String,
    /// Source transaction, when this line was cloned by rebilling.
    pub rebilled_transaction_id: Option<TransactionId>,
}

impl Transaction {
    /// The delta this transaction contributes to each tally level.
    #[must_use]
    pub const fn tally_delta(&self) -> TallyDelta {
        TallyDelta::for_transaction(
            self.charge_value,
            self.charge_credit,
            self.subject_to_minimum_charge,
        )
    }
}

/// A transaction that has not been persisted yet.
///
/// The invoice and licence it lands under are located (or created) by the
/// tally maintainer at write time, so the input carries the upsert keys
/// rather than foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Target bill run.
    pub bill_run_id: BillRunId,
    /// Owning regime.
    pub regime_id: RegimeId,
    /// System creating the transaction.
    pub created_by: Uuid,
    /// Externally supplied identifier, unique per bill run when present.
    pub client_id: Option<String>,
    /// Region code, must match the bill run's region.
    pub region: String,
    /// Charge-calculation variant.
    pub ruleset: Ruleset,
    /// Customer to bill.
    pub customer_reference: String,
    /// Licence number the charge applies to.
    pub licence_number: String,
    /// Financial year the charge falls in.
    pub financial_year: i32,
    /// Charge value in whole pence (positive magnitude).
    pub charge_value: i64,
    /// True for a credit line.
    pub charge_credit: bool,
    /// Line counts toward the minimum-charge rules.
    pub subject_to_minimum_charge: bool,
    /// True only for synthesized minimum-charge top-up lines.
    pub minimum_charge_adjustment: bool,
    /// Regulatory line description.
    pub line_description: String,
    /// Source transaction, when cloned by rebilling.
    pub rebilled_transaction_id: Option<TransactionId>,
}

impl TransactionInput {
    /// The delta this input will contribute once persisted.
    #[must_use]
    pub const fn tally_delta(&self) -> TallyDelta {
        TallyDelta::for_transaction(
            self.charge_value,
            self.charge_credit,
            self.subject_to_minimum_charge,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_delta_matches_flags() {
        let tx = Transaction {
            id: TransactionId::new(),
            bill_run_id: BillRunId::new(),
            invoice_id: InvoiceId::new(),
            licence_id: LicenceId::new(),
            regime_id: RegimeId::new(),
            created_by: Uuid::new_v4(),
            client_id: Some("tx-0001".to_string()),
            region: "A".to_string(),
            ruleset: Ruleset::Presroc,
            customer_reference: "TH230000222".to_string(),
            licence_number: "01/123".to_string(),
            financial_year: 2022,
            charge_value: 772,
            charge_credit: false,
            subject_to_minimum_charge: true,
            minimum_charge_adjustment: false,
            line_description: "Well at Chigley Town Hall".to_string(),
            rebilled_transaction_id: None,
        };

        let delta = tx.tally_delta();
        assert_eq!(delta.debit_line_count, 1);
        assert_eq!(delta.debit_line_value, 772);
        assert_eq!(delta.subject_to_minimum_charge_debit_value, 772);
    }
}
