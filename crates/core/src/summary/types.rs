//! Summarization result types.

use serde::{Deserialize, Serialize};

/// Threshold classification of one invoice, recomputed on every generate
/// pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceClassification {
    /// Net total is zero and nothing forces presentation.
    pub zero_value: bool,
    /// Net total is positive but too small to bill.
    pub deminimis: bool,
}

/// Bill-run-level summary recomputed during a generate pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRunSummary {
    /// Count of billable debit-net invoices.
    pub invoice_count: i64,
    /// Sum of billable debit-net invoice values.
    pub invoice_value: i64,
    /// Count of credit-net invoices.
    pub credit_note_count: i64,
    /// Sum of credit-net invoice values (positive magnitude).
    pub credit_note_value: i64,
}

impl BillRunSummary {
    /// Returns true if the bill run has nothing to send downstream.
    #[must_use]
    pub const fn is_billing_not_required(&self) -> bool {
        self.invoice_count == 0 && self.credit_note_count == 0
    }
}
