//! Invoice and licence domain types.

use serde::{Deserialize, Serialize};

use aquabill_shared::types::{BillRunId, InvoiceId, LicenceId};

use crate::tally::Tally;

/// Rebilling role of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RebilledType {
    /// An ordinary invoice, not part of a cancel/rebill pair.
    #[default]
    O,
    /// The reversing half of a rebilling pair.
    C,
    /// The replacement half of a rebilling pair.
    R,
}

impl RebilledType {
    /// Database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::O => "O",
            Self::C => "C",
            Self::R => "R",
        }
    }
}

impl std::fmt::Display for RebilledType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RebilledType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "O" => Ok(Self::O),
            "C" => Ok(Self::C),
            "R" => Ok(Self::R),
            other => Err(format!("unknown rebilled type: {other}")),
        }
    }
}

/// One customer's aggregate within a bill run.
///
/// Uniquely keyed by `(bill_run_id, customer_reference, financial_year)`.
/// Classification flags are write-only by the generate pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Identity.
    pub id: InvoiceId,
    /// Owning bill run.
    pub bill_run_id: BillRunId,
    /// Customer this invoice bills.
    pub customer_reference: String,
    /// Financial year the charges fall in.
    pub financial_year: i32,
    /// Running line aggregates.
    pub tally: Tally,
    /// Net total is zero and nothing forces presentation.
    pub zero_value_invoice: bool,
    /// Net total too small to bill.
    pub deminimis_invoice: bool,
    /// Carries at least one minimum-charge adjustment.
    pub minimum_charge_invoice: bool,
    /// Invoice this one reverses or replaces, when part of a pair.
    pub rebilled_invoice_id: Option<InvoiceId>,
    /// Rebilling role.
    pub rebilled_type: RebilledType,
}

impl Invoice {
    /// Net invoice value (debit minus credit).
    #[must_use]
    pub const fn net_total(&self) -> i64 {
        self.tally.net_total()
    }

    /// Returns true if this invoice is not part of a cancel/rebill pair.
    #[must_use]
    pub const fn is_original(&self) -> bool {
        matches!(self.rebilled_type, RebilledType::O)
    }
}

/// Aggregate for one licence number within one invoice.
///
/// Uniquely keyed by `(invoice_id, licence_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Licence {
    /// Identity.
    pub id: LicenceId,
    /// Owning invoice.
    pub invoice_id: InvoiceId,
    /// Bill run the owning invoice belongs to.
    pub bill_run_id: BillRunId,
    /// Licence number this aggregate covers.
    pub licence_number: String,
    /// Running line aggregates.
    pub tally: Tally,
}
