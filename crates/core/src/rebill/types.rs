//! Rebilling input trees, output drafts, and the caller-facing result.

use serde::{Deserialize, Serialize};

use aquabill_shared::types::InvoiceId;

use crate::invoice::{Invoice, Licence, RebilledType};
use crate::transaction::{Transaction, TransactionInput};

/// A licence with all of its transactions, loaded for cloning.
#[derive(Debug, Clone)]
pub struct LicenceTree {
    /// The licence aggregate.
    pub licence: Licence,
    /// Every transaction under the licence.
    pub transactions: Vec<Transaction>,
}

/// A source invoice with its full subtree, loaded for cloning.
#[derive(Debug, Clone)]
pub struct InvoiceTree {
    /// The invoice being rebilled.
    pub invoice: Invoice,
    /// Every licence under the invoice.
    pub licences: Vec<LicenceTree>,
}

/// One mirrored licence, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenceDraft {
    /// Licence number copied from the source.
    pub licence_number: String,
    /// Mirrored transactions for this licence.
    pub transactions: Vec<TransactionInput>,
}

/// One half of the cancel/rebill pair, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    /// Cancel or rebill role.
    pub rebilled_type: RebilledType,
    /// The source invoice this half reverses or replaces.
    pub rebilled_invoice_id: InvoiceId,
    /// Customer copied from the source.
    pub customer_reference: String,
    /// Financial year copied from the source.
    pub financial_year: i32,
    /// Classification flag copied verbatim from the source.
    pub deminimis_invoice: bool,
    /// Classification flag copied verbatim from the source.
    pub minimum_charge_invoice: bool,
    /// Mirrored licences.
    pub licences: Vec<LicenceDraft>,
}

/// The full plan for one rebilling operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebillPlan {
    /// Reversing half (charge credits inverted).
    pub cancel: InvoiceDraft,
    /// Replacement half (charge credits preserved).
    pub rebill: InvoiceDraft,
}

/// Reference to one created invoice, returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebilledInvoice {
    /// The new invoice's id.
    pub id: InvoiceId,
    /// Its rebilling role.
    pub rebilled_type: RebilledType,
}

/// Result record handed back to the caller.
///
/// The pair exists even when subtree copying failed partway; callers can
/// detect the failure through the invoices' emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebillResult {
    /// The cancel and rebill invoices, in creation order.
    pub invoices: Vec<RebilledInvoice>,
}
