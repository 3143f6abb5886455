//! Bill run summarizer.
//!
//! Classification is recomputed from scratch on every pass rather than
//! incrementally, so re-generation is idempotent and corrects stale flags
//! left by a previous pass.

use crate::invoice::Invoice;

use super::types::{BillRunSummary, InvoiceClassification};

/// Summarization service for the generate pass.
pub struct SummaryService;

impl SummaryService {
    /// Classifies one invoice against the deminimis threshold.
    ///
    /// An invoice carrying a minimum-charge adjustment is never zero-value
    /// or deminimis: the regulatory floor forces presentation.
    #[must_use]
    pub const fn classify_invoice(invoice: &Invoice, deminimis_limit: i64) -> InvoiceClassification {
        let net = invoice.net_total();

        if invoice.minimum_charge_invoice {
            return InvoiceClassification {
                zero_value: false,
                deminimis: false,
            };
        }

        InvoiceClassification {
            zero_value: net == 0,
            deminimis: net > 0 && net < deminimis_limit,
        }
    }

    /// Recomputes the bill-run-level summary over all invoices.
    ///
    /// Debit-net invoices that are neither deminimis nor zero-value feed
    /// the invoice count/value; credit-net invoices feed the credit note
    /// count/value with no deminimis exclusion. Values are absolute net
    /// totals since credit invoices store positive magnitudes with a
    /// separate sign convention.
    #[must_use]
    pub fn summarize_bill_run(invoices: &[Invoice], deminimis_limit: i64) -> BillRunSummary {
        let mut summary = BillRunSummary::default();

        for invoice in invoices {
            let net = invoice.net_total();
            let classification = Self::classify_invoice(invoice, deminimis_limit);

            if net > 0 && !classification.deminimis {
                summary.invoice_count += 1;
                summary.invoice_value += net;
            } else if net < 0 {
                summary.credit_note_count += 1;
                summary.credit_note_value += net.abs();
            }
        }

        summary
    }
}
