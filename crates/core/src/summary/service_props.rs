//! Property-based tests for the bill run summarizer.

use proptest::prelude::*;

use aquabill_shared::types::{BillRunId, InvoiceId};

use super::service::SummaryService;
use crate::invoice::{Invoice, RebilledType};
use crate::tally::{Tally, TallyDelta};

const DEMINIMIS_LIMIT: i64 = 500;

/// Strategy for an invoice built from random debit/credit totals.
fn invoice_strategy() -> impl Strategy<Value = Invoice> {
    (0i64..100_000, 0i64..100_000, any::<bool>()).prop_map(|(debit, credit, minimum_charge)| {
        let mut tally = Tally::default();
        if debit > 0 {
            tally.apply(&TallyDelta::for_transaction(debit, false, false));
        }
        if credit > 0 {
            tally.apply(&TallyDelta::for_transaction(credit, true, false));
        }
        Invoice {
            id: InvoiceId::new(),
            bill_run_id: BillRunId::new(),
            customer_reference: "CUST001".to_string(),
            financial_year: 2022,
            tally,
            zero_value_invoice: false,
            deminimis_invoice: false,
            minimum_charge_invoice: minimum_charge,
            rebilled_invoice_id: None,
            rebilled_type: RebilledType::O,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The classification flags are mutually exclusive.
    #[test]
    fn prop_flags_mutually_exclusive(invoice in invoice_strategy()) {
        let classification = SummaryService::classify_invoice(&invoice, DEMINIMIS_LIMIT);
        prop_assert!(!(classification.zero_value && classification.deminimis));
    }

    /// Minimum-charge invoices never carry either exclusion flag.
    #[test]
    fn prop_minimum_charge_never_excluded(mut invoice in invoice_strategy()) {
        invoice.minimum_charge_invoice = true;
        let classification = SummaryService::classify_invoice(&invoice, DEMINIMIS_LIMIT);
        prop_assert!(!classification.zero_value);
        prop_assert!(!classification.deminimis);
    }

    /// Classification is a pure function of the invoice: two passes agree.
    #[test]
    fn prop_classification_idempotent(invoice in invoice_strategy()) {
        let first = SummaryService::classify_invoice(&invoice, DEMINIMIS_LIMIT);
        let second = SummaryService::classify_invoice(&invoice, DEMINIMIS_LIMIT);
        prop_assert_eq!(first, second);
    }

    /// Every invoice lands in exactly one summary bucket (or none).
    #[test]
    fn prop_summary_buckets_partition(
        invoices in prop::collection::vec(invoice_strategy(), 0..25),
    ) {
        let summary = SummaryService::summarize_bill_run(&invoices, DEMINIMIS_LIMIT);

        let mut expected_invoices = 0;
        let mut expected_credit_notes = 0;
        for invoice in &invoices {
            let net = invoice.net_total();
            let classification = SummaryService::classify_invoice(invoice, DEMINIMIS_LIMIT);
            if net > 0 && !classification.deminimis {
                expected_invoices += 1;
            } else if net < 0 {
                expected_credit_notes += 1;
            }
        }

        prop_assert_eq!(summary.invoice_count, expected_invoices);
        prop_assert_eq!(summary.credit_note_count, expected_credit_notes);
        prop_assert!(summary.invoice_value >= 0);
        prop_assert!(summary.credit_note_value >= 0);
    }

    /// Summarizing the same invoices twice yields identical summaries.
    #[test]
    fn prop_summarize_idempotent(
        invoices in prop::collection::vec(invoice_strategy(), 0..25),
    ) {
        let first = SummaryService::summarize_bill_run(&invoices, DEMINIMIS_LIMIT);
        let second = SummaryService::summarize_bill_run(&invoices, DEMINIMIS_LIMIT);
        prop_assert_eq!(first, second);
    }
}
