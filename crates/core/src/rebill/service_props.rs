//! Property-based tests for the rebilling planner.

use proptest::prelude::*;
use uuid::Uuid;

use aquabill_shared::types::{BillRunId, InvoiceId, LicenceId, RegimeId, TransactionId};

use super::service::RebillService;
use super::types::{InvoiceTree, LicenceTree};
use crate::billrun::{BillRun, BillRunStatus, Ruleset};
use crate::invoice::{Invoice, Licence, RebilledType};
use crate::tally::Tally;
use crate::transaction::Transaction;

fn target_bill_run() -> BillRun {
    BillRun {
        id: BillRunId::new(),
        regime_id: RegimeId::new(),
        created_by: Uuid::new_v4(),
        region: "A".to_string(),
        ruleset: Ruleset::Presroc,
        bill_run_number: 50002,
        status: BillRunStatus::Initialised,
        tally: Tally::default(),
        invoice_count: 0,
        invoice_value: 0,
        credit_note_count: 0,
        credit_note_value: 0,
        file_reference: None,
    }
}

/// Strategy for an invoice tree with 1..=4 licences of 1..=5 lines each.
fn tree_strategy() -> impl Strategy<Value = InvoiceTree> {
    let line = (1i64..100_000, any::<bool>(), any::<bool>());
    let licence = prop::collection::vec(line, 1..=5);
    prop::collection::vec(licence, 1..=4).prop_map(|licences| {
        let bill_run_id = BillRunId::new();
        let invoice_id = InvoiceId::new();

        let licences = licences
            .into_iter()
            .enumerate()
            .map(|(i, lines)| {
                let licence_id = LicenceId::new();
                let transactions = lines
                    .into_iter()
                    .map(|(charge_value, charge_credit, minimum_charge)| Transaction {
                        id: TransactionId::new(),
                        bill_run_id,
                        invoice_id,
                        licence_id,
                        regime_id: RegimeId::new(),
                        created_by: Uuid::new_v4(),
                        client_id: Some("tx-0001".to_string()),
                        region: "A".to_string(),
                        ruleset: Ruleset::Presroc,
                        customer_reference: "TH230000222".to_string(),
                        licence_number: format!("01/{i}"),
                        financial_year: 2022,
                        charge_value,
                        charge_credit,
                        subject_to_minimum_charge: minimum_charge,
                        minimum_charge_adjustment: false,
                        line_description: "Well at Chigley Town Hall".to_string(),
                        rebilled_transaction_id: None,
                    })
                    .collect();
                LicenceTree {
                    licence: Licence {
                        id: licence_id,
                        invoice_id,
                        bill_run_id,
                        licence_number: format!("01/{i}"),
                        tally: Tally::default(),
                    },
                    transactions,
                }
            })
            .collect();

        InvoiceTree {
            invoice: Invoice {
                id: invoice_id,
                bill_run_id,
                customer_reference: "TH230000222".to_string(),
                financial_year: 2022,
                tally: Tally::default(),
                zero_value_invoice: false,
                deminimis_invoice: false,
                minimum_charge_invoice: false,
                rebilled_invoice_id: None,
                rebilled_type: RebilledType::O,
            },
            licences,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Both halves mirror the source subtree shape exactly.
    #[test]
    fn prop_plan_preserves_subtree_shape(tree in tree_strategy()) {
        let target = target_bill_run();
        let plan = RebillService::plan(&tree, &target);

        for draft in [&plan.cancel, &plan.rebill] {
            prop_assert_eq!(draft.licences.len(), tree.licences.len());
            for (draft_licence, source_licence) in draft.licences.iter().zip(&tree.licences) {
                prop_assert_eq!(
                    draft_licence.transactions.len(),
                    source_licence.transactions.len()
                );
            }
        }
    }

    /// The cancel side is the exact charge_credit inverse of the rebill
    /// side; all other charge fields agree.
    #[test]
    fn prop_cancel_is_inverse_of_rebill(tree in tree_strategy()) {
        let target = target_bill_run();
        let plan = RebillService::plan(&tree, &target);

        let cancels = plan.cancel.licences.iter().flat_map(|l| l.transactions.iter());
        let rebills = plan.rebill.licences.iter().flat_map(|l| l.transactions.iter());
        for (cancel, rebill) in cancels.zip(rebills) {
            prop_assert_eq!(cancel.charge_credit, !rebill.charge_credit);
            prop_assert_eq!(cancel.charge_value, rebill.charge_value);
            prop_assert_eq!(
                cancel.subject_to_minimum_charge,
                rebill.subject_to_minimum_charge
            );
            prop_assert_eq!(cancel.rebilled_transaction_id, rebill.rebilled_transaction_id);
        }
    }

    /// Every mirrored line back-references a source line, drops its client
    /// id, and targets the new bill run.
    #[test]
    fn prop_mirrored_lines_reference_source(tree in tree_strategy()) {
        let target = target_bill_run();
        let plan = RebillService::plan(&tree, &target);

        let source_ids: Vec<TransactionId> = tree
            .licences
            .iter()
            .flat_map(|l| l.transactions.iter().map(|tx| tx.id))
            .collect();

        for draft in [&plan.cancel, &plan.rebill] {
            let mirrored: Vec<_> = draft
                .licences
                .iter()
                .flat_map(|l| l.transactions.iter())
                .collect();
            prop_assert_eq!(mirrored.len(), source_ids.len());
            for (tx, source_id) in mirrored.iter().zip(&source_ids) {
                prop_assert_eq!(tx.rebilled_transaction_id, Some(*source_id));
                prop_assert_eq!(&tx.client_id, &None);
                prop_assert_eq!(tx.bill_run_id, target.id);
            }
        }
    }

    /// Cancel and rebill tally deltas net to zero when summed, since each
    /// cancel line lands on the opposite side of its rebill twin.
    #[test]
    fn prop_pair_nets_to_zero(tree in tree_strategy()) {
        let target = target_bill_run();
        let plan = RebillService::plan(&tree, &target);

        let mut tally = Tally::default();
        for draft in [&plan.cancel, &plan.rebill] {
            for tx in draft.licences.iter().flat_map(|l| l.transactions.iter()) {
                tally.apply(&tx.tally_delta());
            }
        }
        prop_assert_eq!(tally.net_total(), 0);
    }
}
