//! Rebilling planner.
//!
//! Planning is pure: it validates preconditions against already-loaded
//! records and produces cancel/rebill drafts. Persisting the drafts runs
//! each mirrored transaction back through the tally maintainer so every
//! aggregate and classification is recomputed rather than copied.

use crate::billrun::{BillRun, BillRunStatus};
use crate::invoice::{Invoice, RebilledType};
use crate::transaction::{Transaction, TransactionInput};

use super::error::RebillError;
use super::types::{InvoiceDraft, InvoiceTree, LicenceDraft, RebillPlan};

/// Planner for cancel/rebill invoice pairs.
pub struct RebillService;

impl RebillService {
    /// Validates that a source invoice may be rebilled onto a target bill
    /// run.
    ///
    /// `already_rebilled` is true when another invoice anywhere already
    /// references the source via `rebilled_invoice_id`.
    ///
    /// # Errors
    ///
    /// Returns `SourceNotBilled` unless the source bill run is billed,
    /// `NotOriginal` when the source is itself half of a pair,
    /// `AlreadyRebilled` when a pair already exists, `RegionMismatch` when
    /// the regions differ, and `TargetNotEditable` when the target bill
    /// run has moved past its editable statuses.
    pub fn validate(
        source_run: &BillRun,
        source: &Invoice,
        target: &BillRun,
        already_rebilled: bool,
    ) -> Result<(), RebillError> {
        if source_run.status != BillRunStatus::Billed {
            return Err(RebillError::SourceNotBilled {
                invoice: source.id,
                status: source_run.status,
            });
        }
        if !source.is_original() {
            return Err(RebillError::NotOriginal {
                invoice: source.id,
                rebilled_type: source.rebilled_type,
            });
        }
        if already_rebilled {
            return Err(RebillError::AlreadyRebilled(source.id));
        }
        if source_run.region != target.region {
            return Err(RebillError::RegionMismatch {
                invoice: source.id,
                source_region: source_run.region.clone(),
                bill_run: target.id,
                target_region: target.region.clone(),
            });
        }
        if !target.status.is_editable() {
            return Err(RebillError::TargetNotEditable {
                bill_run: target.id,
                status: target.status,
            });
        }
        Ok(())
    }

    /// Builds the cancel and rebill drafts for one source invoice subtree.
    ///
    /// Both halves mirror every licence and transaction of the source. The
    /// cancel half inverts each line's `charge_credit`; the rebill half
    /// copies it. Every mirrored line references its source via
    /// `rebilled_transaction_id` and drops any client-assigned id, since
    /// the same id cloned twice would collide with the per-bill-run
    /// uniqueness rule.
    #[must_use]
    pub fn plan(tree: &InvoiceTree, target: &BillRun) -> RebillPlan {
        RebillPlan {
            cancel: Self::draft(tree, target, RebilledType::C),
            rebill: Self::draft(tree, target, RebilledType::R),
        }
    }

    fn draft(tree: &InvoiceTree, target: &BillRun, rebilled_type: RebilledType) -> InvoiceDraft {
        let invert = matches!(rebilled_type, RebilledType::C);

        let licences = tree
            .licences
            .iter()
            .map(|licence_tree| LicenceDraft {
                licence_number: licence_tree.licence.licence_number.clone(),
                transactions: licence_tree
                    .transactions
                    .iter()
                    .map(|tx| Self::mirror_transaction(tx, target, invert))
                    .collect(),
            })
            .collect();

        InvoiceDraft {
            rebilled_type,
            rebilled_invoice_id: tree.invoice.id,
            customer_reference: tree.invoice.customer_reference.clone(),
            financial_year: tree.invoice.financial_year,
            deminimis_invoice: tree.invoice.deminimis_invoice,
            minimum_charge_invoice: tree.invoice.minimum_charge_invoice,
            licences,
        }
    }

    fn mirror_transaction(tx: &Transaction, target: &BillRun, invert: bool) -> TransactionInput {
        TransactionInput {
            bill_run_id: target.id,
            regime_id: tx.regime_id,
            created_by: tx.created_by,
            client_id: None,
            region: tx.region.clone(),
            ruleset: tx.ruleset,
            customer_reference: tx.customer_reference.clone(),
            licence_number: tx.licence_number.clone(),
            financial_year: tx.financial_year,
            charge_value: tx.charge_value,
            charge_credit: if invert {
                !tx.charge_credit
            } else {
                tx.charge_credit
            },
            subject_to_minimum_charge: tx.subject_to_minimum_charge,
            minimum_charge_adjustment: tx.minimum_charge_adjustment,
            line_description: tx.line_description.clone(),
            rebilled_transaction_id: Some(tx.id),
        }
    }
}
