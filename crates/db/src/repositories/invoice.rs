//! Invoice repository: single-invoice deletion and rebilling.
//!
//! Rebilling commits the cancel/rebill pair before copying the subtree, so
//! a copy failure leaves the pair in place for inspection and retry rather
//! than vanishing silently. The copy failure itself is reported through the
//! Notifier.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde_json::json;
use tokio::task::JoinHandle;
use uuid::Uuid;

use aquabill_core::billrun::{BillRunError, BillRunStatus};
use aquabill_core::invoice::Invoice;
use aquabill_core::rebill::{
    InvoiceDraft, InvoiceTree, LicenceTree, RebillPlan, RebillResult, RebillService,
    RebilledInvoice,
};
use aquabill_shared::types::{BillRunId, InvoiceId};
use aquabill_shared::{AppError, Notifier};

use crate::entities::{bill_runs, invoices, licences, transactions};

use super::convert::{
    bill_run_to_domain, db_err, invoice_to_domain, licence_to_domain, set_bill_run_tally,
    transaction_to_domain,
};
use super::bill_run::set_status;
use super::transaction::{parse_status, record_transaction, reset_to_initialised};

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetches one invoice.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the invoice does not exist.
    pub async fn find(&self, id: InvoiceId) -> Result<Invoice, AppError> {
        let model = invoices::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("invoice {id}")))?;
        invoice_to_domain(&model)
    }

    /// Deletes one invoice and its subtree, subtracting its tally from the
    /// bill run.
    ///
    /// The bill run holds `pending` while the cascade runs. Removing the
    /// last invoice drops the bill run back to `initialised` with a zeroed
    /// summary; otherwise the prior status is restored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown invoice and `Validation` when the
    /// bill run is billed or billing-not-required.
    pub async fn delete(&self, id: InvoiceId) -> Result<(), AppError> {
        let invoice = invoices::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("invoice {id}")))?;
        let bill_run = bill_runs::Entity::find_by_id(invoice.bill_run_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("bill run {}", invoice.bill_run_id)))?;
        let prior_status = parse_status(&bill_run)?;
        if !prior_status.can_delete() {
            return Err(BillRunError::WrongStatus {
                id: BillRunId::from_uuid(bill_run.id),
                status: prior_status,
                action: "amended",
            }
            .into());
        }

        set_status(&self.db, bill_run.id, BillRunStatus::Pending).await?;
        let bill_run_id = bill_run.id;

        let result = self.delete_held(&invoice, bill_run, prior_status).await;
        if result.is_err() {
            // Best-effort unlock so a failed cascade does not wedge the run.
            let _ = set_status(&self.db, bill_run_id, prior_status).await;
        }
        result
    }

    async fn delete_held(
        &self,
        invoice: &invoices::Model,
        bill_run: bill_runs::Model,
        prior_status: BillRunStatus,
    ) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let removed = invoice_to_domain(invoice)?;
        invoices::Entity::delete_by_id(invoice.id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let mut remaining = bill_run_to_domain(&bill_run)?;
        remaining.tally.remove(&removed.tally);

        let mut update: bill_runs::ActiveModel = bill_run.into();
        set_bill_run_tally(&mut update, &remaining.tally);
        if remaining.tally.is_empty() {
            update.status = Set(BillRunStatus::Initialised.as_str().to_string());
            update.invoice_count = Set(0);
            update.invoice_value = Set(0);
            update.credit_note_count = Set(0);
            update.credit_note_value = Set(0);
        } else {
            update.status = Set(prior_status.as_str().to_string());
        }
        update.updated_at = Set(Utc::now().into());
        update.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Fire-and-forget variant of [`delete`](Self::delete).
    ///
    /// The outcome is reported through the Notifier; the handle is for
    /// lifecycle management only.
    pub fn delete_in_background(
        &self,
        id: InvoiceId,
        notifier: Arc<dyn Notifier>,
    ) -> JoinHandle<()> {
        let repo = self.clone();
        tokio::spawn(async move {
            match repo.delete(id).await {
                Ok(()) => notifier.info("invoice deleted", json!({ "invoiceId": id.to_string() })),
                Err(err) => notifier.error_and_notify(
                    "invoice deletion failed",
                    json!({ "invoiceId": id.to_string(), "error": err.to_string() }),
                ),
            }
        })
    }

    /// Rebills one billed invoice onto a target bill run.
    ///
    /// Creates the cancel/rebill invoice pair, then mirrors the source
    /// subtree through the tally maintainer. The pair survives a copy
    /// failure; the failure is reported through the Notifier.
    ///
    /// # Errors
    ///
    /// Returns `Validation`/`Conflict` for rebilling precondition failures
    /// and `NotFound` for unknown records. A subtree copy failure is NOT an
    /// error: the shell pair is returned.
    pub async fn rebill(
        &self,
        source_invoice_id: InvoiceId,
        target_bill_run_id: BillRunId,
        notifier: Arc<dyn Notifier>,
    ) -> Result<RebillResult, AppError> {
        let source_model = invoices::Entity::find_by_id(Uuid::from(source_invoice_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("invoice {source_invoice_id}")))?;
        let source_run_model = bill_runs::Entity::find_by_id(source_model.bill_run_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("bill run {}", source_model.bill_run_id)))?;
        let target_model = bill_runs::Entity::find_by_id(Uuid::from(target_bill_run_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("bill run {target_bill_run_id}")))?;

        let already_rebilled = invoices::Entity::find()
            .filter(invoices::Column::RebilledInvoiceId.eq(source_model.id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .is_some();

        let source_run = bill_run_to_domain(&source_run_model)?;
        let source = invoice_to_domain(&source_model)?;
        let target = bill_run_to_domain(&target_model)?;
        RebillService::validate(&source_run, &source, &target, already_rebilled)
            .map_err(AppError::from)?;

        let tree = self.load_tree(&source_model).await?;
        let plan = RebillService::plan(&tree, &target);

        // Commit the pair and the advisory lock before copying.
        let txn = self.db.begin().await.map_err(db_err)?;
        set_status(&txn, target_model.id, BillRunStatus::Pending).await?;
        let cancel_id = insert_shell(&txn, target_model.id, &plan.cancel).await?;
        let rebill_id = insert_shell(&txn, target_model.id, &plan.rebill).await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            source_invoice_id = %source_invoice_id,
            target_bill_run_id = %target_bill_run_id,
            "rebill pair created"
        );

        let copy = self
            .copy_subtree(&plan, cancel_id, rebill_id, target_model.id)
            .await;
        if let Err(err) = copy {
            notifier.error_and_notify(
                "rebill subtree copy failed",
                json!({
                    "sourceInvoiceId": source_invoice_id.to_string(),
                    "targetBillRunId": target_bill_run_id.to_string(),
                    "error": err.to_string(),
                }),
            );
            // Best-effort unlock; the shells stay for inspection, and the
            // run drops back to initialised like any other amended run.
            let _ = reset_to_initialised(&self.db, target_model.id).await;
        }

        Ok(RebillResult {
            invoices: vec![
                RebilledInvoice {
                    id: InvoiceId::from_uuid(cancel_id),
                    rebilled_type: plan.cancel.rebilled_type,
                },
                RebilledInvoice {
                    id: InvoiceId::from_uuid(rebill_id),
                    rebilled_type: plan.rebill.rebilled_type,
                },
            ],
        })
    }

    /// Loads an invoice's full subtree for cloning.
    async fn load_tree(&self, invoice: &invoices::Model) -> Result<InvoiceTree, AppError> {
        let licence_models = licences::Entity::find()
            .filter(licences::Column::InvoiceId.eq(invoice.id))
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut tree_licences = Vec::with_capacity(licence_models.len());
        for licence_model in licence_models {
            let transaction_models = transactions::Entity::find()
                .filter(transactions::Column::LicenceId.eq(licence_model.id))
                .all(&self.db)
                .await
                .map_err(db_err)?;
            let mut lines = Vec::with_capacity(transaction_models.len());
            for model in &transaction_models {
                lines.push(transaction_to_domain(model)?);
            }
            tree_licences.push(LicenceTree {
                licence: licence_to_domain(&licence_model),
                transactions: lines,
            });
        }

        Ok(InvoiceTree {
            invoice: invoice_to_domain(invoice)?,
            licences: tree_licences,
        })
    }

    /// Mirrors both drafts' lines through the tally maintainer.
    ///
    /// The mirrored lines are writes like any other, so the target run ends
    /// the copy on `initialised` with a zeroed summary rather than its prior
    /// status; a generate pass that predates the copy is stale.
    async fn copy_subtree(
        &self,
        plan: &RebillPlan,
        cancel_id: Uuid,
        rebill_id: Uuid,
        target_bill_run_id: Uuid,
    ) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        for (draft, shell_id) in [(&plan.cancel, cancel_id), (&plan.rebill, rebill_id)] {
            for licence in &draft.licences {
                for line in &licence.transactions {
                    record_transaction(&txn, shell_id, line).await?;
                }
            }
        }

        reset_to_initialised(&txn, target_bill_run_id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(())
    }
}

/// Inserts one empty invoice shell from a rebilling draft.
async fn insert_shell(
    txn: &DatabaseTransaction,
    bill_run_id: Uuid,
    draft: &InvoiceDraft,
) -> Result<Uuid, AppError> {
    let id = Uuid::now_v7();
    let now = Utc::now().into();
    let shell = invoices::ActiveModel {
        id: Set(id),
        bill_run_id: Set(bill_run_id),
        customer_reference: Set(draft.customer_reference.clone()),
        financial_year: Set(draft.financial_year),
        credit_line_count: Set(0),
        credit_line_value: Set(0),
        debit_line_count: Set(0),
        debit_line_value: Set(0),
        zero_line_count: Set(0),
        subject_to_minimum_charge_count: Set(0),
        subject_to_minimum_charge_credit_value: Set(0),
        subject_to_minimum_charge_debit_value: Set(0),
        zero_value_invoice: Set(false),
        deminimis_invoice: Set(draft.deminimis_invoice),
        minimum_charge_invoice: Set(draft.minimum_charge_invoice),
        rebilled_invoice_id: Set(Some(Uuid::from(draft.rebilled_invoice_id))),
        rebilled_type: Set(draft.rebilled_type.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    shell.insert(txn).await.map_err(db_err)?;
    Ok(id)
}

