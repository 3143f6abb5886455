//! Bill run repository: lifecycle operations over whole bill runs.
//!
//! `generate` runs the minimum charge calculator and the summarizer in one
//! database transaction. The long-running operations also come as spawn
//! wrappers that report through the Notifier port instead of returning
//! errors to the caller.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde_json::json;
use tokio::task::JoinHandle;
use uuid::Uuid;

use aquabill_core::billrun::{validate_can_generate, BillRun, BillRunError, BillRunStatus, Ruleset};
use aquabill_core::invoice::Invoice;
use aquabill_core::minimum_charge::MinimumChargeService;
use aquabill_core::summary::SummaryService;
use aquabill_shared::config::ChargingConfig;
use aquabill_shared::types::{BillRunId, RegimeId};
use aquabill_shared::{AppError, Notifier};

use crate::entities::{bill_runs, invoices, licences, transactions};

use super::convert::{
    bill_run_to_domain, db_err, invoice_to_domain, licence_to_domain, transaction_to_domain,
};
use super::transaction::{find_bill_run, parse_status, record_transaction};

/// Input for creating a bill run.
#[derive(Debug, Clone)]
pub struct CreateBillRunInput {
    /// Owning regime.
    pub regime_id: RegimeId,
    /// System creating the bill run.
    pub created_by: Uuid,
    /// Region code.
    pub region: String,
    /// Charge-calculation variant.
    pub ruleset: Ruleset,
}

/// Bill run repository for lifecycle operations.
#[derive(Debug, Clone)]
pub struct BillRunRepository {
    db: DatabaseConnection,
}

impl BillRunRepository {
    /// Creates a new bill run repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an empty bill run in `initialised` status.
    ///
    /// The bill run number comes from the database sequence.
    ///
    /// # Errors
    ///
    /// Returns `Database` on infrastructure failure.
    pub async fn create(&self, input: CreateBillRunInput) -> Result<BillRun, AppError> {
        let now = Utc::now().into();
        let bill_run = bill_runs::ActiveModel {
            id: Set(Uuid::now_v7()),
            regime_id: Set(Uuid::from(input.regime_id)),
            created_by: Set(input.created_by),
            region: Set(input.region),
            ruleset: Set(input.ruleset.as_str().to_string()),
            status: Set(BillRunStatus::Initialised.as_str().to_string()),
            credit_line_count: Set(0),
            credit_line_value: Set(0),
            debit_line_count: Set(0),
            debit_line_value: Set(0),
            zero_line_count: Set(0),
            subject_to_minimum_charge_count: Set(0),
            subject_to_minimum_charge_credit_value: Set(0),
            subject_to_minimum_charge_debit_value: Set(0),
            invoice_count: Set(0),
            invoice_value: Set(0),
            credit_note_count: Set(0),
            credit_note_value: Set(0),
            file_reference: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            // bill_run_number left unset: filled from bill_run_number_seq
            ..Default::default()
        };

        let created = bill_run.insert(&self.db).await.map_err(db_err)?;
        bill_run_to_domain(&created)
    }

    /// Fetches one bill run.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the bill run does not exist.
    pub async fn find(&self, id: BillRunId) -> Result<BillRun, AppError> {
        let model = bill_runs::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("bill run {id}")))?;
        bill_run_to_domain(&model)
    }

    /// Runs the generate pass: minimum charge adjustments, invoice
    /// classification, and the bill-run summary, all in one transaction.
    ///
    /// The `generating` flip commits before the pass starts so the advisory
    /// lock is visible to concurrent callers; a failed pass restores the
    /// prior status.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` while a pass is already running, `Validation` for
    /// a non-generatable status or an empty bill run, and `Database` on
    /// infrastructure failure.
    pub async fn generate(
        &self,
        id: BillRunId,
        charging: &ChargingConfig,
    ) -> Result<BillRun, AppError> {
        let model = bill_runs::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("bill run {id}")))?;
        let status = parse_status(&model)?;
        let domain = bill_run_to_domain(&model)?;
        validate_can_generate(id, status, domain.is_empty()).map_err(AppError::from)?;

        // Committed before the pass so concurrent callers see the lock.
        set_status(&self.db, model.id, BillRunStatus::Generating).await?;
        tracing::info!(bill_run_id = %id, "generate pass started");

        let result = self.run_generate_pass(id, charging).await;
        if result.is_err() {
            // Best-effort unlock; the pass transaction rolled back.
            let _ = set_status(&self.db, model.id, status).await;
        }
        result
    }

    async fn run_generate_pass(
        &self,
        id: BillRunId,
        charging: &ChargingConfig,
    ) -> Result<BillRun, AppError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        apply_minimum_charges(&txn, Uuid::from(id), charging.minimum_charge_amount).await?;
        let invoices = classify_invoices(&txn, Uuid::from(id), charging.deminimis_limit).await?;
        let summary = SummaryService::summarize_bill_run(&invoices, charging.deminimis_limit);

        let generated = find_bill_run(&txn, id).await?;
        let mut update: bill_runs::ActiveModel = generated.into();
        update.status = Set(BillRunStatus::Generated.as_str().to_string());
        update.invoice_count = Set(summary.invoice_count);
        update.invoice_value = Set(summary.invoice_value);
        update.credit_note_count = Set(summary.credit_note_count);
        update.credit_note_value = Set(summary.credit_note_value);
        update.updated_at = Set(Utc::now().into());
        let updated = update.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            bill_run_id = %id,
            invoice_count = summary.invoice_count,
            credit_note_count = summary.credit_note_count,
            "generate pass complete"
        );
        bill_run_to_domain(&updated)
    }

    /// Fire-and-forget variant of [`generate`](Self::generate).
    ///
    /// The returned handle is for lifecycle management only; the outcome is
    /// reported through the Notifier.
    pub fn generate_in_background(
        &self,
        id: BillRunId,
        charging: ChargingConfig,
        notifier: Arc<dyn Notifier>,
    ) -> JoinHandle<()> {
        let repo = self.clone();
        tokio::spawn(async move {
            match repo.generate(id, &charging).await {
                Ok(bill_run) => notifier.info(
                    "bill run generated",
                    json!({
                        "billRunId": id.to_string(),
                        "invoiceCount": bill_run.invoice_count,
                        "creditNoteCount": bill_run.credit_note_count,
                    }),
                ),
                Err(err) => notifier.error_and_notify(
                    "bill run generation failed",
                    json!({ "billRunId": id.to_string(), "error": err.to_string() }),
                ),
            }
        })
    }

    /// Approves a generated bill run for sending.
    ///
    /// # Errors
    ///
    /// Returns `Validation` unless the bill run is `generated`.
    pub async fn approve(&self, id: BillRunId) -> Result<BillRun, AppError> {
        self.transition(id, "approved", BillRunStatus::can_approve, BillRunStatus::Approved)
            .await
    }

    /// Sends an approved bill run downstream.
    ///
    /// A billable bill run gets its transaction file reference and lands on
    /// `billed`; one with nothing billable lands on `billing_not_required`
    /// with no file reference.
    ///
    /// # Errors
    ///
    /// Returns `Validation` unless the bill run is `approved`.
    pub async fn send(&self, id: BillRunId) -> Result<BillRun, AppError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let bill_run = find_bill_run(&txn, id).await?;
        let status = parse_status(&bill_run)?;
        if !status.can_send() {
            return Err(BillRunError::WrongStatus {
                id,
                status,
                action: "sent",
            }
            .into());
        }

        set_status(&txn, bill_run.id, BillRunStatus::Sending).await?;

        let domain = bill_run_to_domain(&bill_run)?;
        let billing_not_required = domain.invoice_count == 0 && domain.credit_note_count == 0;

        let mut update: bill_runs::ActiveModel = bill_run.into();
        if billing_not_required {
            update.status = Set(BillRunStatus::BillingNotRequired.as_str().to_string());
        } else {
            update.status = Set(BillRunStatus::Billed.as_str().to_string());
            update.file_reference = Set(Some(domain.file_reference()));
        }
        update.updated_at = Set(Utc::now().into());
        let updated = update.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        bill_run_to_domain(&updated)
    }

    /// Deletes a bill run and everything under it.
    ///
    /// The bill run holds `deleting` while the cascade runs.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a billed or billing-not-required bill run.
    pub async fn delete(&self, id: BillRunId) -> Result<(), AppError> {
        let model = bill_runs::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("bill run {id}")))?;
        let status = parse_status(&model)?;
        if !status.can_delete() {
            return Err(BillRunError::WrongStatus {
                id,
                status,
                action: "deleted",
            }
            .into());
        }

        let mut update: bill_runs::ActiveModel = model.into();
        update.status = Set(BillRunStatus::Deleting.as_str().to_string());
        update.updated_at = Set(Utc::now().into());
        update.update(&self.db).await.map_err(db_err)?;

        bill_runs::Entity::delete_by_id(Uuid::from(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        tracing::info!(bill_run_id = %id, "bill run deleted");
        Ok(())
    }

    /// Fire-and-forget variant of [`delete`](Self::delete).
    pub fn delete_in_background(
        &self,
        id: BillRunId,
        notifier: Arc<dyn Notifier>,
    ) -> JoinHandle<()> {
        let repo = self.clone();
        tokio::spawn(async move {
            match repo.delete(id).await {
                Ok(()) => notifier.info(
                    "bill run deleted",
                    json!({ "billRunId": id.to_string() }),
                ),
                Err(err) => notifier.error_and_notify(
                    "bill run deletion failed",
                    json!({ "billRunId": id.to_string(), "error": err.to_string() }),
                ),
            }
        })
    }

    async fn transition(
        &self,
        id: BillRunId,
        action: &'static str,
        allowed: fn(BillRunStatus) -> bool,
        next: BillRunStatus,
    ) -> Result<BillRun, AppError> {
        let model = bill_runs::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("bill run {id}")))?;
        let status = parse_status(&model)?;
        if !allowed(status) {
            return Err(BillRunError::WrongStatus { id, status, action }.into());
        }

        let mut update: bill_runs::ActiveModel = model.into();
        update.status = Set(next.as_str().to_string());
        update.updated_at = Set(Utc::now().into());
        let updated = update.update(&self.db).await.map_err(db_err)?;
        bill_run_to_domain(&updated)
    }
}

/// Moves a bill run to a status, on a connection or inside a transaction.
pub(crate) async fn set_status<C>(
    conn: &C,
    bill_run_id: Uuid,
    status: BillRunStatus,
) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    let model = bill_runs::Entity::find_by_id(bill_run_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("bill run {bill_run_id}")))?;
    let mut update: bill_runs::ActiveModel = model.into();
    update.status = Set(status.as_str().to_string());
    update.updated_at = Set(Utc::now().into());
    update.update(conn).await.map_err(db_err)?;
    Ok(())
}

/// Synthesizes minimum charge top-ups for every qualifying licence and
/// pushes them through the tally maintainer.
async fn apply_minimum_charges(
    txn: &DatabaseTransaction,
    bill_run_id: Uuid,
    limit: i64,
) -> Result<(), AppError> {
    let licence_models = licences::Entity::find()
        .filter(licences::Column::BillRunId.eq(bill_run_id))
        .all(txn)
        .await
        .map_err(db_err)?;

    for model in licence_models {
        let licence = licence_to_domain(&model);
        if !MinimumChargeService::licence_qualifies(&licence, limit) {
            continue;
        }

        let template = transactions::Entity::find()
            .filter(transactions::Column::LicenceId.eq(model.id))
            .filter(transactions::Column::SubjectToMinimumCharge.eq(true))
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "licence {} tallies minimum-charge lines but has none",
                    model.id
                ))
            })?;
        let template = transaction_to_domain(&template)?;

        for adjustment in
            MinimumChargeService::adjustments_for_licence(&licence, &template, limit)
        {
            record_transaction(txn, model.invoice_id, &adjustment).await?;
        }
    }

    Ok(())
}

/// Recomputes classification flags for every invoice in the bill run and
/// returns the reclassified invoices for summarization.
async fn classify_invoices(
    txn: &DatabaseTransaction,
    bill_run_id: Uuid,
    deminimis_limit: i64,
) -> Result<Vec<Invoice>, AppError> {
    let models = invoices::Entity::find()
        .filter(invoices::Column::BillRunId.eq(bill_run_id))
        .all(txn)
        .await
        .map_err(db_err)?;

    let mut result = Vec::with_capacity(models.len());
    for model in models {
        let mut invoice = invoice_to_domain(&model)?;
        let classification = SummaryService::classify_invoice(&invoice, deminimis_limit);

        if classification.zero_value != model.zero_value_invoice
            || classification.deminimis != model.deminimis_invoice
        {
            let mut update: invoices::ActiveModel = model.into();
            update.zero_value_invoice = Set(classification.zero_value);
            update.deminimis_invoice = Set(classification.deminimis);
            update.updated_at = Set(Utc::now().into());
            update.update(txn).await.map_err(db_err)?;
        }

        invoice.zero_value_invoice = classification.zero_value;
        invoice.deminimis_invoice = classification.deminimis;
        result.push(invoice);
    }

    Ok(result)
}
