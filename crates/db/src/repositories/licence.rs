//! Licence repository: licence-level deletion within an invoice.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::json;
use tokio::task::JoinHandle;
use uuid::Uuid;

use aquabill_core::billrun::{BillRunError, BillRunStatus};
use aquabill_core::invoice::Licence;
use aquabill_core::summary::SummaryService;
use aquabill_shared::types::{BillRunId, LicenceId};
use aquabill_shared::{AppError, Notifier};

use crate::entities::{bill_runs, invoices, licences, transactions};

use super::bill_run::set_status;
use super::convert::{
    bill_run_to_domain, db_err, invoice_to_domain, licence_to_domain, set_bill_run_tally,
    set_invoice_tally,
};
use super::transaction::parse_status;

/// Licence repository.
#[derive(Debug, Clone)]
pub struct LicenceRepository {
    db: DatabaseConnection,
}

impl LicenceRepository {
    /// Creates a new licence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetches one licence.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the licence does not exist.
    pub async fn find(&self, id: LicenceId) -> Result<Licence, AppError> {
        let model = licences::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("licence {id}")))?;
        Ok(licence_to_domain(&model))
    }

    /// Deletes one licence and its transactions, subtracting its tally from
    /// the invoice and the bill run.
    ///
    /// The surviving invoice is reclassified against the deminimis limit; an
    /// invoice left with no lines is deleted outright. The bill run holds
    /// `pending` while the cascade runs, then returns to its prior status
    /// (or `initialised` when emptied).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown licence and `Validation` when the
    /// bill run is billed or billing-not-required.
    pub async fn delete(&self, id: LicenceId, deminimis_limit: i64) -> Result<(), AppError> {
        let licence = licences::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("licence {id}")))?;
        let invoice = invoices::Entity::find_by_id(licence.invoice_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("invoice {}", licence.invoice_id)))?;
        let bill_run = bill_runs::Entity::find_by_id(licence.bill_run_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("bill run {}", licence.bill_run_id)))?;
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

        let result = self
            .delete_held(&licence, invoice, bill_run, prior_status, deminimis_limit)
            .await;
        if result.is_err() {
            // Best-effort unlock so a failed cascade does not wedge the run.
            let _ = set_status(&self.db, bill_run_id, prior_status).await;
        }
        result
    }

    /// Fire-and-forget variant of [`delete`](Self::delete).
    ///
    /// The outcome is reported through the Notifier; the handle is for
    /// lifecycle management only.
    pub fn delete_in_background(
        &self,
        id: LicenceId,
        deminimis_limit: i64,
        notifier: Arc<dyn Notifier>,
    ) -> JoinHandle<()> {
        let repo = self.clone();
        tokio::spawn(async move {
            match repo.delete(id, deminimis_limit).await {
                Ok(()) => notifier.info("licence deleted", json!({ "licenceId": id.to_string() })),
                Err(err) => notifier.error_and_notify(
                    "licence deletion failed",
                    json!({ "licenceId": id.to_string(), "error": err.to_string() }),
                ),
            }
        })
    }

    async fn delete_held(
        &self,
        licence: &licences::Model,
        invoice: invoices::Model,
        bill_run: bill_runs::Model,
        prior_status: BillRunStatus,
        deminimis_limit: i64,
    ) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let removed = licence_to_domain(licence);
        licences::Entity::delete_by_id(licence.id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let mut surviving = invoice_to_domain(&invoice)?;
        surviving.tally.remove(&removed.tally);

        if surviving.tally.is_empty() {
            invoices::Entity::delete_by_id(invoice.id)
                .exec(&txn)
                .await
                .map_err(db_err)?;
        } else {
            // The minimum-charge flag tracks surviving adjustment lines, not
            // the deleted subtree.
            let still_minimum_charge = transactions::Entity::find()
                .filter(transactions::Column::InvoiceId.eq(invoice.id))
                .filter(transactions::Column::MinimumChargeAdjustment.eq(true))
                .one(&txn)
                .await
                .map_err(db_err)?
                .is_some();
            surviving.minimum_charge_invoice = still_minimum_charge;

            let classification = SummaryService::classify_invoice(&surviving, deminimis_limit);
            let mut update: invoices::ActiveModel = invoice.into();
            set_invoice_tally(&mut update, &surviving.tally);
            update.minimum_charge_invoice = Set(still_minimum_charge);
            update.zero_value_invoice = Set(classification.zero_value);
            update.deminimis_invoice = Set(classification.deminimis);
            update.updated_at = Set(Utc::now().into());
            update.update(&txn).await.map_err(db_err)?;
        }

        let mut remaining_run = bill_run_to_domain(&bill_run)?;
        remaining_run.tally.remove(&removed.tally);

        let mut run_update: bill_runs::ActiveModel = bill_run.into();
        set_bill_run_tally(&mut run_update, &remaining_run.tally);
        if remaining_run.tally.is_empty() {
            run_update.status = Set(BillRunStatus::Initialised.as_str().to_string());
            run_update.invoice_count = Set(0);
            run_update.invoice_value = Set(0);
            run_update.credit_note_count = Set(0);
            run_update.credit_note_value = Set(0);
        } else {
            run_update.status = Set(prior_status.as_str().to_string());
        }
        run_update.updated_at = Set(Utc::now().into());
        run_update.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }
}
