//! Transaction repository: the tally maintainer.
//!
//! Every accepted transaction lands inside one database transaction that
//! locates (or creates) its invoice and licence, inserts the line, and moves
//! the tally at all three levels. A bill run past `initialised` drops back
//! to it with its summary zeroed, since any previous generate pass is now
//! stale.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use aquabill_core::billrun::{BillRunError, BillRunStatus};
use aquabill_core::invoice::RebilledType;
use aquabill_core::transaction::{Transaction, TransactionInput};
use aquabill_shared::types::{BillRunId, TransactionId};
use aquabill_shared::AppError;

use crate::entities::{bill_runs, invoices, licences, transactions};

use super::convert::{
    bill_run_tally, db_err, invoice_tally, licence_tally, set_bill_run_tally, set_invoice_tally,
    set_licence_tally, transaction_to_domain,
};

/// Transaction repository for charge line writes.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Accepts one charge line into a bill run.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown bill run, `Validation` when the
    /// region mismatches or the bill run is not accepting lines, `Conflict`
    /// for a duplicate client id, and `Database` on infrastructure failure.
    pub async fn create(&self, input: TransactionInput) -> Result<Transaction, AppError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let bill_run = find_bill_run(&txn, input.bill_run_id).await?;
        let status = parse_status(&bill_run)?;

        if bill_run.region != input.region {
            return Err(BillRunError::RegionMismatch {
                id: input.bill_run_id,
                expected: bill_run.region,
                actual: input.region,
            }
            .into());
        }
        if !status.is_editable() {
            return Err(BillRunError::WrongStatus {
                id: input.bill_run_id,
                status,
                action: "amended",
            }
            .into());
        }

        let invoice = find_or_create_invoice(&txn, &input).await?;
        let created = record_transaction(&txn, invoice.id, &input).await?;

        // A fresh line invalidates the previous generate pass.
        if status != BillRunStatus::Initialised {
            reset_to_initialised(&txn, bill_run.id).await?;
        }

        txn.commit().await.map_err(db_err)?;
        tracing::debug!(
            bill_run_id = %input.bill_run_id,
            transaction_id = %created.id,
            "transaction accepted"
        );
        transaction_to_domain(&created)
    }

    /// Fetches one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist.
    pub async fn find(&self, id: TransactionId) -> Result<Transaction, AppError> {
        let model = transactions::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("transaction {id}")))?;
        transaction_to_domain(&model)
    }
}

pub(crate) async fn find_bill_run(
    txn: &DatabaseTransaction,
    id: BillRunId,
) -> Result<bill_runs::Model, AppError> {
    bill_runs::Entity::find_by_id(Uuid::from(id))
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("bill run {id}")))
}

pub(crate) fn parse_status(model: &bill_runs::Model) -> Result<BillRunStatus, AppError> {
    model.status.parse().map_err(AppError::Internal)
}

/// Locates the ordinary invoice a line belongs to, creating it on first
/// sight of the `(customer_reference, financial_year)` pair.
///
/// The create side is a database-native `ON CONFLICT DO NOTHING` against the
/// invoice upsert key, so two concurrent first lines for the same customer
/// and year both land on the one surviving row instead of one of them
/// failing the whole write.
pub(crate) async fn find_or_create_invoice(
    txn: &DatabaseTransaction,
    input: &TransactionInput,
) -> Result<invoices::Model, AppError> {
    if let Some(invoice) = find_original_invoice(txn, input).await? {
        return Ok(invoice);
    }

    let now = Utc::now().into();
    let invoice = invoices::ActiveModel {
        id: Set(Uuid::now_v7()),
        bill_run_id: Set(Uuid::from(input.bill_run_id)),
        customer_reference: Set(input.customer_reference.clone()),
        financial_year: Set(input.financial_year),
        credit_line_count: Set(0),
        credit_line_value: Set(0),
        debit_line_count: Set(0),
        debit_line_value: Set(0),
        zero_line_count: Set(0),
        subject_to_minimum_charge_count: Set(0),
        subject_to_minimum_charge_credit_value: Set(0),
        subject_to_minimum_charge_debit_value: Set(0),
        zero_value_invoice: Set(false),
        deminimis_invoice: Set(false),
        minimum_charge_invoice: Set(false),
        rebilled_invoice_id: Set(None),
        rebilled_type: Set(RebilledType::O.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    // The unique index is partial (ordinary invoices only), so the conflict
    // target carries the matching predicate.
    invoices::Entity::insert(invoice)
        .on_conflict(
            OnConflict::columns([
                invoices::Column::BillRunId,
                invoices::Column::CustomerReference,
                invoices::Column::FinancialYear,
            ])
            .target_and_where(Expr::col(invoices::Column::RebilledType).eq(RebilledType::O.as_str()))
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(txn)
        .await
        .map_err(db_err)?;

    find_original_invoice(txn, input)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "invoice upsert for customer {} year {} left no row",
                input.customer_reference, input.financial_year
            ))
        })
}

async fn find_original_invoice(
    txn: &DatabaseTransaction,
    input: &TransactionInput,
) -> Result<Option<invoices::Model>, AppError> {
    invoices::Entity::find()
        .filter(invoices::Column::BillRunId.eq(Uuid::from(input.bill_run_id)))
        .filter(invoices::Column::CustomerReference.eq(input.customer_reference.clone()))
        .filter(invoices::Column::FinancialYear.eq(input.financial_year))
        .filter(invoices::Column::RebilledType.eq(RebilledType::O.as_str()))
        .one(txn)
        .await
        .map_err(db_err)
}

/// Inserts one line under an already-located invoice and moves the tally at
/// the licence, invoice, and bill run levels.
pub(crate) async fn record_transaction(
    txn: &DatabaseTransaction,
    invoice_id: Uuid,
    input: &TransactionInput,
) -> Result<transactions::Model, AppError> {
    let invoice = invoices::Entity::find_by_id(invoice_id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("invoice {invoice_id}")))?;

    let bill_run = bill_runs::Entity::find_by_id(invoice.bill_run_id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("bill run {}", invoice.bill_run_id)))?;

    let licence = find_or_create_licence(txn, &invoice, &input.licence_number).await?;

    let now = Utc::now().into();
    let line = transactions::ActiveModel {
        id: Set(Uuid::now_v7()),
        bill_run_id: Set(bill_run.id),
        invoice_id: Set(invoice.id),
        licence_id: Set(licence.id),
        regime_id: Set(Uuid::from(input.regime_id)),
        created_by: Set(input.created_by),
        client_id: Set(input.client_id.clone()),
        region: Set(input.region.clone()),
        ruleset: Set(input.ruleset.as_str().to_string()),
        customer_reference: Set(input.customer_reference.clone()),
        licence_number: Set(input.licence_number.clone()),
        financial_year: Set(input.financial_year),
        charge_value: Set(input.charge_value),
        charge_credit: Set(input.charge_credit),
        subject_to_minimum_charge: Set(input.subject_to_minimum_charge),
        minimum_charge_adjustment: Set(input.minimum_charge_adjustment),
        line_description: Set(input.line_description.clone()),
        rebilled_transaction_id: Set(input.rebilled_transaction_id.map(Uuid::from)),
        created_at: Set(now),
    };
    let created = line.insert(txn).await.map_err(db_err)?;

    let delta = input.tally_delta();

    let mut licence_totals = licence_tally(&licence);
    licence_totals.apply(&delta);
    let mut licence_update: licences::ActiveModel = licence.into();
    set_licence_tally(&mut licence_update, &licence_totals);
    licence_update.updated_at = Set(now);
    licence_update.update(txn).await.map_err(db_err)?;

    let mut invoice_totals = invoice_tally(&invoice);
    invoice_totals.apply(&delta);
    let minimum_charge_invoice = invoice.minimum_charge_invoice || input.minimum_charge_adjustment;
    let mut invoice_update: invoices::ActiveModel = invoice.into();
    set_invoice_tally(&mut invoice_update, &invoice_totals);
    invoice_update.minimum_charge_invoice = Set(minimum_charge_invoice);
    invoice_update.updated_at = Set(now);
    invoice_update.update(txn).await.map_err(db_err)?;

    let mut bill_run_totals = bill_run_tally(&bill_run);
    bill_run_totals.apply(&delta);
    let mut bill_run_update: bill_runs::ActiveModel = bill_run.into();
    set_bill_run_tally(&mut bill_run_update, &bill_run_totals);
    bill_run_update.updated_at = Set(now);
    bill_run_update.update(txn).await.map_err(db_err)?;

    Ok(created)
}

async fn find_or_create_licence(
    txn: &DatabaseTransaction,
    invoice: &invoices::Model,
    licence_number: &str,
) -> Result<licences::Model, AppError> {
    if let Some(licence) = find_licence(txn, invoice.id, licence_number).await? {
        return Ok(licence);
    }

    let now = Utc::now().into();
    let licence = licences::ActiveModel {
        id: Set(Uuid::now_v7()),
        invoice_id: Set(invoice.id),
        bill_run_id: Set(invoice.bill_run_id),
        licence_number: Set(licence_number.to_string()),
        credit_line_count: Set(0),
        credit_line_value: Set(0),
        debit_line_count: Set(0),
        debit_line_value: Set(0),
        zero_line_count: Set(0),
        subject_to_minimum_charge_count: Set(0),
        subject_to_minimum_charge_credit_value: Set(0),
        subject_to_minimum_charge_debit_value: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };

    licences::Entity::insert(licence)
        .on_conflict(
            OnConflict::columns([licences::Column::InvoiceId, licences::Column::LicenceNumber])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await
        .map_err(db_err)?;

    find_licence(txn, invoice.id, licence_number)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "licence upsert for {licence_number} on invoice {} left no row",
                invoice.id
            ))
        })
}

async fn find_licence(
    txn: &DatabaseTransaction,
    invoice_id: Uuid,
    licence_number: &str,
) -> Result<Option<licences::Model>, AppError> {
    licences::Entity::find()
        .filter(licences::Column::InvoiceId.eq(invoice_id))
        .filter(licences::Column::LicenceNumber.eq(licence_number))
        .one(txn)
        .await
        .map_err(db_err)
}

/// Drops a bill run back to `initialised` and zeroes its summary.
///
/// Every write path that moves tallies on a bill run past `initialised`
/// funnels through this, so a stale generate pass can never be approved.
pub(crate) async fn reset_to_initialised<C>(conn: &C, bill_run_id: Uuid) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    let bill_run = bill_runs::Entity::find_by_id(bill_run_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("bill run {bill_run_id}")))?;

    let mut update: bill_runs::ActiveModel = bill_run.into();
    update.status = Set(BillRunStatus::Initialised.as_str().to_string());
    update.invoice_count = Set(0);
    update.invoice_value = Set(0);
    update.credit_note_count = Set(0);
    update.credit_note_value = Set(0);
    update.updated_at = Set(Utc::now().into());
    update.update(conn).await.map_err(db_err)?;

    Ok(())
}
