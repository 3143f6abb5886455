//! Conversions between `SeaORM` models and core domain types.
//!
//! Status, ruleset, and rebilled-type columns are CHECK'd text in the
//! database; a value that fails to parse indicates schema drift and is
//! surfaced as an internal error rather than a caller mistake.

use std::str::FromStr;

use sea_orm::{DbErr, Set, SqlErr};

use aquabill_core::billrun::{BillRun, BillRunStatus, Ruleset};
use aquabill_core::invoice::{Invoice, Licence, RebilledType};
use aquabill_core::tally::Tally;
use aquabill_core::transaction::Transaction;
use aquabill_shared::types::{BillRunId, InvoiceId, LicenceId, RegimeId, TransactionId};
use aquabill_shared::AppError;

use crate::entities::{bill_runs, invoices, licences, transactions};

/// Maps a database error to the shared error type.
///
/// Unique violations become conflicts so duplicate client ids and concurrent
/// upserts surface as 409-equivalents, not infrastructure failures.
pub(crate) fn db_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => AppError::Conflict(message),
        _ => AppError::Database(err.to_string()),
    }
}

fn parse_column<T>(value: &str) -> Result<T, AppError>
where
    T: FromStr<Err = String>,
{
    T::from_str(value).map_err(AppError::Internal)
}

pub(crate) fn bill_run_tally(model: &bill_runs::Model) -> Tally {
    Tally {
        credit_line_count: model.credit_line_count,
        credit_line_value: model.credit_line_value,
        debit_line_count: model.debit_line_count,
        debit_line_value: model.debit_line_value,
        zero_line_count: model.zero_line_count,
        subject_to_minimum_charge_count: model.subject_to_minimum_charge_count,
        subject_to_minimum_charge_credit_value: model.subject_to_minimum_charge_credit_value,
        subject_to_minimum_charge_debit_value: model.subject_to_minimum_charge_debit_value,
    }
}

pub(crate) fn invoice_tally(model: &invoices::Model) -> Tally {
    Tally {
        credit_line_count: model.credit_line_count,
        credit_line_value: model.credit_line_value,
        debit_line_count: model.debit_line_count,
        debit_line_value: model.debit_line_value,
        zero_line_count: model.zero_line_count,
        subject_to_minimum_charge_count: model.subject_to_minimum_charge_count,
        subject_to_minimum_charge_credit_value: model.subject_to_minimum_charge_credit_value,
        subject_to_minimum_charge_debit_value: model.subject_to_minimum_charge_debit_value,
    }
}

pub(crate) fn licence_tally(model: &licences::Model) -> Tally {
    Tally {
        credit_line_count: model.credit_line_count,
        credit_line_value: model.credit_line_value,
        debit_line_count: model.debit_line_count,
        debit_line_value: model.debit_line_value,
        zero_line_count: model.zero_line_count,
        subject_to_minimum_charge_count: model.subject_to_minimum_charge_count,
        subject_to_minimum_charge_credit_value: model.subject_to_minimum_charge_credit_value,
        subject_to_minimum_charge_debit_value: model.subject_to_minimum_charge_debit_value,
    }
}

pub(crate) fn set_bill_run_tally(model: &mut bill_runs::ActiveModel, tally: &Tally) {
    model.credit_line_count = Set(tally.credit_line_count);
    model.credit_line_value = Set(tally.credit_line_value);
    model.debit_line_count = Set(tally.debit_line_count);
    model.debit_line_value = Set(tally.debit_line_value);
    model.zero_line_count = Set(tally.zero_line_count);
    model.subject_to_minimum_charge_count = Set(tally.subject_to_minimum_charge_count);
    model.subject_to_minimum_charge_credit_value = Set(tally.subject_to_minimum_charge_credit_value);
    model.subject_to_minimum_charge_debit_value = Set(tally.subject_to_minimum_charge_debit_value);
}

pub(crate) fn set_invoice_tally(model: &mut invoices::ActiveModel, tally: &Tally) {
    model.credit_line_count = Set(tally.credit_line_count);
    model.credit_line_value = Set(tally.credit_line_value);
    model.debit_line_count = Set(tally.debit_line_count);
    model.debit_line_value = Set(tally.debit_line_value);
    model.zero_line_count = Set(tally.zero_line_count);
    model.subject_to_minimum_charge_count = Set(tally.subject_to_minimum_charge_count);
    model.subject_to_minimum_charge_credit_value = Set(tally.subject_to_minimum_charge_credit_value);
    model.subject_to_minimum_charge_debit_value = Set(tally.subject_to_minimum_charge_debit_value);
}

pub(crate) fn set_licence_tally(model: &mut licences::ActiveModel, tally: &Tally) {
    model.credit_line_count = Set(tally.credit_line_count);
    model.credit_line_value = Set(tally.credit_line_value);
    model.debit_line_count = Set(tally.debit_line_count);
    model.debit_line_value = Set(tally.debit_line_value);
    model.zero_line_count = Set(tally.zero_line_count);
    model.subject_to_minimum_charge_count = Set(tally.subject_to_minimum_charge_count);
    model.subject_to_minimum_charge_credit_value = Set(tally.subject_to_minimum_charge_credit_value);
    model.subject_to_minimum_charge_debit_value = Set(tally.subject_to_minimum_charge_debit_value);
}

pub(crate) fn bill_run_to_domain(model: &bill_runs::Model) -> Result<BillRun, AppError> {
    Ok(BillRun {
        id: BillRunId::from_uuid(model.id),
        regime_id: RegimeId::from_uuid(model.regime_id),
        created_by: model.created_by,
        region: model.region.clone(),
        ruleset: parse_column::<Ruleset>(&model.ruleset)?,
        bill_run_number: model.bill_run_number,
        status: parse_column::<BillRunStatus>(&model.status)?,
        tally: bill_run_tally(model),
        invoice_count: model.invoice_count,
        invoice_value: model.invoice_value,
        credit_note_count: model.credit_note_count,
        credit_note_value: model.credit_note_value,
        file_reference: model.file_reference.clone(),
    })
}

pub(crate) fn invoice_to_domain(model: &invoices::Model) -> Result<Invoice, AppError> {
    Ok(Invoice {
        id: InvoiceId::from_uuid(model.id),
        bill_run_id: BillRunId::from_uuid(model.bill_run_id),
        customer_reference: model.customer_reference.clone(),
        financial_year: model.financial_year,
        tally: invoice_tally(model),
        zero_value_invoice: model.zero_value_invoice,
        deminimis_invoice: model.deminimis_invoice,
        minimum_charge_invoice: model.minimum_charge_invoice,
        rebilled_invoice_id: model.rebilled_invoice_id.map(InvoiceId::from_uuid),
        rebilled_type: parse_column::<RebilledType>(&model.rebilled_type)?,
    })
}

pub(crate) fn licence_to_domain(model: &licences::Model) -> Licence {
    Licence {
        id: LicenceId::from_uuid(model.id),
        invoice_id: InvoiceId::from_uuid(model.invoice_id),
        bill_run_id: BillRunId::from_uuid(model.bill_run_id),
        licence_number: model.licence_number.clone(),
        tally: licence_tally(model),
    }
}

pub(crate) fn transaction_to_domain(model: &transactions::Model) -> Result<Transaction, AppError> {
    Ok(Transaction {
        id: TransactionId::from_uuid(model.id),
        bill_run_id: BillRunId::from_uuid(model.bill_run_id),
        invoice_id: InvoiceId::from_uuid(model.invoice_id),
        licence_id: LicenceId::from_uuid(model.licence_id),
        regime_id: RegimeId::from_uuid(model.regime_id),
        created_by: model.created_by,
        client_id: model.client_id.clone(),
        region: model.region.clone(),
        ruleset: parse_column::<Ruleset>(&model.ruleset)?,
        customer_reference: model.customer_reference.clone(),
        licence_number: model.licence_number.clone(),
        financial_year: model.financial_year,
        charge_value: model.charge_value,
        charge_credit: model.charge_credit,
        subject_to_minimum_charge: model.subject_to_minimum_charge,
        minimum_charge_adjustment: model.minimum_charge_adjustment,
        line_description: model.line_description.clone(),
        rebilled_transaction_id: model.rebilled_transaction_id.map(TransactionId::from_uuid),
    })
}
