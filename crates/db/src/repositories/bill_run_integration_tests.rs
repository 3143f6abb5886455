//! Bill run lifecycle tests against a disposable Postgres instance.
//!
//! Covers the tally-maintenance write path, the generate pass, and the
//! approve/send transitions.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use aquabill_core::billrun::BillRunStatus;
use aquabill_shared::config::ChargingConfig;
use aquabill_shared::AppError;

use crate::entities::{invoices, licences, transactions};
use crate::repositories::test_support::{line, postgres, run_input};
use crate::repositories::{BillRunRepository, InvoiceRepository, TransactionRepository};

#[tokio::test]
async fn test_first_line_builds_the_hierarchy() {
    let (_pg, db) = postgres().await;
    let bill_runs = BillRunRepository::new(db.clone());
    let lines = TransactionRepository::new(db.clone());

    let run = bill_runs.create(run_input("A")).await.unwrap();
    let created = lines
        .create(line(run.id, Some("c-1"), "TH230000222", "01/123", 5000, false, false))
        .await
        .unwrap();

    let invoice = InvoiceRepository::new(db.clone())
        .find(created.invoice_id)
        .await
        .unwrap();
    assert_eq!(invoice.tally.debit_line_count, 1);
    assert_eq!(invoice.tally.debit_line_value, 5000);

    let licence_rows = licences::Entity::find()
        .filter(licences::Column::BillRunId.eq(Uuid::from(run.id)))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(licence_rows.len(), 1);
    assert_eq!(licence_rows[0].debit_line_value, 5000);

    let run = bill_runs.find(run.id).await.unwrap();
    assert_eq!(run.tally.debit_line_value, 5000);
    assert_eq!(run.status, BillRunStatus::Initialised);
}

#[tokio::test]
async fn test_lines_share_an_invoice_for_the_same_customer_and_year() {
    let (_pg, db) = postgres().await;
    let bill_runs = BillRunRepository::new(db.clone());
    let lines = TransactionRepository::new(db.clone());

    let run = bill_runs.create(run_input("A")).await.unwrap();
    lines
        .create(line(run.id, Some("c-1"), "TH230000222", "01/123", 5000, false, false))
        .await
        .unwrap();
    lines
        .create(line(run.id, Some("c-2"), "TH230000222", "01/124", 1200, true, false))
        .await
        .unwrap();

    let invoice_rows = invoices::Entity::find()
        .filter(invoices::Column::BillRunId.eq(Uuid::from(run.id)))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(invoice_rows.len(), 1);
    assert_eq!(invoice_rows[0].debit_line_value, 5000);
    assert_eq!(invoice_rows[0].credit_line_value, 1200);

    let licence_rows = licences::Entity::find()
        .filter(licences::Column::InvoiceId.eq(invoice_rows[0].id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(licence_rows.len(), 2);
}

#[tokio::test]
async fn test_duplicate_client_id_is_a_conflict() {
    let (_pg, db) = postgres().await;
    let bill_runs = BillRunRepository::new(db.clone());
    let lines = TransactionRepository::new(db.clone());

    let run = bill_runs.create(run_input("A")).await.unwrap();
    lines
        .create(line(run.id, Some("c-1"), "TH230000222", "01/123", 5000, false, false))
        .await
        .unwrap();
    let err = lines
        .create(line(run.id, Some("c-1"), "TH230000222", "01/123", 900, false, false))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let count = transactions::Entity::find()
        .filter(transactions::Column::BillRunId.eq(Uuid::from(run.id)))
        .all(&db)
        .await
        .unwrap()
        .len();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_write_to_a_generated_run_resets_the_summary() {
    let (_pg, db) = postgres().await;
    let bill_runs = BillRunRepository::new(db.clone());
    let lines = TransactionRepository::new(db.clone());

    let run = bill_runs.create(run_input("A")).await.unwrap();
    lines
        .create(line(run.id, Some("c-1"), "TH230000222", "01/123", 5000, false, false))
        .await
        .unwrap();
    let generated = bill_runs
        .generate(run.id, &ChargingConfig::default())
        .await
        .unwrap();
    assert_eq!(generated.status, BillRunStatus::Generated);
    assert_eq!(generated.invoice_count, 1);
    assert_eq!(generated.invoice_value, 5000);

    lines
        .create(line(run.id, Some("c-2"), "TH230000222", "01/123", 900, false, false))
        .await
        .unwrap();

    let run = bill_runs.find(run.id).await.unwrap();
    assert_eq!(run.status, BillRunStatus::Initialised);
    assert_eq!(run.invoice_count, 0);
    assert_eq!(run.invoice_value, 0);
    assert_eq!(run.tally.debit_line_value, 5900);
}

#[tokio::test]
async fn test_credit_offsetting_a_debit_regenerates_as_zero_value() {
    let (_pg, db) = postgres().await;
    let bill_runs = BillRunRepository::new(db.clone());
    let lines = TransactionRepository::new(db.clone());

    let run = bill_runs.create(run_input("A")).await.unwrap();
    lines
        .create(line(run.id, Some("c-1"), "TH230000222", "01/123", 5000, false, false))
        .await
        .unwrap();
    bill_runs
        .generate(run.id, &ChargingConfig::default())
        .await
        .unwrap();

    lines
        .create(line(run.id, Some("c-2"), "TH230000222", "01/123", 5000, true, false))
        .await
        .unwrap();
    let regenerated = bill_runs
        .generate(run.id, &ChargingConfig::default())
        .await
        .unwrap();

    assert_eq!(regenerated.invoice_count, 0);
    assert_eq!(regenerated.credit_note_count, 0);
    let invoice_rows = invoices::Entity::find()
        .filter(invoices::Column::BillRunId.eq(Uuid::from(run.id)))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(invoice_rows.len(), 1);
    assert!(invoice_rows[0].zero_value_invoice);
}

#[tokio::test]
async fn test_generate_tops_up_a_licence_below_the_minimum_charge() {
    let (_pg, db) = postgres().await;
    let bill_runs = BillRunRepository::new(db.clone());
    let lines = TransactionRepository::new(db.clone());

    let run = bill_runs.create(run_input("A")).await.unwrap();
    lines
        .create(line(run.id, Some("c-1"), "TH230000222", "01/123", 772, false, true))
        .await
        .unwrap();
    let generated = bill_runs
        .generate(run.id, &ChargingConfig::default())
        .await
        .unwrap();

    assert_eq!(generated.invoice_count, 1);
    assert_eq!(generated.invoice_value, 2500);

    let line_rows = transactions::Entity::find()
        .filter(transactions::Column::BillRunId.eq(Uuid::from(run.id)))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(line_rows.len(), 2);
    let top_up = line_rows
        .iter()
        .find(|t| t.minimum_charge_adjustment)
        .unwrap();
    assert_eq!(top_up.charge_value, 1728);
    assert!(top_up.client_id.is_none());
}

#[tokio::test]
async fn test_generate_on_an_empty_run_is_rejected() {
    let (_pg, db) = postgres().await;
    let bill_runs = BillRunRepository::new(db.clone());

    let run = bill_runs.create(run_input("A")).await.unwrap();
    let err = bill_runs
        .generate(run.id, &ChargingConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The busy flip never happened: the run is still open for lines.
    let run = bill_runs.find(run.id).await.unwrap();
    assert_eq!(run.status, BillRunStatus::Initialised);
}

#[tokio::test]
async fn test_send_assigns_the_file_reference() {
    let (_pg, db) = postgres().await;
    let bill_runs = BillRunRepository::new(db.clone());
    let lines = TransactionRepository::new(db.clone());

    let run = bill_runs.create(run_input("A")).await.unwrap();
    lines
        .create(line(run.id, Some("c-1"), "TH230000222", "01/123", 5000, false, false))
        .await
        .unwrap();
    bill_runs
        .generate(run.id, &ChargingConfig::default())
        .await
        .unwrap();
    let approved = bill_runs.approve(run.id).await.unwrap();
    assert_eq!(approved.status, BillRunStatus::Approved);

    let sent = bill_runs.send(run.id).await.unwrap();
    assert_eq!(sent.status, BillRunStatus::Billed);
    assert_eq!(
        sent.file_reference,
        Some(format!("nalai{:05}", sent.bill_run_number))
    );
}

#[tokio::test]
async fn test_send_with_nothing_billable_is_billing_not_required() {
    let (_pg, db) = postgres().await;
    let bill_runs = BillRunRepository::new(db.clone());
    let lines = TransactionRepository::new(db.clone());

    let run = bill_runs.create(run_input("A")).await.unwrap();
    lines
        .create(line(run.id, Some("c-1"), "TH230000222", "01/123", 0, false, false))
        .await
        .unwrap();
    bill_runs
        .generate(run.id, &ChargingConfig::default())
        .await
        .unwrap();
    bill_runs.approve(run.id).await.unwrap();

    let sent = bill_runs.send(run.id).await.unwrap();
    assert_eq!(sent.status, BillRunStatus::BillingNotRequired);
    assert_eq!(sent.file_reference, None);
}
