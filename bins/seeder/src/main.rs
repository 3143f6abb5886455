//! Database seeder for Aquabill development and testing.
//!
//! Seeds a demo bill run with a handful of transactions covering the
//! interesting cases (debits, a credit, a zero-value line, and a
//! minimum-charge line), then runs a generate pass over it.
//!
//! Usage: cargo run --bin seeder

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use aquabill_core::billrun::Ruleset;
use aquabill_core::transaction::TransactionInput;
use aquabill_db::repositories::{BillRunRepository, CreateBillRunInput, TransactionRepository};
use aquabill_shared::config::ChargingConfig;
use aquabill_shared::types::{BillRunId, RegimeId};

/// Demo regime ID (consistent for all seeds)
const DEMO_REGIME_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo system user ID (consistent for all seeds)
const DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000002";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aquabill=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = aquabill_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let bill_runs = BillRunRepository::new(db.clone());
    let transactions = TransactionRepository::new(db);

    println!("Seeding demo bill run...");
    let bill_run = bill_runs
        .create(CreateBillRunInput {
            regime_id: demo_regime_id(),
            created_by: demo_user_id(),
            region: "A".to_string(),
            ruleset: Ruleset::Presroc,
        })
        .await
        .expect("Failed to create bill run");
    println!(
        "  Created bill run {} (number {})",
        bill_run.id, bill_run.bill_run_number
    );

    println!("Seeding demo transactions...");
    for (client_id, licence_number, charge_value, charge_credit, minimum_charge) in demo_lines() {
        let line = TransactionInput {
            bill_run_id: bill_run.id,
            regime_id: demo_regime_id(),
            created_by: demo_user_id(),
            client_id: Some(client_id.to_string()),
            region: "A".to_string(),
            ruleset: Ruleset::Presroc,
            customer_reference: "TH230000222".to_string(),
            licence_number: licence_number.to_string(),
            financial_year: 2022,
            charge_value,
            charge_credit,
            subject_to_minimum_charge: minimum_charge,
            minimum_charge_adjustment: false,
            line_description: "Well at Chigley Town Hall".to_string(),
            rebilled_transaction_id: None,
        };
        let created = transactions
            .create(line)
            .await
            .expect("Failed to create transaction");
        println!("  Created transaction {} ({client_id})", created.id);
    }

    println!("Running generate pass...");
    let generated = generate(&bill_runs, bill_run.id).await;
    println!(
        "  Bill run {} generated: {} invoice(s) worth {}p, {} credit note(s) worth {}p",
        generated.id,
        generated.invoice_count,
        generated.invoice_value,
        generated.credit_note_count,
        generated.credit_note_value
    );

    println!("Seeding complete!");
}

fn demo_regime_id() -> RegimeId {
    RegimeId::from_uuid(Uuid::parse_str(DEMO_REGIME_ID).unwrap())
}

fn demo_user_id() -> Uuid {
    Uuid::parse_str(DEMO_USER_ID).unwrap()
}

/// (client id, licence number, charge value, credit?, subject to minimum charge?)
fn demo_lines() -> Vec<(&'static str, &'static str, i64, bool, bool)> {
    vec![
        ("seed-0001", "01/123", 5000, false, false),
        ("seed-0002", "01/123", 1200, true, false),
        ("seed-0003", "01/124", 772, false, true),
        ("seed-0004", "01/125", 0, false, false),
        ("seed-0005", "01/126", 90000, false, false),
    ]
}

async fn generate(
    bill_runs: &BillRunRepository,
    id: BillRunId,
) -> aquabill_core::billrun::BillRun {
    bill_runs
        .generate(id, &ChargingConfig::default())
        .await
        .expect("Failed to generate bill run")
}
