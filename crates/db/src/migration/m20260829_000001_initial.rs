//! Initial database migration.
//!
//! Creates the bill run ownership chain (bill_runs -> invoices -> licences,
//! transactions referencing all three) with cascading deletes, the unique
//! constraints the upsert paths rely on, and the bill run number sequence.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(SEQUENCES_SQL).await?;
        db.execute_unprepared(BILL_RUNS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(LICENCES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(INDEXES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const SEQUENCES_SQL: &str = r"
-- Sequential bill run numbers feed transaction file references
CREATE SEQUENCE bill_run_number_seq START WITH 50000;
";

const BILL_RUNS_SQL: &str = r"
CREATE TABLE bill_runs (
    id UUID PRIMARY KEY,
    regime_id UUID NOT NULL,
    created_by UUID NOT NULL,
    region VARCHAR(1) NOT NULL,
    ruleset TEXT NOT NULL CHECK (ruleset IN ('presroc', 'sroc')),
    bill_run_number BIGINT NOT NULL DEFAULT nextval('bill_run_number_seq'),
    status TEXT NOT NULL DEFAULT 'initialised' CHECK (status IN (
        'initialised',
        'pending',
        'generating',
        'generated',
        'approved',
        'sending',
        'billed',
        'billing_not_required',
        'deleting'
    )),
    credit_line_count BIGINT NOT NULL DEFAULT 0,
    credit_line_value BIGINT NOT NULL DEFAULT 0,
    debit_line_count BIGINT NOT NULL DEFAULT 0,
    debit_line_value BIGINT NOT NULL DEFAULT 0,
    zero_line_count BIGINT NOT NULL DEFAULT 0,
    subject_to_minimum_charge_count BIGINT NOT NULL DEFAULT 0,
    subject_to_minimum_charge_credit_value BIGINT NOT NULL DEFAULT 0,
    subject_to_minimum_charge_debit_value BIGINT NOT NULL DEFAULT 0,
    invoice_count BIGINT NOT NULL DEFAULT 0,
    invoice_value BIGINT NOT NULL DEFAULT 0,
    credit_note_count BIGINT NOT NULL DEFAULT 0,
    credit_note_value BIGINT NOT NULL DEFAULT 0,
    file_reference TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    bill_run_id UUID NOT NULL REFERENCES bill_runs(id) ON DELETE CASCADE,
    customer_reference TEXT NOT NULL,
    financial_year INTEGER NOT NULL,
    credit_line_count BIGINT NOT NULL DEFAULT 0,
    credit_line_value BIGINT NOT NULL DEFAULT 0,
    debit_line_count BIGINT NOT NULL DEFAULT 0,
    debit_line_value BIGINT NOT NULL DEFAULT 0,
    zero_line_count BIGINT NOT NULL DEFAULT 0,
    subject_to_minimum_charge_count BIGINT NOT NULL DEFAULT 0,
    subject_to_minimum_charge_credit_value BIGINT NOT NULL DEFAULT 0,
    subject_to_minimum_charge_debit_value BIGINT NOT NULL DEFAULT 0,
    zero_value_invoice BOOLEAN NOT NULL DEFAULT FALSE,
    deminimis_invoice BOOLEAN NOT NULL DEFAULT FALSE,
    minimum_charge_invoice BOOLEAN NOT NULL DEFAULT FALSE,
    rebilled_invoice_id UUID,
    rebilled_type TEXT NOT NULL DEFAULT 'O' CHECK (rebilled_type IN ('O', 'C', 'R')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Rebill pairs share the original's customer and year within the target
-- bill run, so uniqueness only binds ordinary invoices
CREATE UNIQUE INDEX invoices_upsert_key
    ON invoices (bill_run_id, customer_reference, financial_year)
    WHERE rebilled_type = 'O';
";

const LICENCES_SQL: &str = r"
CREATE TABLE licences (
    id UUID PRIMARY KEY,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    bill_run_id UUID NOT NULL REFERENCES bill_runs(id) ON DELETE CASCADE,
    licence_number TEXT NOT NULL,
    credit_line_count BIGINT NOT NULL DEFAULT 0,
    credit_line_value BIGINT NOT NULL DEFAULT 0,
    debit_line_count BIGINT NOT NULL DEFAULT 0,
    debit_line_value BIGINT NOT NULL DEFAULT 0,
    zero_line_count BIGINT NOT NULL DEFAULT 0,
    subject_to_minimum_charge_count BIGINT NOT NULL DEFAULT 0,
    subject_to_minimum_charge_credit_value BIGINT NOT NULL DEFAULT 0,
    subject_to_minimum_charge_debit_value BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT licences_upsert_key UNIQUE (invoice_id, licence_number)
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    bill_run_id UUID NOT NULL REFERENCES bill_runs(id) ON DELETE CASCADE,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    licence_id UUID NOT NULL REFERENCES licences(id) ON DELETE CASCADE,
    regime_id UUID NOT NULL,
    created_by UUID NOT NULL,
    client_id TEXT,
    region VARCHAR(1) NOT NULL,
    ruleset TEXT NOT NULL CHECK (ruleset IN ('presroc', 'sroc')),
    customer_reference TEXT NOT NULL,
    licence_number TEXT NOT NULL,
    financial_year INTEGER NOT NULL,
    charge_value BIGINT NOT NULL,
    charge_credit BOOLEAN NOT NULL,
    subject_to_minimum_charge BOOLEAN NOT NULL DEFAULT FALSE,
    minimum_charge_adjustment BOOLEAN NOT NULL DEFAULT FALSE,
    line_description TEXT NOT NULL,
    rebilled_transaction_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Client-assigned ids deduplicate retried submissions per bill run
CREATE UNIQUE INDEX transactions_client_id_key
    ON transactions (bill_run_id, client_id)
    WHERE client_id IS NOT NULL;
";

const INDEXES_SQL: &str = r"
CREATE INDEX invoices_bill_run_id_idx ON invoices (bill_run_id);
CREATE INDEX licences_invoice_id_idx ON licences (invoice_id);
CREATE INDEX licences_bill_run_id_idx ON licences (bill_run_id);
CREATE INDEX transactions_bill_run_id_idx ON transactions (bill_run_id);
CREATE INDEX transactions_invoice_id_idx ON transactions (invoice_id);
CREATE INDEX transactions_licence_id_idx ON transactions (licence_id);
CREATE INDEX invoices_rebilled_invoice_id_idx ON invoices (rebilled_invoice_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS licences CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS bill_runs CASCADE;
DROP SEQUENCE IF EXISTS bill_run_number_seq;
";
