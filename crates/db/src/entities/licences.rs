//! `SeaORM` Entity for the licences table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "licences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub bill_run_id: Uuid,
    pub licence_number: String,
    pub credit_line_count: i64,
    pub credit_line_value: i64,
    pub debit_line_count: i64,
    pub debit_line_value: i64,
    pub zero_line_count: i64,
    pub subject_to_minimum_charge_count: i64,
    pub subject_to_minimum_charge_credit_value: i64,
    pub subject_to_minimum_charge_debit_value: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id"
    )]
    Invoices,
    #[sea_orm(
        belongs_to = "super::bill_runs::Entity",
        from = "Column::BillRunId",
        to = "super::bill_runs::Column::Id"
    )]
    BillRuns,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::bill_runs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillRuns.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
