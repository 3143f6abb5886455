//! `SeaORM` Entity for the bill_runs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bill_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub regime_id: Uuid,
    pub created_by: Uuid,
    pub region: String,
    pub ruleset: String,
    pub bill_run_number: i64,
    pub status: String,
    pub credit_line_count: i64,
    pub credit_line_value: i64,
    pub debit_line_count: i64,
    pub debit_line_value: i64,
    pub zero_line_count: i64,
    pub subject_to_minimum_charge_count: i64,
    pub subject_to_minimum_charge_credit_value: i64,
    pub subject_to_minimum_charge_debit_value: i64,
    pub invoice_count: i64,
    pub invoice_value: i64,
    pub credit_note_count: i64,
    pub credit_note_value: i64,
    pub file_reference: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
    #[sea_orm(has_many = "super::licences::Entity")]
    Licences,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::licences::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Licences.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
