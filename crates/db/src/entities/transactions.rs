//! `SeaORM` Entity for the transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bill_run_id: Uuid,
    pub invoice_id: Uuid,
    pub licence_id: Uuid,
    pub regime_id: Uuid,
    pub created_by: Uuid,
    pub client_id: Option<String>,
    pub region: String,
    pub ruleset: String,
    pub customer_reference: String,
    pub licence_number: String,
    pub financial_year: i32,
    pub charge_value: i64,
    pub charge_credit: bool,
    pub subject_to_minimum_charge: bool,
    pub minimum_charge_adjustment: bool,
    pub line_description: String,
    pub rebilled_transaction_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bill_runs::Entity",
        from = "Column::BillRunId",
        to = "super::bill_runs::Column::Id"
    )]
    BillRuns,
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id"
    )]
    Invoices,
    #[sea_orm(
        belongs_to = "super::licences::Entity",
        from = "Column::LicenceId",
        to = "super::licences::Column::Id"
    )]
    Licences,
}

impl Related<super::bill_runs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillRuns.def()
    }
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

impl ActiveModelBehavior for ActiveModel {}
