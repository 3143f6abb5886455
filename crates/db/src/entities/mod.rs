//! `SeaORM` entity definitions.
//!
//! Status and rebilled-type columns are stored as CHECK'd text and converted
//! to the core enums at the repository boundary.

pub mod bill_runs;
pub mod invoices;
pub mod licences;
pub mod transactions;
