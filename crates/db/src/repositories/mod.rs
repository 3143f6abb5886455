//! Repository abstractions for data access.
//!
//! Repositories own the multi-row database transactions: every operation
//! that touches more than one row (tally maintenance, generate, delete
//! cascades, rebilling) begins and commits its own transaction.

pub mod bill_run;
pub mod invoice;
pub mod licence;
pub mod transaction;

mod convert;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod bill_run_integration_tests;

pub use bill_run::{BillRunRepository, CreateBillRunInput};
pub use invoice::InvoiceRepository;
pub use licence::LicenceRepository;
pub use transaction::TransactionRepository;
