//! Charge line model and creation input.

pub mod types;

pub use types::{Transaction, TransactionInput};
