//! Invoice and licence aggregates.

pub mod types;

pub use types::{Invoice, Licence, RebilledType};
