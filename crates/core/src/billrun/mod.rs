//! Bill run model, status machine, and validation.

pub mod error;
pub mod status;
pub mod types;

pub use error::{validate_can_generate, BillRunError};
pub use status::BillRunStatus;
pub use types::{BillRun, Ruleset};
