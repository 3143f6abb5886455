//! Core charging engine for Aquabill.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, tally arithmetic, and charging rules live
//! here; persistence is the `aquabill-db` crate's job.
//!
//! # Modules
//!
//! - `billrun` - Bill run model, status machine, and validation
//! - `invoice` - Invoice and licence aggregates with classification flags
//! - `transaction` - Charge line model and creation input
//! - `tally` - Incremental count/value aggregate arithmetic
//! - `minimum_charge` - Minimum-charge adjustment synthesis
//! - `summary` - Invoice classification and bill-run summarization
//! - `rebill` - Cancel/rebill invoice pair planning

pub mod billrun;
pub mod invoice;
pub mod minimum_charge;
pub mod rebill;
pub mod summary;
pub mod tally;
pub mod transaction;
