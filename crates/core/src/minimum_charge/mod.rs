//! Minimum-charge adjustment synthesis.

pub mod service;

#[cfg(test)]
mod props;

pub use service::{MinimumChargeService, MINIMUM_CHARGE_DESCRIPTION};
