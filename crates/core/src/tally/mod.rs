//! Incremental count/value aggregate arithmetic.
//!
//! Every transaction write applies one [`TallyDelta`] to three nesting
//! levels (licence, invoice, bill run); deletions subtract the removed
//! subtree's whole [`Tally`]. Keeping this arithmetic pure makes the
//! parent-equals-sum-of-children invariant directly testable.

pub mod types;

#[cfg(test)]
mod props;

pub use types::{Tally, TallyDelta};
