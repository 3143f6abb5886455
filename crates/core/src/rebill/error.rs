//! Error types for rebilling precondition checks.

use thiserror::Error;

use aquabill_shared::types::{BillRunId, InvoiceId};
use aquabill_shared::AppError;

use crate::billrun::BillRunStatus;
use crate::invoice::RebilledType;

/// Error types raised while validating a rebilling request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RebillError {
    /// The source invoice's bill run has not been billed yet.
    #[error("Invoice {invoice} cannot be rebilled: its bill run has status '{status}'")]
    SourceNotBilled {
        /// The source invoice.
        invoice: InvoiceId,
        /// The source bill run's status.
        status: BillRunStatus,
    },

    /// The source invoice is itself half of an earlier rebilling pair.
    #[error("Invoice {invoice} is a '{rebilled_type}' invoice and cannot be rebilled")]
    NotOriginal {
        /// The source invoice.
        invoice: InvoiceId,
        /// Its rebilling role.
        rebilled_type: RebilledType,
    },

    /// The source invoice already has a cancel/rebill pair.
    #[error("Invoice {0} has already been rebilled")]
    AlreadyRebilled(InvoiceId),

    /// The target bill run's region does not match the source invoice's.
    #[error(
        "Invoice {invoice} region '{source_region}' does not match \
         bill run {bill_run} region '{target_region}'"
    )]
    RegionMismatch {
        /// The source invoice.
        invoice: InvoiceId,
        /// Region the source charges were raised in.
        source_region: String,
        /// The target bill run.
        bill_run: BillRunId,
        /// The target bill run's region.
        target_region: String,
    },

    /// The target bill run can no longer accept new invoices.
    #[error("Bill run {bill_run} cannot accept rebilled invoices from status '{status}'")]
    TargetNotEditable {
        /// The target bill run.
        bill_run: BillRunId,
        /// Its current status.
        status: BillRunStatus,
    },
}

impl From<RebillError> for AppError {
    fn from(err: RebillError) -> Self {
        match err {
            RebillError::AlreadyRebilled(_) => Self::Conflict(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
