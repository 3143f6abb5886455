//! Error types for bill run operations.

use thiserror::Error;

use aquabill_shared::types::BillRunId;
use aquabill_shared::AppError;

use super::status::BillRunStatus;

/// Error types for bill run precondition checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BillRunError {
    /// The requested operation is not valid from the current status.
    #[error("Bill run {id} cannot be {action} from status '{status}'")]
    WrongStatus {
        /// The offending bill run.
        id: BillRunId,
        /// Its current status.
        status: BillRunStatus,
        /// The attempted operation, e.g. "generated".
        action: &'static str,
    },

    /// A generate pass was requested while one is already running.
    #[error("Bill run {0} is already being generated")]
    AlreadyGenerating(BillRunId),

    /// Generate was requested on a bill run with no transactions.
    #[error("Bill run {0} has no transactions and cannot be generated")]
    Empty(BillRunId),

    /// A child record's region does not match the bill run's region.
    #[error("Region '{actual}' does not match bill run {id} region '{expected}'")]
    RegionMismatch {
        /// The bill run.
        id: BillRunId,
        /// The bill run's region.
        expected: String,
        /// The offending region.
        actual: String,
    },
}

impl From<BillRunError> for AppError {
    fn from(err: BillRunError) -> Self {
        match err {
            BillRunError::AlreadyGenerating(_) => Self::Conflict(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

/// Validates that a generate pass may start.
///
/// # Errors
///
/// Returns `AlreadyGenerating` while a pass is running, `WrongStatus` for
/// any other non-generatable status, and `Empty` when the bill run has no
/// transactions.
pub fn validate_can_generate(
    id: BillRunId,
    status: BillRunStatus,
    empty: bool,
) -> Result<(), BillRunError> {
    if status == BillRunStatus::Generating {
        return Err(BillRunError::AlreadyGenerating(id));
    }
    if !status.can_generate() {
        return Err(BillRunError::WrongStatus {
            id,
            status,
            action: "generated",
        });
    }
    if empty {
        return Err(BillRunError::Empty(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_from_initialised() {
        let id = BillRunId::new();
        assert!(validate_can_generate(id, BillRunStatus::Initialised, false).is_ok());
    }

    #[test]
    fn test_generate_again_from_generated() {
        let id = BillRunId::new();
        assert!(validate_can_generate(id, BillRunStatus::Generated, false).is_ok());
    }

    #[test]
    fn test_generate_while_generating_is_conflict() {
        let id = BillRunId::new();
        let err = validate_can_generate(id, BillRunStatus::Generating, false).unwrap_err();
        assert_eq!(err, BillRunError::AlreadyGenerating(id));
        assert_eq!(AppError::from(err).status_code(), 409);
    }

    #[test]
    fn test_generate_billed_is_validation_error() {
        let id = BillRunId::new();
        let err = validate_can_generate(id, BillRunStatus::Billed, false).unwrap_err();
        assert!(matches!(err, BillRunError::WrongStatus { .. }));
        assert_eq!(AppError::from(err).status_code(), 400);
    }

    #[test]
    fn test_generate_empty_bill_run_rejected() {
        let id = BillRunId::new();
        let err = validate_can_generate(id, BillRunStatus::Initialised, true).unwrap_err();
        assert_eq!(err, BillRunError::Empty(id));
    }

    #[test]
    fn test_error_message_references_id_and_status() {
        let id = BillRunId::new();
        let err = validate_can_generate(id, BillRunStatus::Approved, false).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&id.to_string()));
        assert!(message.contains("approved"));
    }
}
