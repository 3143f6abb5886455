//! Bill run status state machine.
//!
//! ```text
//! initialised -> generating -> generated -> approved -> sending -> billed
//! ```
//!
//! `pending` and `deleting` are transient lock states reachable from
//! multiple points; `billing_not_required` is the alternate terminal state
//! for a sent bill run with nothing billable. Statuses double as advisory
//! locks: callers check them before mutating, and multi-step operations
//! hold a transient status for their duration.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a bill run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillRunStatus {
    /// Accepting transactions; summary fields are stale or empty.
    Initialised,
    /// Transient lock while a multi-step edit (delete, rebill) runs.
    Pending,
    /// Generate pass in progress.
    Generating,
    /// Summarized; aggregates and classification flags are current.
    Generated,
    /// Approved for sending.
    Approved,
    /// Transaction file assembly in progress.
    Sending,
    /// Sent to the downstream billing system (terminal).
    Billed,
    /// Sent but nothing was billable (terminal).
    BillingNotRequired,
    /// Transient lock while a cascade delete runs.
    Deleting,
}

impl BillRunStatus {
    /// Returns true if a generate pass may start from this status.
    #[must_use]
    pub const fn can_generate(self) -> bool {
        matches!(self, Self::Initialised | Self::Generated)
    }

    /// Returns true if the bill run can be approved.
    #[must_use]
    pub const fn can_approve(self) -> bool {
        matches!(self, Self::Generated)
    }

    /// Returns true if the bill run can be sent.
    #[must_use]
    pub const fn can_send(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Returns true if the bill run (or its children) can be deleted.
    #[must_use]
    pub const fn can_delete(self) -> bool {
        !matches!(self, Self::Billed | Self::BillingNotRequired)
    }

    /// Returns true if new transactions may be added.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Initialised | Self::Generated)
    }

    /// Returns true if the status is a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Billed | Self::BillingNotRequired)
    }

    /// Returns true while a multi-step operation holds the bill run.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Generating | Self::Sending | Self::Deleting
        )
    }

    /// Database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialised => "initialised",
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Generated => "generated",
            Self::Approved => "approved",
            Self::Sending => "sending",
            Self::Billed => "billed",
            Self::BillingNotRequired => "billing_not_required",
            Self::Deleting => "deleting",
        }
    }
}

impl std::fmt::Display for BillRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BillRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initialised" => Ok(Self::Initialised),
            "pending" => Ok(Self::Pending),
            "generating" => Ok(Self::Generating),
            "generated" => Ok(Self::Generated),
            "approved" => Ok(Self::Approved),
            "sending" => Ok(Self::Sending),
            "billed" => Ok(Self::Billed),
            "billing_not_required" => Ok(Self::BillingNotRequired),
            "deleting" => Ok(Self::Deleting),
            other => Err(format!("unknown bill run status: {other}")),
        }
    }
}
