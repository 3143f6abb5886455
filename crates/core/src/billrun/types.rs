//! Bill run domain types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aquabill_shared::types::{BillRunId, RegimeId};

use super::status::BillRunStatus;
use crate::tally::Tally;

/// The charge-calculation variant a bill run operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ruleset {
    /// Pre-SROC charging rules.
    Presroc,
    /// SROC charging rules.
    Sroc,
}

impl Ruleset {
    /// Database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Presroc => "presroc",
            Self::Sroc => "sroc",
        }
    }

    /// File type marker used in transaction file references.
    #[must_use]
    pub const fn file_marker(self) -> char {
        match self {
            Self::Presroc => 'i',
            Self::Sroc => 't',
        }
    }
}

impl std::fmt::Display for Ruleset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Ruleset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "presroc" => Ok(Self::Presroc),
            "sroc" => Ok(Self::Sroc),
            other => Err(format!("unknown ruleset: {other}")),
        }
    }
}

/// One regulatory billing batch.
///
/// The tally and summary fields are maintained by the engine, never by
/// callers: the tally moves with every transaction write, the summary only
/// during a generate pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRun {
    /// Identity.
    pub id: BillRunId,
    /// Owning regime.
    pub regime_id: RegimeId,
    /// System that created the bill run.
    pub created_by: Uuid,
    /// Region code (single letter, e.g. "A").
    pub region: String,
    /// Charge-calculation variant.
    pub ruleset: Ruleset,
    /// Sequential number within the regime, used for file references.
    pub bill_run_number: i64,
    /// Lifecycle status.
    pub status: BillRunStatus,
    /// Running line aggregates.
    pub tally: Tally,
    /// Billable invoice count, valid while status is `generated` or later.
    pub invoice_count: i64,
    /// Billable invoice value (sum of absolute net totals).
    pub invoice_value: i64,
    /// Credit note count.
    pub credit_note_count: i64,
    /// Credit note value (positive magnitude).
    pub credit_note_value: i64,
    /// Transaction file reference, assigned at send time.
    pub file_reference: Option<String>,
}

impl BillRun {
    /// Returns true if no transactions have been added yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tally.is_empty()
    }

    /// Builds the transaction file reference assigned at send time.
    ///
    /// Format: `nal<region lowercased><file marker><number zero-padded to 5>`,
    /// e.g. `nalai50002` for presroc region A, bill run number 50002.
    #[must_use]
    pub fn file_reference(&self) -> String {
        format!(
            "nal{}{}{:05}",
            self.region.to_lowercase(),
            self.ruleset.file_marker(),
            self.bill_run_number
        )
    }
}
