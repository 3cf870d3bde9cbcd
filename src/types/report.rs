use std::path::PathBuf;

use serde::Serialize;

use super::errors::ExecError;

/// How one deletion batch ended.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// Every item deleted and verified.
    Completed,
    /// The resolver (or its absence) canceled an elevation retry; the
    /// batch stopped silently.
    Canceled,
    /// A failure aborted the batch at the carried cause.
    Aborted(ExecError),
}

impl BatchOutcome {
    /// Stable label used in fact rows.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            BatchOutcome::Completed => "completed",
            BatchOutcome::Canceled => "canceled",
            BatchOutcome::Aborted(_) => "aborted",
        }
    }
}

/// Final accounting of one deletion batch, JSON-serializable for callers
/// that persist or display outcomes.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: String,
    /// Paths deleted and verified, in execution order.
    pub deleted: Vec<PathBuf>,
    pub duration_ms: u64,
    #[serde(serialize_with = "outcome_row")]
    pub outcome: BatchOutcome,
}

impl BatchReport {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Completed)
    }
}

fn outcome_row<S: serde::Serializer>(
    o: &BatchOutcome,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    match o {
        BatchOutcome::Aborted(cause) => s.serialize_str(&format!("aborted: {cause}")),
        other => s.serialize_str(other.label()),
    }
}
