//! `send_control` action vocabulary: `{cancel, resume, retry_failed_only}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Flip the session's cooperative-cancel flag; the running `GraphExecutor` stops
    /// before its next node and emits `session_cancelled`.
    Cancel,
    /// Reload the last checkpoint and resume the pump loop from there.
    Resume,
    /// Reload the last checkpoint, clear the `Failed`-status specialists' commands for
    /// the current round, and resume — only the specialists that did not settle
    /// cleanly re-run; completed feedback for the round is preserved untouched.
    RetryFailedOnly,
}

impl std::str::FromStr for ControlAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancel" => Ok(Self::Cancel),
            "resume" => Ok(Self::Resume),
            "retry_failed_only" => Ok(Self::RetryFailedOnly),
            other => Err(format!("unknown control action: {other}")),
        }
    }
}
