//! Run lifecycle and result states.

use crate::backend::RunDetails;
use crate::ids::RunId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Coarse execution phase of a run.
///
/// Unknown values are kept verbatim in `Other` and treated as non-terminal,
/// since the backend may add phases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleState {
    Pending,
    Queued,
    Running,
    Terminating,
    Terminated,
    Skipped,
    InternalError,
    Blocked,
    WaitingForRetry,
    Other(String),
}

impl LifecycleState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Terminating => "TERMINATING",
            Self::Terminated => "TERMINATED",
            Self::Skipped => "SKIPPED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Blocked => "BLOCKED",
            Self::WaitingForRetry => "WAITING_FOR_RETRY",
            Self::Other(raw) => raw,
        }
    }

    /// No further transitions happen after a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::Skipped | Self::InternalError)
    }
}

impl From<&str> for LifecycleState {
    fn from(raw: &str) -> Self {
        match raw {
            "PENDING" => Self::Pending,
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "TERMINATING" => Self::Terminating,
            "TERMINATED" => Self::Terminated,
            "SKIPPED" => Self::Skipped,
            "INTERNAL_ERROR" => Self::InternalError,
            "BLOCKED" => Self::Blocked,
            "WAITING_FOR_RETRY" => Self::WaitingForRetry,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for LifecycleState {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a run that has finished.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResultState {
    Success,
    SuccessWithFailures,
    Failed,
    Timedout,
    Canceled,
    MaximumConcurrentRunsReached,
    Excluded,
    UpstreamFailed,
    UpstreamCanceled,
    Other(String),
}

impl ResultState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::SuccessWithFailures => "SUCCESS_WITH_FAILURES",
            Self::Failed => "FAILED",
            Self::Timedout => "TIMEDOUT",
            Self::Canceled => "CANCELED",
            Self::MaximumConcurrentRunsReached => "MAXIMUM_CONCURRENT_RUNS_REACHED",
            Self::Excluded => "EXCLUDED",
            Self::UpstreamFailed => "UPSTREAM_FAILED",
            Self::UpstreamCanceled => "UPSTREAM_CANCELED",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<&str> for ResultState {
    fn from(raw: &str) -> Self {
        match raw {
            "SUCCESS" => Self::Success,
            "SUCCESS_WITH_FAILURES" => Self::SuccessWithFailures,
            "FAILED" => Self::Failed,
            "TIMEDOUT" => Self::Timedout,
            "CANCELED" => Self::Canceled,
            "MAXIMUM_CONCURRENT_RUNS_REACHED" => Self::MaximumConcurrentRunsReached,
            "EXCLUDED" => Self::Excluded,
            "UPSTREAM_FAILED" => Self::UpstreamFailed,
            "UPSTREAM_CANCELED" => Self::UpstreamCanceled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ResultState {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<ResultState> for String {
    fn from(state: ResultState) -> Self {
        match state {
            ResultState::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for ResultState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a run's state from one status query. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    pub run_id: RunId,
    pub life_cycle_state: Option<LifecycleState>,
    pub result_state: Option<ResultState>,
    pub state_message: Option<String>,
    pub run_page_url: Option<String>,
}

impl RunStatus {
    pub fn from_details(details: &RunDetails) -> Self {
        let state = details.state.clone().unwrap_or_default();
        Self {
            run_id: details.run_id,
            life_cycle_state: state.life_cycle_state,
            result_state: state.result_state,
            state_message: state.state_message.filter(|m| !m.is_empty()),
            run_page_url: details.run_page_url.clone(),
        }
    }

    /// A missing lifecycle state is not terminal.
    pub fn is_terminal(&self) -> bool {
        self.life_cycle_state
            .as_ref()
            .is_some_and(LifecycleState::is_terminal)
    }
}
