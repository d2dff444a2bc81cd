//! Caller-facing structured renderings of status queries and monitor calls.

use crate::error::PollError;
use crate::ids::RunId;
use crate::poll::MonitorOutcome;
use crate::state::RunStatus;
use serde::{Serialize, Serializer};

#[derive(Serialize)]
struct StatusStateView<'a> {
    life_cycle_state: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_state: Option<&'a str>,
    state_message: Option<&'a str>,
}

impl<'a> StatusStateView<'a> {
    fn of(status: &'a RunStatus) -> Self {
        Self {
            life_cycle_state: status.life_cycle_state.as_ref().map(|s| s.as_str()),
            result_state: status.result_state.as_ref().map(|s| s.as_str()),
            state_message: status.state_message.as_deref(),
        }
    }
}

/// Result of a single status query, success or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReport {
    Ok(RunStatus),
    Failed {
        run_id: RunId,
        error_type: String,
        error: String,
    },
}

impl StatusReport {
    pub fn from_result(run_id: RunId, result: Result<RunStatus, PollError>) -> Self {
        match result {
            Ok(status) => Self::Ok(status),
            Err(err) => Self::Failed {
                run_id,
                error_type: err.source.classification(),
                error: err.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

#[derive(Serialize)]
struct StatusOkView<'a> {
    success: bool,
    run_id: RunId,
    state: StatusStateView<'a>,
    run_page_url: Option<&'a str>,
}

#[derive(Serialize)]
struct StatusFailedView<'a> {
    success: bool,
    run_id: RunId,
    error: &'a str,
    error_type: &'a str,
    message: String,
}

impl Serialize for StatusReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ok(status) => StatusOkView {
                success: true,
                run_id: status.run_id,
                state: StatusStateView::of(status),
                run_page_url: status.run_page_url.as_deref(),
            }
            .serialize(serializer),
            Self::Failed {
                run_id,
                error_type,
                error,
            } => StatusFailedView {
                success: false,
                run_id: *run_id,
                error,
                error_type,
                message: format!("Failed to get status of run {run_id}: {error}"),
            }
            .serialize(serializer),
        }
    }
}

/// Structured rendering of a [`MonitorOutcome`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorReport {
    pub outcome: MonitorOutcome,
}

impl From<MonitorOutcome> for MonitorReport {
    fn from(outcome: MonitorOutcome) -> Self {
        Self { outcome }
    }
}

impl MonitorReport {
    pub fn outcome_name(&self) -> &'static str {
        match self.outcome {
            MonitorOutcome::Terminal { .. } => "terminal",
            MonitorOutcome::Timeout { .. } => "timeout",
            MonitorOutcome::Cancelled { .. } => "cancelled",
        }
    }

    pub fn message(&self) -> String {
        let status = self.outcome.status();
        match &self.outcome {
            MonitorOutcome::Terminal { .. } => format!(
                "Run {} completed with state {}",
                status.run_id,
                status
                    .result_state
                    .as_ref()
                    .map(|s| s.as_str())
                    .or(status.life_cycle_state.as_ref().map(|s| s.as_str()))
                    .unwrap_or("UNKNOWN")
            ),
            MonitorOutcome::Timeout { elapsed, .. } => format!(
                "Run {} did not finish within {} seconds",
                status.run_id,
                elapsed.as_secs()
            ),
            MonitorOutcome::Cancelled { .. } => {
                format!("Monitoring of run {} was cancelled", status.run_id)
            }
        }
    }
}

#[derive(Serialize)]
struct MonitorView<'a> {
    success: bool,
    outcome: &'static str,
    run_id: RunId,
    polls: u32,
    state: StatusStateView<'a>,
    run_page_url: Option<&'a str>,
    message: String,
}

impl Serialize for MonitorReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let status = self.outcome.status();
        MonitorView {
            success: self.outcome.is_terminal(),
            outcome: self.outcome_name(),
            run_id: status.run_id,
            polls: self.outcome.polls(),
            state: StatusStateView::of(status),
            run_page_url: status.run_page_url.as_deref(),
            message: self.message(),
        }
        .serialize(serializer)
    }
}
