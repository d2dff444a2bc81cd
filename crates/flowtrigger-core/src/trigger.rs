//! Job trigger client.
//!
//! `trigger` validates the request, issues one start-run call, then one
//! get-run call to pick up lifecycle state and the run page URL. Remote
//! failures never escape as errors: they are folded into
//! [`TriggerResult::Failure`] so an automated caller always receives a
//! parseable outcome. Validation failures are returned as [`TriggerError`]
//! before the backend is contacted.

use crate::backend::{JobsBackend, RunNowRequest};
use crate::error::{BackendError, TriggerError};
use crate::ids::{JobId, RunId};
use crate::params::{RawParameters, TaskKind};
use crate::state::{LifecycleState, RunStatus};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// One trigger call as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerRequest {
    pub job_id: String,
    pub parameters: RawParameters,
    /// Forwarded verbatim; never generated here.
    pub idempotency_token: Option<String>,
}

impl TriggerRequest {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, kind: TaskKind, text: impl Into<String>) -> Self {
        self.parameters = self.parameters.with(kind, text);
        self
    }

    pub fn with_idempotency_token(mut self, token: impl Into<String>) -> Self {
        self.idempotency_token = Some(token.into());
        self
    }

    /// Validate the job id, then normalize parameters. Rejections are logged
    /// here so every caller reports them the same way.
    pub fn prepare(&self) -> Result<RunNowRequest, TriggerError> {
        self.validate().inspect_err(|err| {
            tracing::warn!(
                job_id = %self.job_id,
                error_type = err.error_type(),
                sub_kind = err.sub_kind(),
                error = %err,
                "trigger request rejected before submission"
            );
        })
    }

    fn validate(&self) -> Result<RunNowRequest, TriggerError> {
        let job_id = JobId::parse(&self.job_id)?;
        let parameters = self.parameters.normalize()?;
        Ok(RunNowRequest {
            job_id,
            parameters,
            idempotency_token: self.idempotency_token.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerResult {
    Success(TriggerSuccess),
    Failure(TriggerFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSuccess {
    pub job_id: String,
    pub run_id: RunId,
    pub number_in_job: Option<u64>,
    pub life_cycle_state: Option<LifecycleState>,
    pub state_message: Option<String>,
    pub run_page_url: Option<String>,
    /// Epoch milliseconds.
    pub start_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerFailure {
    pub job_id: String,
    /// Set when the run was started but its details could not be fetched.
    pub run_id: Option<RunId>,
    pub error_kind: String,
    pub message: String,
    pub raw_error: Option<Value>,
}

impl TriggerResult {
    /// Render a validation failure in the same structured form as a remote
    /// failure.
    pub fn from_error(job_id: &str, err: &TriggerError) -> Self {
        Self::Failure(TriggerFailure {
            job_id: job_id.to_string(),
            run_id: None,
            error_kind: err.error_type().to_string(),
            message: err.to_string(),
            raw_error: None,
        })
    }

    fn from_backend_error(job_id: &str, run_id: Option<RunId>, err: &BackendError) -> Self {
        Self::Failure(TriggerFailure {
            job_id: job_id.to_string(),
            run_id,
            error_kind: err.classification(),
            message: err.to_string(),
            raw_error: err.raw().cloned(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn run_id(&self) -> Option<RunId> {
        match self {
            Self::Success(success) => Some(success.run_id),
            Self::Failure(failure) => failure.run_id,
        }
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        match self {
            Self::Success(success) => format!(
                "Successfully triggered job {}. Run ID: {}",
                success.job_id, success.run_id
            ),
            Self::Failure(failure) => {
                format!("Failed to trigger job {}: {}", failure.job_id, failure.message)
            }
        }
    }
}

#[derive(Serialize)]
struct StateView<'a> {
    life_cycle_state: Option<&'a str>,
    state_message: Option<&'a str>,
}

#[derive(Serialize)]
struct SuccessView<'a> {
    success: bool,
    run_id: RunId,
    number_in_job: Option<u64>,
    job_id: &'a str,
    state: StateView<'a>,
    run_page_url: Option<&'a str>,
    start_time: Option<i64>,
    message: String,
}

#[derive(Serialize)]
struct FailureView<'a> {
    success: bool,
    job_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<RunId>,
    error: &'a str,
    error_type: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_error: Option<&'a Value>,
}

impl Serialize for TriggerResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(success) => SuccessView {
                success: true,
                run_id: success.run_id,
                number_in_job: success.number_in_job,
                job_id: &success.job_id,
                state: StateView {
                    life_cycle_state: success
                        .life_cycle_state
                        .as_ref()
                        .map(LifecycleState::as_str),
                    state_message: success.state_message.as_deref(),
                },
                run_page_url: success.run_page_url.as_deref(),
                start_time: success.start_time,
                message: self.summary(),
            }
            .serialize(serializer),
            Self::Failure(failure) => FailureView {
                success: false,
                job_id: &failure.job_id,
                run_id: failure.run_id,
                error: &failure.message,
                error_type: &failure.error_kind,
                message: self.summary(),
                raw_error: failure.raw_error.as_ref(),
            }
            .serialize(serializer),
        }
    }
}

/// Starts job runs through an injected backend.
#[derive(Debug, Clone)]
pub struct TriggerClient<B> {
    backend: B,
}

impl<B: JobsBackend> TriggerClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Validate `request` and start one run.
    pub fn trigger(&self, request: &TriggerRequest) -> Result<TriggerResult, TriggerError> {
        let run_now = request.prepare()?;
        Ok(self.submit(&run_now))
    }

    /// Submit an already validated request.
    pub fn submit(&self, request: &RunNowRequest) -> TriggerResult {
        let job_id = request.job_id.to_string();
        tracing::info!(
            job_id = %request.job_id,
            parameters = ?request.parameters.kinds(),
            idempotent = request.idempotency_token.is_some(),
            "triggering job run"
        );

        let started = match self.backend.run_now(request) {
            Ok(started) => started,
            Err(err) => {
                tracing::warn!(
                    job_id = %request.job_id,
                    error_type = %err.classification(),
                    error = %err,
                    "start-run call failed"
                );
                return TriggerResult::from_backend_error(&job_id, None, &err);
            }
        };

        let details = match self.backend.get_run(started.run_id) {
            Ok(details) => details,
            Err(err) => {
                tracing::warn!(
                    job_id = %request.job_id,
                    run_id = %started.run_id,
                    error = %err,
                    "run started but details could not be fetched"
                );
                return TriggerResult::from_backend_error(&job_id, Some(started.run_id), &err);
            }
        };

        let status = RunStatus::from_details(&details);
        tracing::info!(
            job_id = %request.job_id,
            run_id = %started.run_id,
            life_cycle_state = status.life_cycle_state.as_ref().map(LifecycleState::as_str),
            "job run started"
        );

        TriggerResult::Success(TriggerSuccess {
            job_id,
            run_id: started.run_id,
            number_in_job: started.number_in_job.or(details.number_in_job),
            life_cycle_state: status.life_cycle_state,
            state_message: status.state_message,
            run_page_url: status.run_page_url,
            start_time: details.start_time,
        })
    }
}
