//! The jobs backend seam and its request/response shapes.
//!
//! Implementations own transport and authentication. Deduplication of
//! requests that share an idempotency token is the backend's contract; its
//! window and scope are not visible to this crate.

use crate::error::BackendError;
use crate::ids::{JobId, RunId};
use crate::params::Parameters;
use crate::state::{LifecycleState, ResultState};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Remote operations the trigger client and poller need.
pub trait JobsBackend {
    /// Start one run of a job.
    fn run_now(&self, request: &RunNowRequest) -> Result<RunNowResponse, BackendError>;

    /// Fetch the current details of a run.
    fn get_run(&self, run_id: RunId) -> Result<RunDetails, BackendError>;
}

impl<T: JobsBackend + ?Sized> JobsBackend for &T {
    fn run_now(&self, request: &RunNowRequest) -> Result<RunNowResponse, BackendError> {
        (**self).run_now(request)
    }

    fn get_run(&self, run_id: RunId) -> Result<RunDetails, BackendError> {
        (**self).get_run(run_id)
    }
}

impl<T: JobsBackend + ?Sized> JobsBackend for Box<T> {
    fn run_now(&self, request: &RunNowRequest) -> Result<RunNowResponse, BackendError> {
        (**self).run_now(request)
    }

    fn get_run(&self, run_id: RunId) -> Result<RunDetails, BackendError> {
        (**self).get_run(run_id)
    }
}

/// Body of a start-run call.
///
/// Serializes only the payloads that are present, plus the idempotency token
/// when one was supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct RunNowRequest {
    pub job_id: JobId,
    pub parameters: Parameters,
    pub idempotency_token: Option<String>,
}

impl Serialize for RunNowRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 1 + self.parameters.len() + usize::from(self.idempotency_token.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("job_id", &self.job_id)?;
        for (kind, value) in self.parameters.iter() {
            map.serialize_entry(kind.field_name(), value)?;
        }
        if let Some(token) = &self.idempotency_token {
            map.serialize_entry("idempotency_token", token)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunNowResponse {
    pub run_id: RunId,
    #[serde(default)]
    pub number_in_job: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default)]
    pub life_cycle_state: Option<LifecycleState>,
    #[serde(default)]
    pub result_state: Option<ResultState>,
    #[serde(default)]
    pub state_message: Option<String>,
}

/// Run details as returned by a get-run call. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDetails {
    pub run_id: RunId,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub number_in_job: Option<u64>,
    #[serde(default)]
    pub state: Option<RunState>,
    #[serde(default)]
    pub run_page_url: Option<String>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
}
