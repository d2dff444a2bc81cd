//! Blocking HTTP implementation of [`JobsBackend`].

use crate::config::WorkspaceConfig;
use flowtrigger_core::{
    BackendError, JobsBackend, RunDetails, RunId, RunNowRequest, RunNowResponse,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub const RUN_NOW_PATH: &str = "/api/2.1/jobs/run-now";
pub const GET_RUN_PATH: &str = "/api/2.1/jobs/runs/get";

#[derive(Debug, Error)]
pub enum HttpBackendError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Jobs backend speaking the Jobs 2.1 REST API over blocking HTTP.
#[derive(Debug, Clone)]
pub struct HttpJobsBackend {
    client: Client,
    config: WorkspaceConfig,
}

impl HttpJobsBackend {
    pub fn new(config: WorkspaceConfig) -> Result<Self, HttpBackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("flowtrigger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HttpBackendError::Build)?;
        Ok(Self { client, config })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| BackendError::Transport {
                message: e.to_string(),
            })?;
        let status = response.status();
        let body = response.text().map_err(|e| BackendError::Transport {
            message: e.to_string(),
        })?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| BackendError::Decode {
                message: e.to_string(),
            })
        } else {
            Err(api_error(status, &body))
        }
    }
}

impl JobsBackend for HttpJobsBackend {
    fn run_now(&self, request: &RunNowRequest) -> Result<RunNowResponse, BackendError> {
        let url = self.config.api_url(RUN_NOW_PATH);
        tracing::debug!(%url, job_id = %request.job_id, "POST run-now");
        self.execute(self.client.post(&url).json(request))
    }

    fn get_run(&self, run_id: RunId) -> Result<RunDetails, BackendError> {
        let url = self.config.api_url(GET_RUN_PATH);
        tracing::debug!(%url, run_id = %run_id, "GET runs/get");
        self.execute(self.client.get(&url).query(&[("run_id", run_id.get())]))
    }
}

/// Build an API error from a non-success response body.
///
/// Bodies of the form `{"error_code": "...", "message": "..."}` keep their
/// code; anything else is classified by HTTP status.
fn api_error(status: StatusCode, body: &str) -> BackendError {
    let parsed = serde_json::from_str::<Value>(body)
        .ok()
        .filter(Value::is_object);
    let error_code = parsed
        .as_ref()
        .and_then(|v| v.get("error_code"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    BackendError::Api {
        status: status.as_u16(),
        error_code,
        message,
        body: parsed,
    }
}
