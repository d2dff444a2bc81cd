//! # Flowtrigger Core
//!
//! Client-side protocol for starting a remote workflow job and following the
//! resulting run until it reaches a terminal state.
//!
//! This crate is **backend-agnostic**: it does not schedule jobs, authenticate,
//! or deduplicate submissions. Those belong to the jobs backend, reached only
//! through the [`JobsBackend`] trait handed in by the caller.
//!
//! ## Architecture
//!
//! ```text
//! TriggerRequest        ← raw job id + encoded parameter payloads + token
//!     │ prepare()
//! RunNowRequest         ← numeric JobId + normalized Parameters
//!     │ TriggerClient::trigger
//! TriggerResult         ← Success{run_id, ..} | Failure{error_kind, ..}
//!     │ run_id
//! Poller::monitor       ← query → terminal? → sleep → query ...
//!     │
//! MonitorOutcome        ← Terminal | Timeout | Cancelled
//! ```
//!
//! Validation problems (job id, parameter payloads, poll configuration) are
//! returned as errors before any remote call. Remote failures while
//! triggering become a [`TriggerResult::Failure`] value; remote failures while
//! polling are returned as [`PollError`].

pub mod backend;
pub mod cancel;
pub mod error;
pub mod ids;
pub mod params;
pub mod poll;
pub mod report;
pub mod state;
pub mod trigger;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{JobsBackend, RunDetails, RunNowRequest, RunNowResponse, RunState};
pub use cancel::CancelToken;
pub use error::{
    BackendError, JobIdError, MonitorError, ParameterError, PollConfigError, PollError,
    TriggerError,
};
pub use ids::{JobId, RunId};
pub use params::{JsonShape, ParameterValue, Parameters, RawParameters, TaskKind};
pub use poll::{
    Clock, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, MonitorOutcome, PollConfig, Poller,
    SystemClock,
};
pub use report::{MonitorReport, StatusReport};
pub use state::{LifecycleState, ResultState, RunStatus};
pub use trigger::{TriggerClient, TriggerFailure, TriggerRequest, TriggerResult, TriggerSuccess};
