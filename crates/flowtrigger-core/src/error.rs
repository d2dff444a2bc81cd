//! Error taxonomy for triggering and monitoring job runs.
//!
//! Each error reports a stable caller-facing kind through `error_type()` so
//! that structured output can tell validation failures apart from backend
//! failures without parsing messages.

use crate::ids::RunId;
use crate::params::{JsonShape, TaskKind};
use serde_json::Value;

/// The job identifier could not be turned into the backend's numeric key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobIdError {
    /// Missing, empty, or whitespace-only.
    #[error("job_id is required and cannot be empty")]
    Missing,

    /// Present but not a non-negative integer.
    #[error("job_id `{value}` is not a numeric job identifier")]
    NotNumeric { value: String },
}

impl JobIdError {
    /// Finer classification recorded on rejection logs; both variants share
    /// `InvalidJobIdError`.
    pub fn sub_kind(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::NotNumeric { .. } => "not_numeric",
        }
    }
}

/// A parameter payload failed to decode or has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    /// The payload text is not valid JSON.
    #[error("{} is not valid JSON: {message}", .kind.field_name())]
    Format { kind: TaskKind, message: String },

    /// The payload decoded, but into the wrong kind of value.
    #[error("{} must be a JSON {expected}, got {actual}", .kind.field_name())]
    Shape {
        kind: TaskKind,
        expected: JsonShape,
        actual: JsonShape,
    },
}

impl ParameterError {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Format { kind, .. } | Self::Shape { kind, .. } => *kind,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Format { .. } => "ParameterFormatError",
            Self::Shape { .. } => "ParameterShapeError",
        }
    }
}

/// Validation failure raised by a trigger call before contacting the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    #[error(transparent)]
    InvalidJobId(#[from] JobIdError),

    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ParameterError),
}

impl TriggerError {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidJobId(_) => "InvalidJobIdError",
            Self::InvalidParameters(_) => "InvalidParametersError",
        }
    }

    /// Detail below [`Self::error_type`]: the job id sub-kind, or the
    /// parameter error type.
    pub fn sub_kind(&self) -> &'static str {
        match self {
            Self::InvalidJobId(err) => err.sub_kind(),
            Self::InvalidParameters(err) => err.error_type(),
        }
    }
}

/// Poll interval or wait budget is not strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: String },
}

impl PollConfigError {
    pub fn error_type(&self) -> &'static str {
        "InvalidPollConfigError"
    }
}

/// A remote call to the jobs backend failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The request never produced an HTTP response (DNS, connect, TLS, timeout).
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The backend answered with a non-success status.
    #[error(
        "backend rejected request ({status} {}): {message}",
        .error_code.as_deref().unwrap_or("unclassified")
    )]
    Api {
        status: u16,
        error_code: Option<String>,
        message: String,
        body: Option<Value>,
    },

    /// The backend answered, but the body did not match the expected shape.
    #[error("unable to decode backend response: {message}")]
    Decode { message: String },
}

impl BackendError {
    /// Coarse classification: the backend error code when one was returned,
    /// otherwise a transport-level kind.
    pub fn classification(&self) -> String {
        match self {
            Self::Transport { .. } => "TransportError".to_string(),
            Self::Api {
                error_code: Some(code),
                ..
            } => code.clone(),
            Self::Api { status, .. } => format!("HTTP_{status}"),
            Self::Decode { .. } => "DecodeError".to_string(),
        }
    }

    /// Raw error body as returned by the backend, when there was one.
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Self::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

/// One status query failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("status query for run {run_id} failed: {source}")]
pub struct PollError {
    pub run_id: RunId,
    pub source: BackendError,
}

impl PollError {
    pub fn error_type(&self) -> &'static str {
        "PollError"
    }
}

/// Errors returned by a monitor call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    InvalidConfig(#[from] PollConfigError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

impl MonitorError {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidConfig(err) => err.error_type(),
            Self::Poll(err) => err.error_type(),
        }
    }
}
