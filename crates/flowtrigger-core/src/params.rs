//! Parameter normalization.
//!
//! A trigger call may carry up to six payloads, one per task kind, each given
//! as JSON text. Normalization decodes every present payload and checks it
//! against the shape the backend expects for that kind: an object for
//! notebook, pipeline and SQL parameters; an array for python and jar
//! parameters and dbt commands.
//!
//! Payloads are checked in declaration order and the first violation wins.
//! Absent payloads stay absent downstream: the backend distinguishes "not
//! specified" from "specified empty".

use crate::error::ParameterError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Task kind a parameter payload is addressed to.
///
/// Variant order is the declaration order used during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    Notebook,
    Python,
    Jar,
    Pipeline,
    Sql,
    Dbt,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::Notebook,
        TaskKind::Python,
        TaskKind::Jar,
        TaskKind::Pipeline,
        TaskKind::Sql,
        TaskKind::Dbt,
    ];

    /// Field name used by the backend's start-run request.
    pub fn field_name(self) -> &'static str {
        match self {
            TaskKind::Notebook => "notebook_params",
            TaskKind::Python => "python_params",
            TaskKind::Jar => "jar_params",
            TaskKind::Pipeline => "pipeline_params",
            TaskKind::Sql => "sql_params",
            TaskKind::Dbt => "dbt_commands",
        }
    }

    pub fn expected_shape(self) -> JsonShape {
        match self {
            TaskKind::Notebook | TaskKind::Pipeline | TaskKind::Sql => JsonShape::Object,
            TaskKind::Python | TaskKind::Jar | TaskKind::Dbt => JsonShape::Array,
        }
    }
}

impl Display for TaskKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Top-level shape of a decoded JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonShape {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl JsonShape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => JsonShape::Object,
            Value::Array(_) => JsonShape::Array,
            Value::String(_) => JsonShape::String,
            Value::Number(_) => JsonShape::Number,
            Value::Bool(_) => JsonShape::Boolean,
            Value::Null => JsonShape::Null,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JsonShape::Object => "object",
            JsonShape::Array => "array",
            JsonShape::String => "string",
            JsonShape::Number => "number",
            JsonShape::Boolean => "boolean",
            JsonShape::Null => "null",
        }
    }
}

impl Display for JsonShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded payload that matched its expected shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Mapping(Map<String, Value>),
    Sequence(Vec<Value>),
}

impl ParameterValue {
    pub fn shape(&self) -> JsonShape {
        match self {
            ParameterValue::Mapping(_) => JsonShape::Object,
            ParameterValue::Sequence(_) => JsonShape::Array,
        }
    }
}

/// Encoded payloads as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParameters {
    payloads: BTreeMap<TaskKind, String>,
}

impl RawParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: TaskKind, text: impl Into<String>) -> Self {
        self.payloads.insert(kind, text.into());
        self
    }

    /// Set or clear the payload for `kind`.
    pub fn set(&mut self, kind: TaskKind, text: Option<String>) {
        match text {
            Some(text) => {
                self.payloads.insert(kind, text);
            }
            None => {
                self.payloads.remove(&kind);
            }
        }
    }

    pub fn get(&self, kind: TaskKind) -> Option<&str> {
        self.payloads.get(&kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Decode and shape-check every present payload.
    ///
    /// Empty text counts as absent.
    pub fn normalize(&self) -> Result<Parameters, ParameterError> {
        let mut values = BTreeMap::new();
        for kind in TaskKind::ALL {
            let Some(text) = self.get(kind) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            values.insert(kind, normalize_payload(kind, text)?);
        }
        Ok(Parameters { values })
    }
}

/// Normalized payloads, keyed by task kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: BTreeMap<TaskKind, ParameterValue>,
}

impl Parameters {
    pub fn get(&self, kind: TaskKind) -> Option<&ParameterValue> {
        self.values.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskKind, &ParameterValue)> {
        self.values.iter().map(|(kind, value)| (*kind, value))
    }

    pub fn kinds(&self) -> Vec<TaskKind> {
        self.values.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Decode one payload and check it against the shape `kind` expects.
pub fn normalize_payload(kind: TaskKind, text: &str) -> Result<ParameterValue, ParameterError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ParameterError::Format {
        kind,
        message: e.to_string(),
    })?;

    match (kind.expected_shape(), value) {
        (JsonShape::Object, Value::Object(map)) => Ok(ParameterValue::Mapping(map)),
        (JsonShape::Array, Value::Array(items)) => Ok(ParameterValue::Sequence(items)),
        (expected, other) => Err(ParameterError::Shape {
            kind,
            expected,
            actual: JsonShape::of(&other),
        }),
    }
}
