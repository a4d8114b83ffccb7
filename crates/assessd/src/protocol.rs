//! Request and response messages, one JSON object per line.

use assess_core::{ParameterSet, UnitSpec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

/// Assessment type used when a request does not name one.
pub const DEFAULT_ASSESSMENT_TYPE: &str = "full";

/// An incoming request: `{"method": ..., "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,

    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// Decode `params` for `method`. Absent or null params decode as the default.
    pub fn params<T: DeserializeOwned + Default>(&self) -> Result<T, DispatchError> {
        if self.params.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.params.clone()).map_err(|source| DispatchError::InvalidParams {
            method: self.method.clone(),
            source,
        })
    }
}

/// Params of `execute_parallel`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteParallelParams {
    #[serde(default)]
    pub scripts: Vec<UnitSpec>,
}

/// Params of `run_assessment`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunAssessmentParams {
    #[serde(rename = "type", default = "default_type")]
    pub assessment_type: String,

    #[serde(default)]
    pub parameters: ParameterSet,
}

impl Default for RunAssessmentParams {
    fn default() -> Self {
        Self {
            assessment_type: default_type(),
            parameters: ParameterSet::new(),
        }
    }
}

/// Params of `get_scripts`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetScriptsParams {
    #[serde(rename = "type", default = "default_type")]
    pub assessment_type: String,
}

impl Default for GetScriptsParams {
    fn default() -> Self {
        Self {
            assessment_type: default_type(),
        }
    }
}

fn default_type() -> String {
    DEFAULT_ASSESSMENT_TYPE.to_string()
}

/// Classification attached to failed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ExecutionError,
}

/// An outgoing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// `{"result": ...}`
    Result { result: Value },

    /// `{"error": ..., "type": "execution_error"}`
    Failed {
        error: String,
        #[serde(rename = "type")]
        kind: ErrorKind,
    },

    /// `{"error": ...}`, used for unknown methods.
    Error { error: String },
}

impl Response {
    /// Wrap a payload as a result response.
    pub fn result<T: Serialize>(payload: &T) -> Result<Self, DispatchError> {
        Ok(Response::Result {
            result: serde_json::to_value(payload).map_err(DispatchError::Encode)?,
        })
    }

    pub fn unknown_method(method: &str) -> Self {
        Response::Error {
            error: format!("Unknown method: {}", method),
        }
    }

    pub fn execution_error(error: impl std::fmt::Display) -> Self {
        Response::Failed {
            error: error.to_string(),
            kind: ErrorKind::ExecutionError,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Response::Result { .. })
    }
}
