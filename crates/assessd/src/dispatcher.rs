//! Maps protocol requests onto the assessment runner.

use assess_exec::AssessmentRunner;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::protocol::{
    ExecuteParallelParams, GetScriptsParams, Request, Response, RunAssessmentParams,
};

/// Stateless request handler in front of an [`AssessmentRunner`].
#[derive(Clone)]
pub struct Dispatcher {
    runner: AssessmentRunner,
}

impl Dispatcher {
    pub fn new(runner: AssessmentRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &AssessmentRunner {
        &self.runner
    }

    /// Decode and handle one raw request line.
    pub async fn handle_line(&self, line: &str) -> Response {
        match decode_request(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "rejecting malformed request");
                Response::execution_error(e)
            }
        }
    }

    /// Handle one decoded request. Never fails: errors become error responses.
    pub async fn handle(&self, request: Request) -> Response {
        debug!(method = %request.method, "handling request");
        match self.dispatch(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %request.method, error = %e, "request failed");
                Response::execution_error(e)
            }
        }
    }

    async fn dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        match request.method.as_str() {
            "execute_parallel" => {
                let params: ExecuteParallelParams = request.params()?;
                let results = self.runner.execute(params.scripts).await;
                Response::result(&results)
            }
            "run_assessment" => {
                let params: RunAssessmentParams = request.params()?;
                let run = self
                    .runner
                    .run(&params.assessment_type, params.parameters)
                    .await;
                Response::result(&run)
            }
            "get_scripts" => {
                let params: GetScriptsParams = request.params()?;
                Response::result(&self.runner.scripts(&params.assessment_type))
            }
            other => {
                warn!(method = other, "unknown method");
                Ok(Response::unknown_method(other))
            }
        }
    }
}

/// Parse a request line. Only a JSON object is a request; derived struct
/// decoding alone would also take a positional array.
fn decode_request(line: &str) -> Result<Request, DispatchError> {
    let value: Value = serde_json::from_str(line).map_err(DispatchError::Decode)?;
    let kind = match value {
        object @ Value::Object(_) => return serde_json::from_value(object).map_err(DispatchError::Decode),
        Value::Array(_) => "an array",
        Value::String(_) => "a string",
        Value::Number(_) => "a number",
        Value::Bool(_) => "a boolean",
        Value::Null => "null",
    };
    Err(DispatchError::NotAnObject(kind))
}
