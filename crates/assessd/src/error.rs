//! Errors raised while handling a single request.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("invalid request: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid request: expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("request line exceeds {0} bytes")]
    LineTooLong(u64),

    #[error("request is not valid UTF-8")]
    Utf8,

    #[error("invalid params for {method}: {source}")]
    InvalidParams {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}
