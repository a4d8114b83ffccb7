//! assessd - request front end for the assessment runner
//!
//! Reads one JSON request per line and answers each with one JSON response
//! line. Supported methods:
//! - `execute_parallel`: run a caller-supplied script list in priority stages
//! - `run_assessment`: run a catalogued assessment type with parameters
//! - `get_scripts`: list a catalogued assessment type without running it

pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod server;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use protocol::{Request, Response, DEFAULT_ASSESSMENT_TYPE};
pub use server::{serve, serve_with_limit, MAX_LINE_BYTES};
