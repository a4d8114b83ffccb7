//! Assessment runner core
//!
//! Shared data model for running catalogued assessment scripts in
//! priority stages:
//! - UnitSpec / ParamValue: what to launch and with which arguments
//! - ExecutionResult / StageResult / RunResult: what happened
//! - Catalog: assessment type to ordered script list, loaded once
//! - telemetry: tracing setup for the binaries

pub mod catalog;
pub mod error;
pub mod result;
pub mod telemetry;
pub mod unit;

pub use catalog::{Catalog, CatalogEntry};
pub use error::{CatalogError, Result};
pub use result::{ExecutionResult, RunResult, StageResult};
pub use telemetry::init_tracing;
pub use unit::{encode_parameters, ParamValue, ParameterSet, UnitSpec, DEFAULT_PRIORITY};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
