//! Assessment execution
//!
//! Runs assessment units as external processes:
//! - Launches each unit and records its outcome, never failing past the unit
//! - Groups units into priority stages run strictly in order
//! - Fans out within a stage on a fixed-size worker pool
//! - Aggregates stage results into a run result

pub mod config;
pub mod error;
pub mod launcher;
pub mod pool;
pub mod runner;
pub mod scheduler;

// Re-export key types
pub use config::{ExecutorConfig, Interpreter};
pub use error::{ConfigError, LaunchError};
pub use launcher::{ProcessLauncher, UnitLauncher};
pub use pool::WorkerPool;
pub use runner::AssessmentRunner;
pub use scheduler::{group_by_priority, StageScheduler};
