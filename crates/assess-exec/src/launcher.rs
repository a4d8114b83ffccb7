//! Unit launching: one external process per unit, outcome always recorded.

use assess_core::{ExecutionResult, UnitSpec};
use async_trait::async_trait;
use chrono::Utc;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{ExecutorConfig, Interpreter};
use crate::error::LaunchError;

/// Launches a single unit and reports its outcome.
///
/// Implementations must not fail: every problem becomes an unsuccessful
/// [`ExecutionResult`], so one unit can never abort its siblings.
#[async_trait]
pub trait UnitLauncher: Send + Sync {
    async fn launch(&self, unit: &UnitSpec) -> ExecutionResult;
}

/// Runs units as child processes.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    interpreter: Option<Interpreter>,
    unit_timeout: Option<std::time::Duration>,
    working_dir: Option<std::path::PathBuf>,
}

impl ProcessLauncher {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            unit_timeout: config.unit_timeout,
            working_dir: config.working_dir.clone(),
        }
    }

    /// Program and argument vector for `unit`.
    pub fn command_line(&self, unit: &UnitSpec) -> (String, Vec<String>) {
        let mut args = Vec::new();
        let program = match &self.interpreter {
            Some(interpreter) => {
                args.extend(interpreter.args.iter().cloned());
                args.push(unit.path.clone());
                interpreter.program.clone()
            }
            None => unit.path.clone(),
        };
        args.extend(unit.args());
        (program, args)
    }

    fn build_command(&self, unit: &UnitSpec) -> (String, Command) {
        let (program, args) = self.command_line(unit);

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        (program, cmd)
    }

    async fn run(&self, unit: &UnitSpec) -> Result<Output, LaunchError> {
        let (program, mut cmd) = self.build_command(unit);

        let child = cmd
            .spawn()
            .map_err(|source| LaunchError::Spawn { program, source })?;

        // Dropping the future on timeout drops the child, which kills it.
        match self.unit_timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| LaunchError::TimedOut(limit))?
                .map_err(LaunchError::Capture),
            None => child.wait_with_output().await.map_err(LaunchError::Capture),
        }
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(&ExecutorConfig::default())
    }
}

#[async_trait]
impl UnitLauncher for ProcessLauncher {
    async fn launch(&self, unit: &UnitSpec) -> ExecutionResult {
        let started_at = Utc::now();
        debug!(script = %unit.path, priority = unit.priority, "launching unit");

        match self.run(unit).await {
            Ok(output) => {
                let result = ExecutionResult::completed(
                    unit,
                    started_at,
                    output.status.success(),
                    output.status.code(),
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                );
                if !result.success {
                    warn!(script = %unit.path, exit_code = ?result.exit_code, "unit failed");
                }
                result
            }
            Err(e) => {
                warn!(script = %unit.path, error = %e, "unit launch failed");
                ExecutionResult::launch_failed(unit, started_at, e.to_string())
            }
        }
    }
}
