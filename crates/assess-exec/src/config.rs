//! Executor configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Program that hosts each unit, e.g. `pwsh -NoProfile -NonInteractive -File`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// Executable to run.
    pub program: String,

    /// Arguments placed before the unit path.
    pub args: Vec<String>,
}

impl Interpreter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// PowerShell 7, non-interactive, running the unit as a script file.
    pub fn powershell() -> Self {
        Self::new(
            "pwsh",
            vec![
                "-NoProfile".to_string(),
                "-NonInteractive".to_string(),
                "-File".to_string(),
            ],
        )
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::powershell()
    }
}

/// Configuration for the launcher and stage scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Maximum number of units running at once within a stage.
    pub max_workers: usize,

    /// Host program for units. `None` executes the unit path directly.
    pub interpreter: Option<Interpreter>,

    /// Kill a unit that runs longer than this. `None` waits indefinitely.
    pub unit_timeout: Option<Duration>,

    /// Working directory for launched units. `None` inherits ours.
    pub working_dir: Option<PathBuf>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            interpreter: Some(Interpreter::powershell()),
            unit_timeout: None,
            working_dir: None,
        }
    }
}

impl ExecutorConfig {
    /// Check the configuration before any unit is launched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if let Some(interpreter) = &self.interpreter {
            if interpreter.program.trim().is_empty() {
                return Err(ConfigError::EmptyInterpreter);
            }
        }
        Ok(())
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_interpreter(mut self, interpreter: Option<Interpreter>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_unit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.unit_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.interpreter, Some(Interpreter::powershell()));
        assert!(config.unit_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = ExecutorConfig::default().with_max_workers(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroWorkers));
    }

    #[test]
    fn test_blank_interpreter_rejected() {
        let config = ExecutorConfig::default().with_interpreter(Some(Interpreter::new(" ", vec![])));
        assert_eq!(config.validate(), Err(ConfigError::EmptyInterpreter));
    }

    #[test]
    fn test_direct_execution_is_valid() {
        let config = ExecutorConfig::default().with_interpreter(None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_powershell_args() {
        let pwsh = Interpreter::powershell();
        assert_eq!(pwsh.program, "pwsh");
        assert_eq!(pwsh.args.last().map(String::as_str), Some("-File"));
    }
}
