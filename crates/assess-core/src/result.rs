//! Execution outcomes at unit, stage and run level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::unit::UnitSpec;

/// Outcome of launching a single unit.
///
/// Exactly one of these exists per submitted unit per run. A nonzero exit
/// leaves `error` empty; a launch that never produced an exit status leaves
/// `exit_code` empty and describes the failure in `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Identity of the unit (its path).
    pub script: String,

    /// Stage the unit ran in.
    pub priority: u32,

    /// Whether the unit exited with status 0.
    pub success: bool,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Process exit code, absent if no exit status was observed.
    #[serde(rename = "returncode", default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Launch failure description, distinct from a nonzero exit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the launch began.
    pub started_at: DateTime<Utc>,

    /// When the outcome was recorded.
    pub completed_at: DateTime<Utc>,

    /// `completed_at` as Unix epoch seconds.
    pub timestamp: f64,

    /// Wall-clock time spent in the launch, in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Record a unit whose process ran to completion.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    pub fn completed(
        unit: &UnitSpec,
        started_at: DateTime<Utc>,
        success: bool,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    ) -> Self {
        let completed_at = Utc::now();
        Self {
            script: unit.path.clone(),
            priority: unit.priority,
            success,
            stdout,
            stderr,
            exit_code,
            error: None,
            started_at,
            completed_at,
            timestamp: epoch_secs(completed_at),
            duration_ms: elapsed_ms(started_at, completed_at),
        }
    }

    /// Record a unit that could not be launched or captured.
    pub fn launch_failed(unit: &UnitSpec, started_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        let completed_at = Utc::now();
        Self {
            script: unit.path.clone(),
            priority: unit.priority,
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            error: Some(error.into()),
            started_at,
            completed_at,
            timestamp: epoch_secs(completed_at),
            duration_ms: elapsed_ms(started_at, completed_at),
        }
    }

    /// Whether this unit passed.
    pub fn passed(&self) -> bool {
        self.success
    }

    /// Whether the unit failed before producing an exit status.
    pub fn is_launch_failure(&self) -> bool {
        self.error.is_some()
    }
}

fn epoch_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}

/// Results of one priority stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Priority shared by every unit in the stage.
    pub priority: u32,

    /// One result per unit, in submission order.
    pub results: Vec<ExecutionResult>,
}

impl StageResult {
    /// Whether every unit in this stage passed.
    pub fn success(&self) -> bool {
        self.results.iter().all(ExecutionResult::passed)
    }
}

/// Aggregate outcome of an assessment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Unique identifier of this run.
    pub run_id: Uuid,

    /// Assessment type that was requested.
    pub assessment_type: String,

    /// Number of units submitted.
    pub total_scripts: usize,

    /// Elapsed wall-clock time in seconds.
    pub execution_time: f64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the last stage finished.
    pub finished_at: DateTime<Utc>,

    /// All unit results, concatenated in stage order.
    pub results: Vec<ExecutionResult>,

    /// True only if every unit succeeded (vacuously true when empty).
    pub success: bool,
}

impl RunResult {
    /// Fold stage results into a run result.
    pub fn from_stages(
        assessment_type: impl Into<String>,
        total_scripts: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        stages: Vec<StageResult>,
    ) -> Self {
        let results: Vec<ExecutionResult> = stages.into_iter().flat_map(|s| s.results).collect();
        let success = results.iter().all(ExecutionResult::passed);
        let execution_time = (finished_at - started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Self {
            run_id: Uuid::new_v4(),
            assessment_type: assessment_type.into(),
            total_scripts,
            execution_time,
            started_at,
            finished_at,
            results,
            success,
        }
    }

    /// Number of units that passed.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Number of units that failed.
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(path: &str, priority: u32, success: bool) -> ExecutionResult {
        let unit = UnitSpec::new(path, priority);
        let exit_code = if success { 0 } else { 1 };
        ExecutionResult::completed(&unit, Utc::now(), success, Some(exit_code), String::new(), String::new())
    }

    #[test]
    fn test_launch_failure_has_error_and_no_exit_code() {
        let unit = UnitSpec::new("missing.ps1", 1);
        let result = ExecutionResult::launch_failed(&unit, Utc::now(), "No such file");

        assert!(!result.passed());
        assert!(result.is_launch_failure());
        assert_eq!(result.exit_code, None);
        assert_eq!(result.error.as_deref(), Some("No such file"));
        assert!(result.completed_at >= result.started_at);
    }

    #[test]
    fn test_unit_failure_keeps_exit_code() {
        let result = result("a.ps1", 1, false);
        assert!(!result.passed());
        assert!(!result.is_launch_failure());
        assert_eq!(result.exit_code, Some(1));
    }

    #[test]
    fn test_empty_run_is_vacuously_successful() {
        let now = Utc::now();
        let run = RunResult::from_stages("unknown", 0, now, now, vec![]);

        assert!(run.success);
        assert!(run.results.is_empty());
        assert_eq!(run.total_scripts, 0);
        assert_eq!(run.execution_time, 0.0);
    }

    #[test]
    fn test_run_concatenates_stages_in_order() {
        let now = Utc::now();
        let stages = vec![
            StageResult {
                priority: 1,
                results: vec![result("a", 1, true), result("b", 1, true)],
            },
            StageResult {
                priority: 2,
                results: vec![result("c", 2, true)],
            },
        ];

        let run = RunResult::from_stages("security", 3, now, now, stages);
        let scripts: Vec<&str> = run.results.iter().map(|r| r.script.as_str()).collect();
        assert_eq!(scripts, vec!["a", "b", "c"]);
        assert!(run.success);
        assert_eq!(run.passed_count(), 3);
    }

    #[test]
    fn test_single_failure_flips_aggregate() {
        let now = Utc::now();
        let stages = vec![StageResult {
            priority: 1,
            results: vec![result("a", 1, true), result("b", 1, false)],
        }];
        assert!(!stages[0].success());

        let run = RunResult::from_stages("full", 2, now, now, stages);
        assert!(!run.success);
        assert_eq!(run.passed_count(), 1);
        assert_eq!(run.failed_count(), 1);
    }

    #[test]
    fn test_absent_fields_are_omitted_on_the_wire() {
        let value = serde_json::to_value(result("a.ps1", 2, true)).unwrap();
        assert_eq!(value["script"], "a.ps1");
        assert_eq!(value["returncode"], 0);
        assert!(value.get("exit_code").is_none());
        assert!(value.get("error").is_none());

        let unit = UnitSpec::new("b.ps1", 1);
        let value = serde_json::to_value(ExecutionResult::launch_failed(&unit, Utc::now(), "boom")).unwrap();
        assert!(value.get("returncode").is_none());
        assert_eq!(value["error"], "boom");
    }

    #[test]
    fn test_timestamp_is_completion_in_epoch_seconds() {
        let before = Utc::now().timestamp() as f64;
        let value = serde_json::to_value(result("a.ps1", 1, true)).unwrap();
        let after = Utc::now().timestamp() as f64 + 1.0;

        let timestamp = value["timestamp"].as_f64().expect("numeric timestamp");
        assert!(timestamp >= before && timestamp <= after, "{timestamp}");

        let unit = UnitSpec::new("b.ps1", 1);
        let failed = ExecutionResult::launch_failed(&unit, Utc::now(), "boom");
        assert_eq!(failed.timestamp, failed.completed_at.timestamp_micros() as f64 / 1_000_000.0);
    }

    #[test]
    fn test_wire_form_parses_back() {
        let original = result("a.ps1", 3, false);
        let text = serde_json::to_string(&original).unwrap();
        let parsed: ExecutionResult = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.exit_code, Some(1));
        assert_eq!(parsed.completed_at, original.completed_at);
    }
}
