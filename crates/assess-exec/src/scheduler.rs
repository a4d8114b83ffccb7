//! Priority-staged parallel scheduling.
//!
//! Units are grouped by priority. Stages run strictly one after another in
//! ascending priority order; every unit inside a stage is launched
//! concurrently, bounded by the worker pool. A stage ends only when all of its
//! units have reported, whether they passed or failed.

use assess_core::{ExecutionResult, StageResult, UnitSpec};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::config::ExecutorConfig;
use crate::launcher::{ProcessLauncher, UnitLauncher};
use crate::pool::WorkerPool;

/// Group units by priority, ascending. Order within a group is submission order.
pub fn group_by_priority(units: Vec<UnitSpec>) -> BTreeMap<u32, Vec<UnitSpec>> {
    let mut groups: BTreeMap<u32, Vec<UnitSpec>> = BTreeMap::new();
    for unit in units {
        groups.entry(unit.priority).or_default().push(unit);
    }
    groups
}

/// Runs units in priority stages on a shared worker pool.
#[derive(Clone)]
pub struct StageScheduler {
    launcher: Arc<dyn UnitLauncher>,
    pool: WorkerPool,
}

impl StageScheduler {
    pub fn new(launcher: Arc<dyn UnitLauncher>, pool: WorkerPool) -> Self {
        Self { launcher, pool }
    }

    /// Scheduler backed by a [`ProcessLauncher`] built from `config`.
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(
            Arc::new(ProcessLauncher::new(config)),
            WorkerPool::new(config.max_workers),
        )
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Run `units` stage by stage. Returns one [`StageResult`] per distinct
    /// priority, in ascending order; an empty input yields no stages.
    #[instrument(skip_all, fields(units = units.len(), workers = self.pool.size()))]
    pub async fn run(&self, units: Vec<UnitSpec>) -> Vec<StageResult> {
        let groups = group_by_priority(units);
        let mut stages = Vec::with_capacity(groups.len());

        for (priority, group) in groups {
            info!(priority, units = group.len(), "starting stage");
            let stage = self.run_stage(priority, group).await;
            info!(
                priority,
                passed = stage.results.iter().filter(|r| r.passed()).count(),
                failed = stage.results.iter().filter(|r| !r.passed()).count(),
                "stage complete"
            );
            stages.push(stage);
        }

        stages
    }

    /// Launch every unit of one stage and wait for all of them.
    async fn run_stage(&self, priority: u32, units: Vec<UnitSpec>) -> StageResult {
        let mut join_set = JoinSet::new();
        for (idx, unit) in units.iter().cloned().enumerate() {
            let launcher = Arc::clone(&self.launcher);
            let pool = self.pool.clone();
            join_set.spawn(async move {
                let result = match pool.acquire().await {
                    Some(_permit) => launcher.launch(&unit).await,
                    None => ExecutionResult::launch_failed(&unit, Utc::now(), "worker pool closed"),
                };
                (idx, result)
            });
        }

        // One slot per unit, each written once.
        let mut slots: Vec<Option<ExecutionResult>> = vec![None; units.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => warn!(priority, error = %e, "launch task did not finish"),
            }
        }

        let results = units
            .iter()
            .zip(slots)
            .map(|(unit, slot)| {
                slot.unwrap_or_else(|| {
                    ExecutionResult::launch_failed(unit, Utc::now(), "launch task aborted before reporting")
                })
            })
            .collect();

        StageResult { priority, results }
    }
}
