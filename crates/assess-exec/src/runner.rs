//! Assessment runs: catalog resolution, staged execution, aggregation.

use assess_core::{Catalog, CatalogEntry, ExecutionResult, ParameterSet, RunResult, UnitSpec};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::ExecutorConfig;
use crate::scheduler::StageScheduler;

/// Resolves assessment types against the catalog and drives the scheduler.
#[derive(Clone)]
pub struct AssessmentRunner {
    catalog: Arc<Catalog>,
    scheduler: StageScheduler,
}

impl AssessmentRunner {
    pub fn new(catalog: Arc<Catalog>, scheduler: StageScheduler) -> Self {
        Self { catalog, scheduler }
    }

    /// Runner launching real processes according to `config`.
    pub fn from_config(catalog: Arc<Catalog>, config: &ExecutorConfig) -> Self {
        Self::new(catalog, StageScheduler::from_config(config))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Catalog entries for `assessment_type`, without running anything.
    pub fn scripts(&self, assessment_type: &str) -> &[CatalogEntry] {
        self.catalog.scripts(assessment_type)
    }

    /// Run every catalogued unit of `assessment_type` with `parameters`.
    ///
    /// An unknown type runs nothing and reports an empty, successful run.
    #[instrument(skip(self, parameters), fields(params = parameters.len()))]
    pub async fn run(&self, assessment_type: &str, parameters: ParameterSet) -> RunResult {
        let units = self.catalog.units(assessment_type, &parameters);
        if units.is_empty() && !self.catalog.contains(assessment_type) {
            warn!(assessment_type, "no catalog entry, nothing to run");
        }

        let total = units.len();
        let started_at = Utc::now();
        let stages = self.scheduler.run(units).await;
        let finished_at = Utc::now();

        let run = RunResult::from_stages(assessment_type, total, started_at, finished_at, stages);
        info!(
            run_id = %run.run_id,
            success = run.success,
            passed = run.passed_count(),
            failed = run.failed_count(),
            seconds = run.execution_time,
            "assessment complete"
        );
        run
    }

    /// Run caller-supplied units, honouring their priorities.
    ///
    /// Returns the results concatenated in stage order.
    #[instrument(skip_all, fields(units = units.len()))]
    pub async fn execute(&self, units: Vec<UnitSpec>) -> Vec<ExecutionResult> {
        self.scheduler
            .run(units)
            .await
            .into_iter()
            .flat_map(|stage| stage.results)
            .collect()
    }
}
