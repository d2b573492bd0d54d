pub mod change;
pub mod measurement;
pub mod navigator;

pub use change::{estimate_change, Change};
pub use measurement::Measurement;
pub use navigator::TrendNavigator;

use crate::cache::RecordCache;
use crate::config::EngineConfig;
use crate::errors::Result;
use crate::model::{MeasurementKind, MeasurementRef};
use crate::report::TrendSummary;
use crate::storage::{RecordStore, SqliteStore};
use std::sync::Arc;

/// Id-level entry point used by the dashboard.
pub struct TrendEngine {
    navigator: TrendNavigator,
}

impl TrendEngine {
    pub fn new(store: Arc<dyn RecordStore>, cfg: &EngineConfig) -> Result<Self> {
        cfg.validate()?;
        let cache = RecordCache::new(store, cfg);
        Ok(Self {
            navigator: TrendNavigator::new(cache, cfg),
        })
    }

    pub fn from_sqlite(store: SqliteStore, cfg: &EngineConfig) -> Result<Self> {
        store.configure(cfg)?;
        Self::new(Arc::new(store), cfg)
    }

    pub fn navigator(&self) -> &TrendNavigator {
        &self.navigator
    }

    pub fn measurement(&self, reference: MeasurementRef) -> Measurement {
        self.navigator.measurement(reference)
    }

    pub fn change(&self, reference: MeasurementRef) -> Result<Change> {
        self.navigator.change(&self.measurement(reference))
    }

    pub fn next(&self, reference: MeasurementRef) -> Result<Option<MeasurementRef>> {
        let next = self.navigator.next(&self.measurement(reference))?;
        Ok(next.map(|m| m.reference()))
    }

    pub fn prev(&self, reference: MeasurementRef) -> Result<Option<MeasurementRef>> {
        let prev = self.navigator.prev(&self.measurement(reference))?;
        Ok(prev.map(|m| m.reference()))
    }

    pub fn nexts(&self, reference: MeasurementRef, amount: usize) -> Result<Vec<MeasurementRef>> {
        let nexts = self.navigator.nexts(&self.measurement(reference), amount)?;
        Ok(nexts.iter().map(Measurement::reference).collect())
    }

    pub fn prevs(&self, reference: MeasurementRef, amount: usize) -> Result<Vec<MeasurementRef>> {
        let prevs = self.navigator.prevs(&self.measurement(reference), amount)?;
        Ok(prevs.iter().map(Measurement::reference).collect())
    }

    /// Scores of a build followed by its breakdowns.
    pub fn build_measurements(&self, build_id: i64) -> Result<Vec<MeasurementRef>> {
        let store = self.navigator.cache().store();
        let mut out = Vec::new();
        for kind in [MeasurementKind::Score, MeasurementKind::Breakdown] {
            for id in store.measurement_ids_for_build(kind, build_id)? {
                out.push(MeasurementRef { kind, id });
            }
        }
        Ok(out)
    }

    pub fn run_measurements(&self, run_id: i64) -> Result<Vec<MeasurementRef>> {
        let mut out = Vec::new();
        for build_id in self.navigator.cache().store().build_ids_for_run(run_id)? {
            out.extend(self.build_measurements(build_id)?);
        }
        Ok(out)
    }

    pub fn summary(&self, reference: MeasurementRef) -> Result<TrendSummary> {
        TrendSummary::collect(&self.navigator, &self.measurement(reference))
    }

    pub fn run_summaries(&self, run_id: i64) -> Result<Vec<TrendSummary>> {
        self.run_measurements(run_id)?
            .into_iter()
            .map(|r| self.summary(r))
            .collect()
    }
}
