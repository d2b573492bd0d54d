use crate::cache::RecordCache;
use crate::entity::Entity;
use crate::errors::Result;
use crate::model::{Anchor, ComparabilityKey, MeasurementKind, MeasurementRef, Row, STATUS_VALID};
use std::sync::Arc;

/// A score or a breakdown, viewed through the fields the trend code needs.
#[derive(Debug, Clone)]
pub struct Measurement {
    kind: MeasurementKind,
    entity: Entity,
}

impl Measurement {
    pub fn new(reference: MeasurementRef, cache: RecordCache) -> Self {
        Self {
            kind: reference.kind,
            entity: Entity::new(reference.kind.entity_kind(), reference.id, cache),
        }
    }

    pub(crate) fn from_row(kind: MeasurementKind, row: Arc<Row>, cache: RecordCache) -> Self {
        Self {
            kind,
            entity: Entity::with_row(row, cache),
        }
    }

    pub fn reference(&self) -> MeasurementRef {
        MeasurementRef {
            kind: self.kind,
            id: self.entity.id(),
        }
    }

    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn score(&self) -> Result<f64> {
        self.entity.real("score")
    }

    pub fn status(&self) -> Result<i64> {
        self.entity.int("status")
    }

    pub fn is_valid(&self) -> Result<bool> {
        Ok(self.status()? == STATUS_VALID)
    }

    pub fn build(&self) -> Result<Entity> {
        self.entity.related("build")
    }

    pub fn run(&self) -> Result<Entity> {
        self.build()?.related("run")
    }

    pub fn machine(&self) -> Result<Entity> {
        self.run()?.related("machine")
    }

    pub fn mode(&self) -> Result<Entity> {
        self.build()?.related("mode")
    }

    /// The suite version of a score, or the suite test of a breakdown.
    pub fn suite(&self) -> Result<Entity> {
        self.entity.related(self.kind.suite_relation())
    }

    pub fn stamp(&self) -> Result<i64> {
        self.run()?.int("stamp")
    }

    pub fn anchor(&self) -> Result<Anchor> {
        Ok(Anchor {
            stamp: self.stamp()?,
            id: self.entity.id(),
        })
    }

    pub fn comparability_key(&self) -> Result<ComparabilityKey> {
        let build = self.build()?;
        Ok(ComparabilityKey {
            machine_id: build.related("run")?.int("machine_id")?,
            mode_id: build.int("mode_id")?,
            suite_id: self.entity.int(self.kind.suite_column())?,
        })
    }

    /// Samples needed on each side before a change can be judged.
    pub fn runs(&self) -> Result<usize> {
        let confidence_runs = self.machine()?.int("confidence_runs")?.max(1);
        let factor = self.suite()?.real("confidence_factor")?;
        let runs = (confidence_runs as f64 * factor).round();
        Ok(runs.max(1.0) as usize)
    }

    /// Baseline noise ratio. Whole-suite scores carry no noise estimate.
    pub fn noise(&self) -> Result<f64> {
        match self.kind {
            MeasurementKind::Score => Ok(1.0),
            MeasurementKind::Breakdown => self.suite()?.real("noise"),
        }
    }
}
