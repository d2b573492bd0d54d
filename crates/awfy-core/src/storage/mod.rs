pub mod schema;
pub mod store;

pub use store::SqliteStore;

use crate::errors::Result;
use crate::model::{Anchor, ComparabilityKey, Direction, EntityKind, MeasurementKind, Row};

/// Read-only access to the benchmark database.
///
/// Rows are immutable once written, so every method may be called
/// concurrently and repeatedly with the same answer.
pub trait RecordStore: Send + Sync {
    /// All rows of `kind` with `low <= id < high`.
    fn fetch_range(&self, kind: EntityKind, low: i64, high: i64) -> Result<Vec<Row>>;

    /// Up to `limit` valid measurements sharing `key`, strictly after
    /// (`Next`) or before (`Prev`) `anchor`, ordered away from it.
    fn fetch_candidates(
        &self,
        kind: MeasurementKind,
        key: &ComparabilityKey,
        anchor: Anchor,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<Row>>;

    fn build_ids_for_run(&self, run_id: i64) -> Result<Vec<i64>>;

    fn measurement_ids_for_build(&self, kind: MeasurementKind, build_id: i64) -> Result<Vec<i64>>;
}
