#![allow(dead_code)]

use awfy_core::errors::Result;
use awfy_core::model::{Anchor, ComparabilityKey, Direction, EntityKind, MeasurementKind, Row};
use awfy_core::storage::{RecordStore, SqliteStore};
use rusqlite::params;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const MAC: i64 = 1;
pub const LINUX: i64 = 2;
pub const ION: i64 = 1;
pub const BASELINE: i64 = 2;
pub const OCTANE: i64 = 1;
pub const SUNSPIDER: i64 = 2;
pub const RICHARDS: i64 = 1;

/// In-memory awfy database with two machines, two modes, two suite versions
/// and one suite test.
pub struct Fixture {
    pub store: SqliteStore,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_machine_runs(4)
    }

    pub fn with_machine_runs(confidence_runs: i64) -> Self {
        let store = SqliteStore::memory().unwrap();
        store.init_schema().unwrap();
        let fx = Self { store };
        fx.exec(&format!(
            "INSERT INTO awfy_machine(id, description, confidence_runs) VALUES (1, 'mac-mini', {confidence_runs}), (2, 'linux', 1);
             INSERT INTO awfy_mode(id, name) VALUES (1, 'Ion'), (2, 'Baseline');
             INSERT INTO awfy_suite(id, name) VALUES (1, 'octane'), (2, 'sunspider');
             INSERT INTO awfy_suite_version(id, suite_id, name, confidence_factor)
               VALUES (1, 1, 'octane', 1.0), (2, 2, 'sunspider', 0.5);
             INSERT INTO awfy_suite_test(id, suite_version_id, name, confidence_factor, noise)
               VALUES (1, 1, 'richards', 0.5, 0.05);"
        ));
        fx
    }

    pub fn exec(&self, sql: &str) {
        self.store.conn.lock().unwrap().execute_batch(sql).unwrap();
    }

    fn build(&self, machine: i64, mode: i64, stamp: i64) -> i64 {
        let conn = self.store.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO awfy_run(machine, stamp) VALUES (?1, ?2)",
            params![machine, stamp],
        )
        .unwrap();
        let run_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO awfy_build(run_id, mode_id) VALUES (?1, ?2)",
            params![run_id, mode],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    /// Records one score in its own run and returns the score id.
    pub fn score(&self, machine: i64, mode: i64, suite_version: i64, stamp: i64, score: f64) -> i64 {
        self.score_with_status(machine, mode, suite_version, stamp, score, 1)
    }

    pub fn score_with_status(
        &self,
        machine: i64,
        mode: i64,
        suite_version: i64,
        stamp: i64,
        score: f64,
        status: i64,
    ) -> i64 {
        let build_id = self.build(machine, mode, stamp);
        self.score_in_build(build_id, suite_version, score, status)
    }

    pub fn score_in_build(&self, build_id: i64, suite_version: i64, score: f64, status: i64) -> i64 {
        let conn = self.store.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO awfy_score(build_id, suite_version_id, score, status) VALUES (?1, ?2, ?3, ?4)",
            params![build_id, suite_version, score, status],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn breakdown(&self, machine: i64, mode: i64, suite_test: i64, stamp: i64, score: f64) -> i64 {
        let build_id = self.build(machine, mode, stamp);
        self.breakdown_in_build(build_id, suite_test, score)
    }

    pub fn breakdown_in_build(&self, build_id: i64, suite_test: i64, score: f64) -> i64 {
        let conn = self.store.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO awfy_breakdown(build_id, suite_test_id, score, status) VALUES (?1, ?2, ?3, 1)",
            params![build_id, suite_test, score],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    /// Run + build without measurements, for callers that add several.
    pub fn empty_build(&self, machine: i64, mode: i64, stamp: i64) -> i64 {
        self.build(machine, mode, stamp)
    }

    /// Octane scores on mac-mini/Ion at stamps 100, 200, ...; returns ids in order.
    pub fn octane_series(&self, scores: &[f64]) -> Vec<i64> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| self.score(MAC, ION, OCTANE, 100 * (i as i64 + 1), *s))
            .collect()
    }
}

/// Delegating store that counts round trips.
pub struct CountingStore {
    inner: SqliteStore,
    ranges: AtomicUsize,
    candidates: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            ranges: AtomicUsize::new(0),
            candidates: AtomicUsize::new(0),
        }
    }

    pub fn ranges(&self) -> usize {
        self.ranges.load(Ordering::SeqCst)
    }

    pub fn candidates(&self) -> usize {
        self.candidates.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.ranges() + self.candidates()
    }
}

impl RecordStore for CountingStore {
    fn fetch_range(&self, kind: EntityKind, low: i64, high: i64) -> Result<Vec<Row>> {
        self.ranges.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_range(kind, low, high)
    }

    fn fetch_candidates(
        &self,
        kind: MeasurementKind,
        key: &ComparabilityKey,
        anchor: Anchor,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<Row>> {
        self.candidates.fetch_add(1, Ordering::SeqCst);
        self.inner
            .fetch_candidates(kind, key, anchor, direction, limit)
    }

    fn build_ids_for_run(&self, run_id: i64) -> Result<Vec<i64>> {
        self.inner.build_ids_for_run(run_id)
    }

    fn measurement_ids_for_build(&self, kind: MeasurementKind, build_id: i64) -> Result<Vec<i64>> {
        self.inner.measurement_ids_for_build(kind, build_id)
    }
}
