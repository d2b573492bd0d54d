mod common;

use awfy_core::config::EngineConfig;
use awfy_core::errors::Result;
use awfy_core::model::{Anchor, ComparabilityKey, Direction, EntityKind, MeasurementKind, Row};
use awfy_core::storage::RecordStore;
use awfy_core::{Change, MeasurementRef, TrendEngine, TrendError};
use common::*;
use std::sync::Arc;

fn engine(fx: &Fixture) -> (TrendEngine, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::new(fx.store.clone()));
    let engine = TrendEngine::new(store.clone(), &EngineConfig::default()).unwrap();
    (engine, store)
}

fn assert_ratio(change: Change, expected: f64) {
    let got = change.as_f64().expect("numeric change");
    assert!((got - expected).abs() < 1e-12, "expected {expected}, got {got}");
}

#[test]
fn test_equal_history_has_no_change() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let ids = fx.octane_series(&[10.0; 8]);
    let (engine, _) = engine(&fx);

    assert_eq!(engine.change(MeasurementRef::score(ids[4]))?, Change::Ratio(0.0));
    Ok(())
}

#[test]
fn test_halved_scores_report_improvement_ratio() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let ids = fx.octane_series(&[10.0, 10.0, 10.0, 10.0, 5.0, 5.0, 5.0, 5.0]);
    let (engine, _) = engine(&fx);

    // runs = 4: prev avg 100/4/10, next avg 50/4/10
    assert_ratio(engine.change(MeasurementRef::score(ids[4]))?, 0.5);
    // One step later the window straddles the drop but lacks forward data.
    assert!(engine.change(MeasurementRef::score(ids[5]))?.is_undetermined());
    Ok(())
}

#[test]
fn test_zero_history_is_unbounded() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let ids = fx.octane_series(&[0.0, 0.0, 0.0, 0.0, 4.0, 4.0, 4.0, 4.0]);
    let (engine, _) = engine(&fx);

    let change = engine.change(MeasurementRef::score(ids[4]))?;
    assert!(change.is_unbounded());
    assert_eq!(change.as_f64(), Some(f64::INFINITY));

    assert_eq!(engine.change(MeasurementRef::score(ids[0]))?, Change::Ratio(0.0));
    Ok(())
}

#[test]
fn test_short_forward_history_is_undetermined() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let ids = fx.octane_series(&[10.0, 10.0, 10.0, 10.0, 5.0, 5.0]);
    let (engine, _) = engine(&fx);

    let change = engine.change(MeasurementRef::score(ids[4]))?;
    assert_eq!(change, Change::Undetermined);
    assert_ne!(change, Change::Ratio(0.0));
    assert_eq!(change.as_f64(), None);
    Ok(())
}

#[test]
fn test_change_is_memoized() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let ids = fx.octane_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    let (engine, store) = engine(&fx);

    let m = MeasurementRef::score(ids[4]);
    let first = engine.change(m)?;
    let queries = store.total();
    assert_eq!(store.candidates(), 2, "one query per direction");

    assert_eq!(engine.change(m)?, first);
    assert_eq!(store.total(), queries);
    Ok(())
}

#[test]
fn test_single_run_window() -> anyhow::Result<()> {
    let fx = Fixture::with_machine_runs(1);
    let ids = fx.octane_series(&[10.0, 12.0]);
    let (engine, _) = engine(&fx);

    // No history reads as an all-zero prior side.
    assert!(engine.change(MeasurementRef::score(ids[0]))?.is_unbounded());
    assert_ratio(engine.change(MeasurementRef::score(ids[1]))?, -0.2);
    Ok(())
}

#[test]
fn test_runs_per_measurement_kind() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let octane = fx.score(MAC, ION, OCTANE, 100, 1.0);
    let sunspider = fx.score(MAC, ION, SUNSPIDER, 100, 1.0);
    let richards = fx.breakdown(MAC, ION, RICHARDS, 100, 1.0);
    let (engine, _) = engine(&fx);

    let m = engine.measurement(MeasurementRef::score(octane));
    assert_eq!(m.runs()?, 4);
    assert_eq!(m.noise()?, 1.0);

    assert_eq!(engine.measurement(MeasurementRef::score(sunspider)).runs()?, 2);

    let b = engine.measurement(MeasurementRef::breakdown(richards));
    assert_eq!(b.runs()?, 2);
    assert_eq!(b.noise()?, 0.05);
    Ok(())
}

#[test]
fn test_huge_confidence_factor_is_undetermined() -> anyhow::Result<()> {
    let fx = Fixture::new();
    fx.exec("UPDATE awfy_suite_version SET confidence_factor = 1e30 WHERE id = 1");
    let ids = fx.octane_series(&[10.0, 11.0, 12.0]);
    let (engine, _) = engine(&fx);

    let m = MeasurementRef::score(ids[1]);
    assert_eq!(engine.measurement(m).runs()?, usize::MAX);
    assert_eq!(engine.change(m)?, Change::Undetermined);
    Ok(())
}

#[test]
fn test_zero_confidence_runs_still_needs_one()-> anyhow::Result<()> {
    let fx = Fixture::with_machine_runs(0);
    let ids = fx.octane_series(&[10.0, 10.0]);
    let (engine, _) = engine(&fx);

    assert_eq!(engine.measurement(MeasurementRef::score(ids[1])).runs()?, 1);
    assert_eq!(engine.change(MeasurementRef::score(ids[1]))?, Change::Ratio(0.0));
    Ok(())
}

#[test]
fn test_run_summaries() -> anyhow::Result<()> {
    let fx = Fixture::with_machine_runs(1);
    fx.score(MAC, ION, OCTANE, 1_391_421_000, 100.0);
    let build = fx.empty_build(MAC, ION, 1_391_421_600);
    let score = fx.score_in_build(build, OCTANE, 105.0, 1);
    let breakdown = fx.breakdown_in_build(build, RICHARDS, 50.0);
    let (engine, _) = engine(&fx);

    // One run per build in the fixture, so the ids line up.
    let run = build;
    assert_eq!(
        engine.run_measurements(run)?,
        vec![MeasurementRef::score(score), MeasurementRef::breakdown(breakdown)]
    );

    let summaries = engine.run_summaries(run)?;
    assert_eq!(summaries.len(), 2);

    let s = &summaries[0];
    assert_eq!(s.test, None);
    assert_eq!(s.prev_score, Some(100.0));
    assert_eq!(
        s.to_string(),
        "2014-02-03 10:00:00  mac-mini  Ion  octane: -0.05  100 105  (1 runs, 1.0)"
    );

    let b = &summaries[1];
    assert_eq!(b.test.as_deref(), Some("richards"));
    assert_eq!(
        b.to_string(),
        "2014-02-03 10:00:00  mac-mini  Ion  octane:richards: inf  50  (1 runs, 0.05)"
    );

    let json = serde_json::to_value(b)?;
    assert_eq!(json["change"], "inf");
    assert_eq!(json["test"], "richards");
    assert!(serde_json::to_value(s)?.get("test").is_none());

    assert!(engine.run_measurements(999)?.is_empty());
    Ok(())
}

struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn fetch_range(&self, _: EntityKind, _: i64, _: i64) -> Result<Vec<Row>> {
        Err(TrendError::StoreUnavailable("database is locked".into()))
    }

    fn fetch_candidates(
        &self,
        _: MeasurementKind,
        _: &ComparabilityKey,
        _: Anchor,
        _: Direction,
        _: usize,
    ) -> Result<Vec<Row>> {
        Err(TrendError::StoreUnavailable("database is locked".into()))
    }

    fn build_ids_for_run(&self, _: i64) -> Result<Vec<i64>> {
        Ok(Vec::new())
    }

    fn measurement_ids_for_build(&self, _: MeasurementKind, _: i64) -> Result<Vec<i64>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_store_failure_surfaces_as_retryable() {
    let engine = TrendEngine::new(Arc::new(UnavailableStore), &EngineConfig::default()).unwrap();

    let err = engine.change(MeasurementRef::score(1)).unwrap_err();
    assert!(matches!(err, TrendError::StoreUnavailable(_)));
    assert!(err.is_retryable());
}
