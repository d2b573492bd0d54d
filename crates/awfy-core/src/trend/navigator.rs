use super::change::{self, Change};
use super::measurement::Measurement;
use crate::cache::RecordCache;
use crate::config::EngineConfig;
use crate::errors::Result;
use crate::model::{Direction, MeasurementRef};
use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};

/// Walks a measurement series one comparable neighbour at a time.
///
/// Links and changes are memoized next to the record cache and never
/// persisted. Every memoized value is derived from the store alone, so two
/// callers racing on the same measurement write identical results.
pub struct TrendNavigator {
    cache: RecordCache,
    candidate_limit: usize,
    next: Cache<MeasurementRef, Option<MeasurementRef>>,
    prev: Cache<MeasurementRef, Option<MeasurementRef>>,
    change: Cache<MeasurementRef, Change>,
    queries: AtomicU64,
}

impl TrendNavigator {
    pub fn new(cache: RecordCache, cfg: &EngineConfig) -> Self {
        Self {
            cache,
            candidate_limit: cfg.candidate_limit,
            next: Cache::new(cfg.memo_capacity),
            prev: Cache::new(cfg.memo_capacity),
            change: Cache::new(cfg.memo_capacity),
            queries: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub fn measurement(&self, reference: MeasurementRef) -> Measurement {
        Measurement::new(reference, self.cache.clone())
    }

    /// Candidate queries issued so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    fn links(&self, direction: Direction) -> &Cache<MeasurementRef, Option<MeasurementRef>> {
        match direction {
            Direction::Next => &self.next,
            Direction::Prev => &self.prev,
        }
    }

    pub fn next(&self, m: &Measurement) -> Result<Option<Measurement>> {
        self.step(m, Direction::Next)
    }

    pub fn prev(&self, m: &Measurement) -> Result<Option<Measurement>> {
        self.step(m, Direction::Prev)
    }

    /// Up to `amount` later measurements, nearest first. Shorter when the
    /// series ends.
    pub fn nexts(&self, m: &Measurement, amount: usize) -> Result<Vec<Measurement>> {
        self.walk(m, Direction::Next, amount)
    }

    /// Up to `amount` earlier measurements, nearest first.
    pub fn prevs(&self, m: &Measurement, amount: usize) -> Result<Vec<Measurement>> {
        self.walk(m, Direction::Prev, amount)
    }

    pub fn change(&self, m: &Measurement) -> Result<Change> {
        let reference = m.reference();
        if let Some(hit) = self.change.get(&reference) {
            return Ok(hit);
        }
        let change = change::compute(self, m)?;
        self.change.insert(reference, change);
        Ok(change)
    }

    fn walk(&self, m: &Measurement, direction: Direction, amount: usize) -> Result<Vec<Measurement>> {
        let mut out = Vec::new();
        let mut point = m.clone();
        while out.len() < amount {
            match self.step(&point, direction)? {
                Some(neighbour) => {
                    out.push(neighbour.clone());
                    point = neighbour;
                }
                None => break,
            }
        }
        Ok(out)
    }

    fn step(&self, m: &Measurement, direction: Direction) -> Result<Option<Measurement>> {
        let from = m.reference();
        if let Some(link) = self.links(direction).get(&from) {
            return Ok(link.map(|to| self.measurement(to)));
        }

        let key = m.comparability_key()?;
        let anchor = m.anchor()?;
        let rows = self.cache.store().fetch_candidates(
            from.kind,
            &key,
            anchor,
            direction,
            self.candidate_limit,
        )?;
        self.queries.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            event = "candidates_fetched",
            measurement = %from,
            direction = ?direction,
            limit = self.candidate_limit,
            rows = rows.len(),
        );

        let exhausted = rows.len() < self.candidate_limit;
        let chain: Vec<Measurement> = self
            .cache
            .absorb(rows)
            .into_iter()
            .map(|row| Measurement::from_row(from.kind, row, self.cache.clone()))
            .collect();

        self.link(m, &chain, direction, exhausted)?;
        Ok(chain.into_iter().next())
    }

    /// Memoizes `m -> chain[0] -> chain[1] -> ...` in `direction` and the
    /// matching back-links. When the store ran out of candidates the tail of
    /// the chain is terminal.
    fn link(
        &self,
        m: &Measurement,
        chain: &[Measurement],
        direction: Direction,
        exhausted: bool,
    ) -> Result<()> {
        let forward = self.links(direction);
        let backward = self.links(direction.reverse());
        let from = m.reference();

        forward.insert(from, chain.first().map(Measurement::reference));

        // An invalid measurement is never a candidate, so it cannot be the
        // neighbour of anything in the chain.
        if let Some(first) = chain.first() {
            if m.is_valid()? {
                backward.insert(first.reference(), Some(from));
            }
        }

        for pair in chain.windows(2) {
            let (a, b) = (pair[0].reference(), pair[1].reference());
            forward.insert(a, Some(b));
            backward.insert(b, Some(a));
        }

        if exhausted {
            if let Some(last) = chain.last() {
                forward.insert(last.reference(), None);
            }
        }
        Ok(())
    }
}
