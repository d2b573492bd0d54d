pub mod window;

use crate::config::EngineConfig;
use crate::entity::suggest_field;
use crate::errors::{Result, TrendError};
use crate::model::{EntityKind, Row, Value};
use crate::storage::RecordStore;
use moka::sync::Cache;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use window::Window;

const KINDS: usize = EntityKind::ALL.len();

/// In-memory rows per entity kind, filled by range prefetches.
///
/// A miss for id N loads the whole window around N in one query, so walking
/// a series of neighbouring ids costs one round trip per window. Each kind is
/// bounded independently; an evicted row is simply fetched again.
///
/// Fetched windows are remembered together with the ids they returned, so a
/// miss on a hole inside a loaded window fails without another query.
#[derive(Clone)]
pub struct RecordCache {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn RecordStore>,
    tables: [Cache<i64, Arc<Row>>; KINDS],
    fetched: [Cache<i64, Arc<Fetched>>; KINDS],
    radius: i64,
    prefetches: AtomicU64,
}

/// One completed prefetch, keyed by `window.low`.
struct Fetched {
    window: Window,
    ids: BTreeSet<i64>,
}

impl Fetched {
    /// Rows are appended with growing ids, so only ids below the highest one
    /// returned are settled. Anything above it may have been written since.
    fn is_hole(&self, id: i64) -> bool {
        self.window.contains(id)
            && !self.ids.contains(&id)
            && self.ids.last().is_some_and(|max| id < *max)
    }
}

impl RecordCache {
    pub fn new(store: Arc<dyn RecordStore>, cfg: &EngineConfig) -> Self {
        let capacity = cfg.cache_capacity;
        Self {
            inner: Arc::new(Inner {
                store,
                tables: std::array::from_fn(|_| Cache::new(capacity)),
                fetched: std::array::from_fn(|_| Cache::new(capacity)),
                radius: cfg.prefetch_radius,
                prefetches: AtomicU64::new(0),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.inner.store
    }

    fn table(&self, kind: EntityKind) -> &Cache<i64, Arc<Row>> {
        &self.inner.tables[kind as usize]
    }

    pub fn contains(&self, kind: EntityKind, id: i64) -> bool {
        self.table(kind).contains_key(&id)
    }

    pub fn row(&self, kind: EntityKind, id: i64) -> Result<Arc<Row>> {
        if let Some(row) = self.table(kind).get(&id) {
            return Ok(row);
        }

        if self.known_absent(kind, id) {
            return Err(TrendError::NotFound { kind, id });
        }

        self.prefetch(kind, id)?
            .ok_or(TrendError::NotFound { kind, id })
    }

    pub fn get(&self, kind: EntityKind, id: i64, field: &str) -> Result<Value> {
        if kind.column(field).is_none() {
            return Err(TrendError::UnknownField {
                kind,
                field: field.to_string(),
                suggestion: suggest_field(kind, field),
            });
        }
        let row = self.row(kind, id)?;
        Ok(row.get(field).cloned().unwrap_or(Value::Null))
    }

    /// Stores rows fetched by some other query and hands back the shared copies.
    pub fn absorb(&self, rows: Vec<Row>) -> Vec<Arc<Row>> {
        rows.into_iter()
            .map(|row| {
                let row = Arc::new(row);
                self.table(row.kind).insert(row.id, row.clone());
                row
            })
            .collect()
    }

    /// Number of range queries issued so far.
    pub fn prefetch_count(&self) -> u64 {
        self.inner.prefetches.load(Ordering::Relaxed)
    }

    // A miss inside a loaded window is either an evicted row or a hole.
    fn known_absent(&self, kind: EntityKind, id: i64) -> bool {
        self.inner.fetched[kind as usize]
            .iter()
            .any(|(_, fetched)| fetched.is_hole(id))
    }

    // Hands back the requested row from the query result, not the table:
    // a small cache may already have evicted it.
    fn prefetch(&self, kind: EntityKind, id: i64) -> Result<Option<Arc<Row>>> {
        let window = Window::around(id, self.inner.radius);
        let rows = self.inner.store.fetch_range(kind, window.low, window.high)?;
        self.inner.prefetches.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            event = "cache_prefetch",
            kind = %kind,
            low = window.low,
            high = window.high,
            rows = rows.len(),
        );

        let table = self.table(kind);
        let mut ids = BTreeSet::new();
        let mut wanted = None;
        for row in rows {
            let row = Arc::new(row);
            if row.id == id {
                wanted = Some(row.clone());
            }
            ids.insert(row.id);
            table.insert(row.id, row);
        }
        self.inner.fetched[kind as usize].insert(window.low, Arc::new(Fetched { window, ids }));
        Ok(wanted)
    }
}
