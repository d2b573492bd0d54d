use super::RecordStore;
use crate::config::EngineConfig;
use crate::errors::Result;
use crate::model::{
    Anchor, ComparabilityKey, Direction, EntityKind, MeasurementKind, Row, Value, STATUS_VALID,
};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Clone)]
pub struct SqliteStore {
    pub conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(super::schema::DDL)?;
        Ok(())
    }

    /// Applies connection level settings. A lock held longer than the busy
    /// timeout surfaces as `StoreUnavailable`.
    pub fn configure(&self, cfg: &EngineConfig) -> Result<()> {
        let conn = self.lock();
        conn.busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))?;
        Ok(())
    }

    // The connection stays usable after a panic in another holder.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn select_list(kind: EntityKind, alias: &str) -> String {
    kind.schema()
        .iter()
        .map(|c| format!("{}.{}", alias, c.source))
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_row(kind: EntityKind, row: &rusqlite::Row<'_>) -> Result<Row> {
    let mut raw = BTreeMap::new();
    for (i, def) in kind.schema().iter().enumerate() {
        let value = match row.get_ref(i)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(_) => {
                return Err(crate::errors::TrendError::Schema {
                    kind,
                    column: def.name,
                    detail: "unexpected blob".into(),
                })
            }
        };
        raw.insert(def.name, value);
    }
    Row::new(kind, raw)
}

impl RecordStore for SqliteStore {
    fn fetch_range(&self, kind: EntityKind, low: i64, high: i64) -> Result<Vec<Row>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {} FROM {} t WHERE t.id >= ?1 AND t.id < ?2 ORDER BY t.id",
            select_list(kind, "t"),
            kind.table()
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(params![low, high])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_row(kind, row)?);
        }
        Ok(out)
    }

    fn fetch_candidates(
        &self,
        kind: MeasurementKind,
        key: &ComparabilityKey,
        anchor: Anchor,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<Row>> {
        let entity = kind.entity_kind();
        let (cmp, order) = match direction {
            Direction::Next => (">", "ASC"),
            Direction::Prev => ("<", "DESC"),
        };
        let sql = format!(
            "SELECT {select}
             FROM {table} m
             INNER JOIN awfy_build b ON b.id = m.build_id
             INNER JOIN awfy_run r ON r.id = b.run_id
             WHERE (r.stamp {cmp} ?1 OR (r.stamp = ?1 AND m.id {cmp} ?2)) AND
                   r.machine = ?3 AND
                   b.mode_id = ?4 AND
                   m.{suite} = ?5 AND
                   m.status = ?6
             ORDER BY r.stamp {order}, m.id {order}
             LIMIT ?7",
            select = select_list(entity, "m"),
            table = entity.table(),
            suite = kind.suite_column(),
        );

        let conn = self.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(params![
            anchor.stamp,
            anchor.id,
            key.machine_id,
            key.mode_id,
            key.suite_id,
            STATUS_VALID,
            limit as i64
        ])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_row(entity, row)?);
        }
        Ok(out)
    }

    fn build_ids_for_run(&self, run_id: i64) -> Result<Vec<i64>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached("SELECT id FROM awfy_build WHERE run_id = ?1 ORDER BY id")?;
        let ids = stmt
            .query_map(params![run_id], |r| r.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn measurement_ids_for_build(&self, kind: MeasurementKind, build_id: i64) -> Result<Vec<i64>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT id FROM {} WHERE build_id = ?1 ORDER BY id",
            kind.entity_kind().table()
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let ids = stmt
            .query_map(params![build_id], |r| r.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }
}
