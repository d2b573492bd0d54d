use crate::cache::RecordCache;
use crate::errors::{Result, TrendError};
use crate::model::{EntityKind, Row, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

/// Result of a field lookup: a stored column, or the entity a foreign key
/// points at.
#[derive(Debug, Clone)]
pub enum Field {
    Value(Value),
    Entity(Entity),
}

/// Handle on one cached record.
///
/// Reading a relation (`"build"`, `"run"`, `"machine"`, ...) yields the
/// referenced entity, so call sites chain lookups instead of writing joins:
/// `score.related("build")?.related("run")?.related("machine")?`.
#[derive(Clone)]
pub struct Entity {
    kind: EntityKind,
    id: i64,
    cache: RecordCache,
    state: Arc<State>,
}

#[derive(Default)]
struct State {
    row: OnceLock<Arc<Row>>,
    joins: Mutex<HashMap<&'static str, Entity>>,
}

impl Entity {
    pub fn new(kind: EntityKind, id: i64, cache: RecordCache) -> Self {
        Self {
            kind,
            id,
            cache,
            state: Arc::default(),
        }
    }

    /// Wraps a row that is already in hand, skipping the cache lookup.
    pub(crate) fn with_row(row: Arc<Row>, cache: RecordCache) -> Self {
        let entity = Self::new(row.kind, row.id, cache);
        let _ = entity.state.row.set(row);
        entity
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    fn row(&self) -> Result<&Arc<Row>> {
        if let Some(row) = self.state.row.get() {
            return Ok(row);
        }
        let row = self.cache.row(self.kind, self.id)?;
        Ok(self.state.row.get_or_init(|| row))
    }

    pub fn get(&self, field: &str) -> Result<Field> {
        if self.kind.column(field).is_some() {
            return self.value(field).map(Field::Value);
        }
        self.related(field).map(Field::Entity)
    }

    pub fn value(&self, field: &str) -> Result<Value> {
        if self.kind.column(field).is_none() {
            return Err(self.unknown(field));
        }
        let row = self.row()?;
        Ok(row.get(field).cloned().unwrap_or(Value::Null))
    }

    pub fn related(&self, relation: &str) -> Result<Entity> {
        let (name, target) = self
            .kind
            .relations()
            .iter()
            .find(|r| **r == relation)
            .and_then(|r| self.kind.relation(r).map(|t| (*r, t)))
            .ok_or_else(|| self.unknown(relation))?;

        if let Some(hit) = self.joins().get(name) {
            return Ok(hit.clone());
        }

        let fk = format!("{}_id", name);
        let id = self.int(&fk)?;
        let entity = Entity::new(target, id, self.cache.clone());
        self.joins().insert(name, entity.clone());
        Ok(entity)
    }

    pub fn int(&self, field: &str) -> Result<i64> {
        let value = self.value(field)?;
        value.as_i64().ok_or_else(|| self.mistyped(field, "integer", &value))
    }

    pub fn real(&self, field: &str) -> Result<f64> {
        let value = self.value(field)?;
        value.as_f64().ok_or_else(|| self.mistyped(field, "real", &value))
    }

    pub fn text(&self, field: &str) -> Result<String> {
        let value = self.value(field)?;
        match value {
            Value::Text(s) => Ok(s),
            other => Err(self.mistyped(field, "text", &other)),
        }
    }

    fn joins(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, Entity>> {
        self.state
            .joins
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn unknown(&self, field: &str) -> TrendError {
        TrendError::UnknownField {
            kind: self.kind,
            field: field.to_string(),
            suggestion: suggest_field(self.kind, field),
        }
    }

    fn mistyped(&self, field: &str, expected: &str, got: &Value) -> TrendError {
        let column = self
            .kind
            .column(field)
            .map(|c| c.name)
            .unwrap_or("<unknown>");
        TrendError::Schema {
            kind: self.kind,
            column,
            detail: format!("expected {}, got {:?}", expected, got),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

/// Closest column or relation name, for "did you mean" hints.
pub(crate) fn suggest_field(kind: EntityKind, field: &str) -> Option<&'static str> {
    kind.schema()
        .iter()
        .map(|c| c.name)
        .chain(kind.relations().iter().copied())
        .map(|name| (name, strsim::jaro_winkler(field, name)))
        .filter(|(_, score)| *score >= 0.85)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(name, _)| name)
}
