use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Every table the engine reads. Relations and column shapes are declared
/// here once so lookups never depend on string munging of field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Machine,
    Mode,
    Suite,
    SuiteVersion,
    SuiteTest,
    Run,
    Build,
    Score,
    Breakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    /// Name exposed through the accessor.
    pub name: &'static str,
    /// Name of the SQL column backing it.
    pub source: &'static str,
    pub ty: ColumnType,
}

const fn col(name: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef {
        name,
        source: name,
        ty,
    }
}

use ColumnType::{Integer, Real, Text};

const MACHINE: &[ColumnDef] = &[
    col("id", Integer),
    col("description", Text),
    col("confidence_runs", Integer),
];
const MODE: &[ColumnDef] = &[col("id", Integer), col("name", Text)];
const SUITE: &[ColumnDef] = &[col("id", Integer), col("name", Text)];
const SUITE_VERSION: &[ColumnDef] = &[
    col("id", Integer),
    col("name", Text),
    col("confidence_factor", Real),
    col("suite_id", Integer),
];
const SUITE_TEST: &[ColumnDef] = &[
    col("id", Integer),
    col("name", Text),
    col("confidence_factor", Real),
    col("noise", Real),
    col("suite_version_id", Integer),
];
// awfy_run predates the *_id naming convention.
const RUN: &[ColumnDef] = &[
    col("id", Integer),
    col("stamp", Integer),
    ColumnDef {
        name: "machine_id",
        source: "machine",
        ty: Integer,
    },
];
const BUILD: &[ColumnDef] = &[
    col("id", Integer),
    col("run_id", Integer),
    col("mode_id", Integer),
];
const SCORE: &[ColumnDef] = &[
    col("id", Integer),
    col("build_id", Integer),
    col("suite_version_id", Integer),
    col("score", Real),
    col("status", Integer),
];
const BREAKDOWN: &[ColumnDef] = &[
    col("id", Integer),
    col("build_id", Integer),
    col("suite_test_id", Integer),
    col("score", Real),
    col("status", Integer),
];

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Machine,
        EntityKind::Mode,
        EntityKind::Suite,
        EntityKind::SuiteVersion,
        EntityKind::SuiteTest,
        EntityKind::Run,
        EntityKind::Build,
        EntityKind::Score,
        EntityKind::Breakdown,
    ];

    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Machine => "awfy_machine",
            EntityKind::Mode => "awfy_mode",
            EntityKind::Suite => "awfy_suite",
            EntityKind::SuiteVersion => "awfy_suite_version",
            EntityKind::SuiteTest => "awfy_suite_test",
            EntityKind::Run => "awfy_run",
            EntityKind::Build => "awfy_build",
            EntityKind::Score => "awfy_score",
            EntityKind::Breakdown => "awfy_breakdown",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Machine => "machine",
            EntityKind::Mode => "mode",
            EntityKind::Suite => "suite",
            EntityKind::SuiteVersion => "suite_version",
            EntityKind::SuiteTest => "suite_test",
            EntityKind::Run => "run",
            EntityKind::Build => "build",
            EntityKind::Score => "score",
            EntityKind::Breakdown => "breakdown",
        }
    }

    pub fn schema(self) -> &'static [ColumnDef] {
        match self {
            EntityKind::Machine => MACHINE,
            EntityKind::Mode => MODE,
            EntityKind::Suite => SUITE,
            EntityKind::SuiteVersion => SUITE_VERSION,
            EntityKind::SuiteTest => SUITE_TEST,
            EntityKind::Run => RUN,
            EntityKind::Build => BUILD,
            EntityKind::Score => SCORE,
            EntityKind::Breakdown => BREAKDOWN,
        }
    }

    pub fn column(self, name: &str) -> Option<&'static ColumnDef> {
        self.schema().iter().find(|c| c.name == name)
    }

    /// Relation name to target kind. The foreign key column is always
    /// `<relation>_id`.
    pub fn relation(self, name: &str) -> Option<EntityKind> {
        match (self, name) {
            (EntityKind::SuiteVersion, "suite") => Some(EntityKind::Suite),
            (EntityKind::SuiteTest, "suite_version") => Some(EntityKind::SuiteVersion),
            (EntityKind::Run, "machine") => Some(EntityKind::Machine),
            (EntityKind::Build, "run") => Some(EntityKind::Run),
            (EntityKind::Build, "mode") => Some(EntityKind::Mode),
            (EntityKind::Score, "build") => Some(EntityKind::Build),
            (EntityKind::Score, "suite_version") => Some(EntityKind::SuiteVersion),
            (EntityKind::Breakdown, "build") => Some(EntityKind::Build),
            (EntityKind::Breakdown, "suite_test") => Some(EntityKind::SuiteTest),
            _ => None,
        }
    }

    pub fn relations(self) -> &'static [&'static str] {
        match self {
            EntityKind::SuiteVersion => &["suite"],
            EntityKind::SuiteTest => &["suite_version"],
            EntityKind::Run => &["machine"],
            EntityKind::Build => &["run", "mode"],
            EntityKind::Score => &["build", "suite_version"],
            EntityKind::Breakdown => &["build", "suite_test"],
            EntityKind::Machine | EntityKind::Mode | EntityKind::Suite => &[],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to reals; sqlite happily stores `1` in a REAL column.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A row already checked against its kind's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: EntityKind,
    pub id: i64,
    fields: BTreeMap<&'static str, Value>,
}

impl Row {
    /// Builds a row from raw column values, rejecting anything the schema
    /// does not allow.
    pub fn new(
        kind: EntityKind,
        mut raw: BTreeMap<&'static str, Value>,
    ) -> crate::errors::Result<Self> {
        let mut fields = BTreeMap::new();
        for def in kind.schema() {
            let value = raw.remove(def.name).unwrap_or(Value::Null);
            let value = match (def.ty, value) {
                (_, Value::Null) => Value::Null,
                (ColumnType::Integer, v @ Value::Integer(_)) => v,
                (ColumnType::Real, Value::Integer(i)) => Value::Real(i as f64),
                (ColumnType::Real, v @ Value::Real(_)) => v,
                (ColumnType::Text, v @ Value::Text(_)) => v,
                (ty, other) => {
                    return Err(crate::errors::TrendError::Schema {
                        kind,
                        column: def.name,
                        detail: format!("expected {:?}, got {:?}", ty, other),
                    })
                }
            };
            fields.insert(def.name, value);
        }

        let id = fields
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| crate::errors::TrendError::Schema {
                kind,
                column: "id",
                detail: "missing primary key".into(),
            })?;

        Ok(Self { kind, id, fields })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    Score,
    Breakdown,
}

impl MeasurementKind {
    pub fn entity_kind(self) -> EntityKind {
        match self {
            MeasurementKind::Score => EntityKind::Score,
            MeasurementKind::Breakdown => EntityKind::Breakdown,
        }
    }

    /// Relation that carries the suite identity and the confidence factor.
    pub fn suite_relation(self) -> &'static str {
        match self {
            MeasurementKind::Score => "suite_version",
            MeasurementKind::Breakdown => "suite_test",
        }
    }

    pub fn suite_column(self) -> &'static str {
        match self {
            MeasurementKind::Score => "suite_version_id",
            MeasurementKind::Breakdown => "suite_test_id",
        }
    }
}

/// Scores and breakdowns live in separate tables, so an id alone is ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeasurementRef {
    pub kind: MeasurementKind,
    pub id: i64,
}

impl MeasurementRef {
    pub fn score(id: i64) -> Self {
        Self {
            kind: MeasurementKind::Score,
            id,
        }
    }

    pub fn breakdown(id: i64) -> Self {
        Self {
            kind: MeasurementKind::Breakdown,
            id,
        }
    }
}

impl fmt::Display for MeasurementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.entity_kind(), self.id)
    }
}

/// Which measurements may be compared chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComparabilityKey {
    pub machine_id: i64,
    pub mode_id: i64,
    /// suite_version_id for scores, suite_test_id for breakdowns.
    pub suite_id: i64,
}

/// Position of a measurement in its series. Equal stamps are ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Anchor {
    pub stamp: i64,
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Next => Direction::Prev,
            Direction::Prev => Direction::Next,
        }
    }
}

pub const STATUS_VALID: i64 = 1;
