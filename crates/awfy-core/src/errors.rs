use crate::model::EntityKind;
use rusqlite::ErrorCode;

pub type Result<T> = std::result::Result<T, TrendError>;

#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    /// The caller asked for an id the store does not hold. Not retried.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("unknown field '{field}' on {kind}{}", did_you_mean(.suggestion))]
    UnknownField {
        kind: EntityKind,
        field: String,
        suggestion: Option<&'static str>,
    },

    /// Transient store failure (busy, locked, I/O). Callers may retry with backoff.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("schema mismatch on {kind}.{column}: {detail}")]
    Schema {
        kind: EntityKind,
        column: &'static str,
        detail: String,
    },

    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("config error: {0}")]
    Config(String),
}

fn did_you_mean(suggestion: &Option<&'static str>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

impl TrendError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrendError::StoreUnavailable(_))
    }
}

impl From<rusqlite::Error> for TrendError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::CannotOpen
                | ErrorCode::OutOfMemory,
            ) => TrendError::StoreUnavailable(err.to_string()),
            _ => TrendError::Sqlite(err),
        }
    }
}
