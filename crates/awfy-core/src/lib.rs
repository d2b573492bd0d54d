pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod model;
pub mod report;
pub mod storage;
pub mod trend;

pub use errors::{Result, TrendError};
pub use model::{MeasurementKind, MeasurementRef};
pub use trend::{Change, TrendEngine};
