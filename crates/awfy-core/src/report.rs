use crate::errors::Result;
use crate::model::{MeasurementKind, MeasurementRef};
use crate::trend::{Change, Measurement, TrendNavigator};
use chrono::DateTime;
use serde::Serialize;
use std::fmt;

/// One dashboard line: where a measurement sits and how it moved.
#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    pub measurement: MeasurementRef,
    pub stamp: String,
    pub machine: String,
    pub mode: String,
    pub suite: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    pub change: Change,
    pub prev_score: Option<f64>,
    pub score: f64,
    pub runs: usize,
    pub noise: f64,
}

impl TrendSummary {
    pub fn collect(nav: &TrendNavigator, m: &Measurement) -> Result<Self> {
        let (suite, test) = match m.kind() {
            MeasurementKind::Score => (m.suite()?.text("name")?, None),
            MeasurementKind::Breakdown => {
                let test = m.suite()?;
                (
                    test.related("suite_version")?.text("name")?,
                    Some(test.text("name")?),
                )
            }
        };

        let prev_score = match nav.prev(m)? {
            Some(prev) => Some(prev.score()?),
            None => None,
        };

        Ok(Self {
            measurement: m.reference(),
            stamp: format_stamp(m.stamp()?),
            machine: m.machine()?.text("description")?,
            mode: m.mode()?.text("name")?,
            suite,
            test,
            change: nav.change(m)?,
            prev_score,
            score: m.score()?,
            runs: m.runs()?,
            noise: m.noise()?,
        })
    }
}

fn format_stamp(stamp: i64) -> String {
    match DateTime::from_timestamp(stamp, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => stamp.to_string(),
    }
}

impl fmt::Display for TrendSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}  {}  {}", self.stamp, self.machine, self.mode, self.suite)?;
        if let Some(test) = &self.test {
            write!(f, ":{}", test)?;
        }
        write!(f, ": {}  ", self.change)?;
        if let Some(prev) = self.prev_score {
            write!(f, "{} ", prev)?;
        }
        write!(f, "{}  ({} runs, {:?})", self.score, self.runs, self.noise)
    }
}
