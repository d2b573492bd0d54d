use super::measurement::Measurement;
use super::navigator::TrendNavigator;
use crate::errors::Result;
use serde::{Serialize, Serializer};
use std::fmt;

/// Relative movement of a measurement against its history.
///
/// Positive means the weighted average dropped after this point, negative
/// means it rose. `Ratio(f64::INFINITY)` marks a jump away from an all-zero
/// side, where no ratio exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change {
    /// Not enough later results yet to judge.
    Undetermined,
    Ratio(f64),
}

impl Change {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Change::Undetermined => None,
            Change::Ratio(v) => Some(*v),
        }
    }

    pub fn is_undetermined(&self) -> bool {
        matches!(self, Change::Undetermined)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Change::Ratio(v) if v.is_infinite())
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Undetermined => f.write_str("undetermined"),
            Change::Ratio(v) if v.is_infinite() => f.write_str("inf"),
            Change::Ratio(v) => write!(f, "{}", v),
        }
    }
}

// JSON has no infinity; the unbounded case goes out as the string "inf".
impl Serialize for Change {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Change::Undetermined => serializer.serialize_none(),
            Change::Ratio(v) if v.is_infinite() => serializer.serialize_str("inf"),
            Change::Ratio(v) => serializer.serialize_f64(*v),
        }
    }
}

/// Linearly decaying weights, heaviest on the element next to the
/// measurement: `[n, n-1, ..., 1]`.
fn weighted(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sum, weights), (i, v)| {
            let w = (n - i) as f64;
            (sum + v * w, weights + w)
        })
}

/// Weighted before/after comparison.
///
/// `prevs` holds earlier results, nearest first. `nexts` starts with the
/// measurement itself followed by later results, nearest first. Fewer than
/// `runs` entries in `nexts` is undetermined.
pub fn estimate_change(prevs: &[f64], nexts: &[f64], runs: usize) -> Change {
    if nexts.len() < runs {
        return Change::Undetermined;
    }

    let (prev_sum, prev_weights) = weighted(prevs);
    let (next_sum, next_weights) = weighted(nexts);

    if prev_sum == 0.0 && next_sum == 0.0 {
        return Change::Ratio(0.0);
    }
    if prev_sum == 0.0 || next_sum == 0.0 {
        return Change::Ratio(f64::INFINITY);
    }

    let avg_prev = prev_sum / prevs.len() as f64 / prev_weights;
    let avg_next = next_sum / nexts.len() as f64 / next_weights;

    Change::Ratio((avg_prev - avg_next) / avg_prev)
}

/// Gathers the confidence window around `m` and estimates its change.
pub(crate) fn compute(nav: &TrendNavigator, m: &Measurement) -> Result<Change> {
    let runs = m.runs()?;

    let prevs = nav
        .prevs(m, runs)?
        .iter()
        .map(Measurement::score)
        .collect::<Result<Vec<_>>>()?;

    let mut nexts = vec![m.score()?];
    for later in nav.nexts(m, runs - 1)? {
        nexts.push(later.score()?);
    }

    let change = estimate_change(&prevs, &nexts, runs);
    tracing::debug!(
        event = "change_computed",
        measurement = %m.reference(),
        runs,
        prevs = prevs.len(),
        nexts = nexts.len(),
        change = %change,
    );
    Ok(change)
}
