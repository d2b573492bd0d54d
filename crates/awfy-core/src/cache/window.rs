/// Half-open id window prefetched around a missing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub low: i64,
    pub high: i64,
}

impl Window {
    pub fn around(id: i64, radius: i64) -> Self {
        Self {
            low: id.saturating_sub(radius),
            high: id.saturating_add(radius),
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.low <= id && id < self.high
    }

    pub fn len(&self) -> i64 {
        self.high - self.low
    }
}
