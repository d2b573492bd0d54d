use crate::errors::{Result, TrendError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A cache miss for id N prefetches ids N - radius .. N + radius.
    pub prefetch_radius: i64,
    /// How many neighbours one navigation query links at once.
    pub candidate_limit: usize,
    /// Rows kept per entity kind before eviction.
    pub cache_capacity: u64,
    /// Memoized next/prev/change entries kept per measurement kind.
    pub memo_capacity: u64,
    pub busy_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefetch_radius: 100,
            candidate_limit: 10,
            cache_capacity: 10_000,
            memo_capacity: 10_000,
            busy_timeout_ms: 2000,
        }
    }
}

impl EngineConfig {
    /// Environment overrides. Values that do not parse are ignored.
    pub fn apply_env(mut self) -> Self {
        if let Ok(v) = env::var("AWFY_PREFETCH_RADIUS") {
            if let Ok(n) = v.parse() {
                self.prefetch_radius = n;
            }
        }
        if let Ok(v) = env::var("AWFY_CANDIDATE_LIMIT") {
            if let Ok(n) = v.parse() {
                self.candidate_limit = n;
            }
        }
        if let Ok(v) = env::var("AWFY_CACHE_CAPACITY") {
            if let Ok(n) = v.parse() {
                self.cache_capacity = n;
            }
        }
        if let Ok(v) = env::var("AWFY_MEMO_CAPACITY") {
            if let Ok(n) = v.parse() {
                self.memo_capacity = n;
            }
        }
        if let Ok(v) = env::var("AWFY_BUSY_TIMEOUT_MS") {
            if let Ok(n) = v.parse() {
                self.busy_timeout_ms = n;
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefetch_radius < 1 {
            return Err(TrendError::Config(format!(
                "prefetch_radius must be >= 1, got {}",
                self.prefetch_radius
            )));
        }
        if self.candidate_limit < 1 {
            return Err(TrendError::Config(format!(
                "candidate_limit must be >= 1, got {}",
                self.candidate_limit
            )));
        }
        if self.cache_capacity < 1 || self.memo_capacity < 1 {
            return Err(TrendError::Config(format!(
                "cache capacities must be >= 1, got cache={} memo={}",
                self.cache_capacity, self.memo_capacity
            )));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path, strict: bool) -> Result<EngineConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        TrendError::Config(format!("failed to read config {}: {}", path.display(), e))
    })?;

    let mut ignored_keys = BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);
    let cfg: EngineConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| TrendError::Config(format!("failed to parse YAML: {}", e)))?;

    if !ignored_keys.is_empty() {
        if strict {
            return Err(TrendError::Config(format!(
                "Unknown fields detected in strict mode: {:?} (file: {})",
                ignored_keys,
                path.display()
            )));
        }
        tracing::warn!(
            event = "config_unknown_fields",
            fields = ?ignored_keys,
            file = %path.display(),
        );
    }

    cfg.validate()?;
    Ok(cfg)
}
