use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MIN_RING_SIZE: usize = 4;
pub const DEFAULT_SHRINK_INTERVAL: Duration = Duration::from_secs(5);
/// Capacity must exceed the shrink target by more than this many slots
/// before a reallocation is worth doing.
pub const DEFAULT_RECLAIM_THRESHOLD: usize = 16;

/// Tuning knobs for [`LazilyDeallocatedDeque`](crate::LazilyDeallocatedDeque).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DequeConfig {
    /// Capacity of the first ring and of every ring added by `push_front`
    pub min_ring_size: usize,
    /// Minimum time between two shrink evaluations
    #[serde(rename = "shrink_interval_ms", with = "millis")]
    pub shrink_interval: Duration,
    pub reclaim_threshold: usize,
}

impl Default for DequeConfig {
    fn default() -> Self {
        Self {
            min_ring_size: DEFAULT_MIN_RING_SIZE,
            shrink_interval: DEFAULT_SHRINK_INTERVAL,
            reclaim_threshold: DEFAULT_RECLAIM_THRESHOLD,
        }
    }
}

impl DequeConfig {
    pub fn with_min_ring_size(mut self, min_ring_size: usize) -> Self {
        self.min_ring_size = min_ring_size;
        self
    }

    pub fn with_shrink_interval(mut self, shrink_interval: Duration) -> Self {
        self.shrink_interval = shrink_interval;
        self
    }

    pub fn with_reclaim_threshold(mut self, reclaim_threshold: usize) -> Self {
        self.reclaim_threshold = reclaim_threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_ring_size >= 2,
            "min_ring_size must be at least 2 (one slot is always reserved), got {}",
            self.min_ring_size
        );
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
