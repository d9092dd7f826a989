use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub clears: u64,
    pub size: usize,
    pub high_water: usize,
    pub last_reset: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub clears: u64,
    pub high_water: usize,
    pub last_reset: Option<DateTime<Utc>>,
}

impl CacheMetrics {
    pub fn record_size(&mut self, size: usize) {
        if size > self.high_water {
            self.high_water = size;
        }
    }

    pub fn snapshot(&self, current_size: usize) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits,
            misses: self.misses,
            sets: self.sets,
            evictions: self.evictions,
            clears: self.clears,
            size: current_size,
            high_water: self.high_water,
            last_reset: self.last_reset,
        }
    }

    pub fn reset(&mut self) {
        *self = CacheMetrics {
            last_reset: Some(Utc::now()),
            ..Default::default()
        };
    }
}
