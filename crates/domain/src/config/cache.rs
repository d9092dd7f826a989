use serde::{Deserialize, Serialize};

/// Instance-scoped client cache sizing (§3, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "d_max")]
    pub max_entries: usize,
    #[serde(default = "d_ttl_minutes")]
    pub ttl_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: d_max(),
            ttl_minutes: d_ttl_minutes(),
        }
    }
}

fn d_max() -> usize {
    100
}
fn d_ttl_minutes() -> u64 {
    30
}
