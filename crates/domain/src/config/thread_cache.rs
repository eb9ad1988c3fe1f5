use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Thread cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bounds for the conversation → remote-thread cache.
///
/// Both limits are fixed at construction: `capacity` drives LRU eviction,
/// `ttl_secs` drives age-based expiry. Every entry removed by either
/// policy has its remote thread deleted asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadCacheConfig {
    #[serde(default = "d_capacity")]
    pub capacity: usize,
    #[serde(default = "d_ttl")]
    pub ttl_secs: u64,
}

impl Default for ThreadCacheConfig {
    fn default() -> Self {
        Self {
            capacity: d_capacity(),
            ttl_secs: d_ttl(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_capacity() -> usize {
    1000
}
fn d_ttl() -> u64 {
    3600
}
