use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Database
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection pool settings for the business database queried by the
/// SQL tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite://tabletalk.db?mode=rwc`.
    #[serde(default = "d_url")]
    pub url: String,
    #[serde(default = "d_max_connections")]
    pub max_connections: u32,
    /// How long `acquire` may wait for a free connection before giving up.
    #[serde(default = "d_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: d_url(),
            max_connections: d_max_connections(),
            acquire_timeout_secs: d_acquire_timeout(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_url() -> String {
    "sqlite://tabletalk.db?mode=rwc".into()
}
fn d_max_connections() -> u32 {
    5
}
fn d_acquire_timeout() -> u64 {
    5
}
