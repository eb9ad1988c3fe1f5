use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent service
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection settings for the hosted agent service that drives the
/// reasoning loop (thread creation, turn execution, tool-call requests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentServiceConfig {
    /// Base URL of the agents API (no trailing slash required).
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key. If the env var is unset
    /// the client sends unauthenticated requests (local development).
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Model the agent service should run for this gateway.
    #[serde(default = "d_model")]
    pub model: String,
    /// Per-request timeout for agent calls.
    #[serde(default = "d_timeout")]
    pub timeout_secs: u64,
}

impl Default for AgentServiceConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            api_key_env: d_api_key_env(),
            model: d_model(),
            timeout_secs: d_timeout(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_base_url() -> String {
    "http://127.0.0.1:8085".into()
}
fn d_api_key_env() -> String {
    "TT_AGENT_API_KEY".into()
}
fn d_model() -> String {
    "gpt-4o".into()
}
fn d_timeout() -> u64 {
    120
}
