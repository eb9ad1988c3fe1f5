use std::sync::Arc;

use tt_agents::AgentClient;
use tt_domain::config::Config;

use crate::cache::ThreadCache;
use crate::db::Database;
use crate::telemetry::TelemetrySink;

/// Shared application state passed to all API handlers.
///
/// Constructed once at startup by [`crate::bootstrap::build_app_state`]
/// and cloned per request (all fields are `Arc`s).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Hosted agent service client.
    pub agent: Arc<dyn AgentClient>,
    /// Business database pool; the SQL tool takes one request-scoped
    /// connection per chat turn.
    pub db: Arc<Database>,
    /// Conversation → remote thread cache (LRU + TTL bounded).
    pub threads: Arc<ThreadCache>,
    /// Best-effort completion telemetry.
    pub telemetry: Arc<dyn TelemetrySink>,
}
