//! Startup wiring: validate config, build the shared state.

use std::sync::Arc;

use anyhow::{bail, Context};

use tt_agents::{AgentClient, HttpAgentClient};
use tt_domain::config::{Config, ConfigSeverity};

use crate::cache::ThreadCache;
use crate::db::Database;
use crate::state::AppState;
use crate::telemetry::{LogTelemetry, TelemetrySink};

/// Build the application state or fail with the first hard config error.
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ───────────────────────────────────────────
    let issues = config.validate();
    let mut fatal = false;
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Error => {
                fatal = true;
                tracing::error!(field = %issue.field, "{}", issue.message);
            }
            ConfigSeverity::Warning => {
                tracing::warn!(field = %issue.field, "{}", issue.message);
            }
        }
    }
    if fatal {
        bail!("configuration has errors, refusing to start");
    }

    // ── Agent service client ────────────────────────────────────────
    let agent: Arc<dyn AgentClient> = Arc::new(
        HttpAgentClient::from_config(&config.agent_service)
            .context("initializing agent service client")?,
    );
    tracing::info!(
        base_url = %config.agent_service.base_url,
        model = %config.agent_service.model,
        "agent service client ready"
    );

    // ── Database pool ───────────────────────────────────────────────
    let db = Arc::new(
        Database::connect(&config.database)
            .await
            .context("connecting business database")?,
    );
    tracing::info!(url = %config.database.url, "database pool ready");

    // ── Thread cache ────────────────────────────────────────────────
    let threads = Arc::new(ThreadCache::new(agent.clone(), &config.thread_cache));
    tracing::info!(
        capacity = config.thread_cache.capacity,
        ttl_secs = config.thread_cache.ttl_secs,
        "thread cache ready"
    );

    let telemetry: Arc<dyn TelemetrySink> = Arc::new(LogTelemetry);

    Ok(AppState {
        config,
        agent,
        db,
        threads,
        telemetry,
    })
}
