//! Test doubles shared across gateway tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use tt_agents::AgentClient;
use tt_domain::config::Config;
use tt_domain::error::{Error, Result};
use tt_domain::tool::ToolDefinition;
use tt_domain::turn::{TurnInput, TurnOutcome};

use crate::cache::ThreadCache;
use crate::db::Database;
use crate::state::AppState;
use crate::telemetry::TelemetrySink;

/// Scripted agent double: `run_turn` pops one outcome per call, and
/// every interaction is recorded for assertions.
pub struct ScriptedAgent {
    outcomes: Mutex<VecDeque<Result<TurnOutcome>>>,
    next_thread: AtomicUsize,
    pub created: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub turns: Mutex<Vec<(String, TurnInput)>>,
}

impl ScriptedAgent {
    pub fn new(outcomes: Vec<Result<TurnOutcome>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            next_thread: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            turns: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl AgentClient for ScriptedAgent {
    async fn create_thread(&self) -> Result<String> {
        let id = format!("thread_{}", self.next_thread.fetch_add(1, Ordering::SeqCst));
        self.created.lock().push(id.clone());
        Ok(id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.deleted.lock().push(thread_id.to_owned());
        Ok(())
    }

    async fn run_turn(
        &self,
        thread_id: &str,
        input: TurnInput,
        _tools: &[ToolDefinition],
    ) -> Result<TurnOutcome> {
        self.turns.lock().push((thread_id.to_owned(), input));
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Agent("scripted outcomes exhausted".into())))
    }
}

/// Telemetry sink that records events instead of logging them.
#[derive(Default)]
pub struct RecordingTelemetry {
    pub events: Mutex<Vec<(String, String)>>,
}

impl TelemetrySink for RecordingTelemetry {
    fn record_chat(&self, conversation_id: &str, query: &str) {
        self.events
            .lock()
            .push((conversation_id.to_owned(), query.to_owned()));
    }
}

/// Build a full `AppState` around a scripted agent and a seeded
/// in-memory database.
pub async fn test_state(
    agent: Arc<ScriptedAgent>,
    max_tool_rounds: usize,
) -> (AppState, Arc<RecordingTelemetry>) {
    // In-memory SQLite: the pool must stay at one connection or each
    // checkout would see a different empty database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("CREATE TABLE inspections (site TEXT, score REAL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO inspections VALUES ('north', 92.0), ('south', 77.0)")
        .execute(&pool)
        .await
        .unwrap();
    state_around(agent, max_tool_rounds, pool)
}

/// Same as [`test_state`] but the pool can no longer provide connections.
pub async fn test_state_closed_db(
    agent: Arc<ScriptedAgent>,
) -> (AppState, Arc<RecordingTelemetry>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    pool.close().await;
    state_around(agent, 5, pool)
}

fn state_around(
    agent: Arc<ScriptedAgent>,
    max_tool_rounds: usize,
    pool: SqlitePool,
) -> (AppState, Arc<RecordingTelemetry>) {
    let mut config = Config::default();
    config.chat.max_tool_rounds = max_tool_rounds;
    let telemetry = Arc::new(RecordingTelemetry::default());
    let threads = Arc::new(ThreadCache::new(agent.clone(), &config.thread_cache));
    let state = AppState {
        config: Arc::new(config),
        agent,
        db: Arc::new(Database::from_pool(pool)),
        threads,
        telemetry: telemetry.clone(),
    };
    (state, telemetry)
}
