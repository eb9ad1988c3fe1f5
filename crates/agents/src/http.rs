//! HTTP adapter for an agents-style REST API.
//!
//! Wire contract (threads + runs):
//! - `POST   {base}/v1/threads`            → `{"id": "<thread id>"}`
//! - `DELETE {base}/v1/threads/{id}`       → 2xx
//! - `POST   {base}/v1/threads/{id}/runs`  → a completed run whose `output`
//!   items are either assistant messages or tool-call requests.
//!
//! A 429 from any endpoint is classified as [`Error::RateLimited`] with the
//! retry-after hint parsed out of the body once, here.

use serde::Deserialize;
use serde_json::Value;

use tt_domain::config::AgentServiceConfig;
use tt_domain::error::{Error, Result};
use tt_domain::tool::{ToolCall, ToolDefinition};
use tt_domain::turn::{TurnInput, TurnOutcome};

use crate::traits::AgentClient;
use crate::util::{from_reqwest, parse_retry_after};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Production [`AgentClient`] backed by reqwest.
pub struct HttpAgentClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl HttpAgentClient {
    /// Create a client from the deserialized agent-service config.
    ///
    /// The API key is read from the configured env var once at startup;
    /// when unset, requests go out unauthenticated (local development).
    pub fn from_config(cfg: &AgentServiceConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!(
                env = %cfg.api_key_env,
                "agent service API key not set, sending unauthenticated requests"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: cfg.model.clone(),
            client,
        })
    }

    // ── Internal: request plumbing ─────────────────────────────────

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }

    /// Map a non-success response to a classified error, consuming it.
    async fn classify_failure(resp: reqwest::Response) -> Error {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(&body);
            Error::RateLimited {
                message: body,
                retry_after,
            }
        } else {
            Error::Agent(format!("{status}: {body}"))
        }
    }

    fn build_run_body(&self, input: &TurnInput, tools: &[ToolDefinition]) -> Value {
        serde_json::json!({
            "model": self.model,
            "input": input,
            "tools": tools,
            "tool_choice": "auto",
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(default)]
    output: Vec<RunOutputItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RunOutputItem {
    Message {
        #[serde(default)]
        content: String,
    },
    ToolCall {
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: Value,
    },
}

/// Fold run output items into a [`TurnOutcome`].
///
/// Any tool-call item makes the whole response a tool-call turn; message
/// fragments are concatenated otherwise.
fn outcome_from_output(output: Vec<RunOutputItem>) -> TurnOutcome {
    let mut text = String::new();
    let mut calls = Vec::new();
    for item in output {
        match item {
            RunOutputItem::Message { content } => text.push_str(&content),
            RunOutputItem::ToolCall {
                call_id,
                name,
                arguments,
            } => calls.push(ToolCall {
                call_id,
                tool_name: name,
                arguments,
            }),
        }
    }
    if calls.is_empty() {
        TurnOutcome::FinalText(text)
    } else {
        TurnOutcome::ToolCalls(calls)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AgentClient impl
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl AgentClient for HttpAgentClient {
    async fn create_thread(&self) -> Result<String> {
        let url = format!("{}/v1/threads", self.base_url);
        let resp = self
            .authed(self.client.post(&url))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(from_reqwest)?;
        if !resp.status().is_success() {
            return Err(Self::classify_failure(resp).await);
        }
        let thread: ThreadResponse = resp.json().await.map_err(from_reqwest)?;
        tracing::debug!(thread_id = %thread.id, "remote thread created");
        Ok(thread.id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let url = format!("{}/v1/threads/{thread_id}", self.base_url);
        let resp = self
            .authed(self.client.delete(&url))
            .send()
            .await
            .map_err(from_reqwest)?;
        if !resp.status().is_success() {
            return Err(Self::classify_failure(resp).await);
        }
        tracing::debug!(thread_id = %thread_id, "remote thread deleted");
        Ok(())
    }

    async fn run_turn(
        &self,
        thread_id: &str,
        input: TurnInput,
        tools: &[ToolDefinition],
    ) -> Result<TurnOutcome> {
        let url = format!("{}/v1/threads/{thread_id}/runs", self.base_url);
        let body = self.build_run_body(&input, tools);
        let resp = self
            .authed(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;
        if !resp.status().is_success() {
            return Err(Self::classify_failure(resp).await);
        }
        let run: RunResponse = resp.json().await.map_err(from_reqwest)?;
        Ok(outcome_from_output(run.output))
    }
}
