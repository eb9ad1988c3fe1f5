//! The `/v1/chat` endpoint and its streamed response envelope.
//!
//! The response is line-delimited JSON: one chunk per answer fragment,
//! each carrying the full accumulated answer so far and terminated by a
//! blank line. Failures after the 200 header has been sent become a
//! `{"error": ...}` line in the stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::runtime::{run_chat_turn, ChatEvent, ChatTurnInput};
use crate::state::AppState;
use crate::telemetry::TelemetrySink;

/// Stands in for the user's question when the request carries a blank
/// one; the agent still gets something to respond to.
pub const EMPTY_QUERY_PLACEHOLDER: &str = "The user sent an empty message.";

/// Streamed error line for failures with no better description.
pub const GENERIC_ERROR_NOTICE: &str = "An error occurred while processing the request.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: Option<String>,
    pub query: Option<String>,
}

/// One line of the streamed response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChunk {
    pub id: String,
    pub model: String,
    pub created: i64,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub messages: Vec<ChunkMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkMessage {
    pub role: String,
    pub content: String,
}

pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Response {
    let Some(conversation_id) = body
        .conversation_id
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
    else {
        return bad_request("conversation_id is required");
    };
    let Some(raw_query) = body.query else {
        return bad_request("query is required");
    };
    let query = if raw_query.trim().is_empty() {
        EMPTY_QUERY_PLACEHOLDER.to_owned()
    } else {
        raw_query
    };

    tracing::info!(conversation_id = %conversation_id, "chat request accepted");

    let rx = run_chat_turn(
        state.clone(),
        ChatTurnInput {
            conversation_id: conversation_id.clone(),
            query: query.clone(),
        },
    );
    let stream = chunk_stream(
        rx,
        state.telemetry.clone(),
        conversation_id,
        query,
        state.config.chat.model_label.clone(),
    );

    (
        [(header::CONTENT_TYPE, "application/json-lines")],
        Body::from_stream(stream),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

/// Adapt turn-loop events into the wire chunks.
///
/// Fragments accumulate: every chunk restates the whole answer so far.
/// A rate limit or encoding failure ends the stream with an error line,
/// and telemetry fires only when the stream finished cleanly.
fn chunk_stream(
    mut rx: mpsc::Receiver<ChatEvent>,
    telemetry: Arc<dyn TelemetrySink>,
    conversation_id: String,
    query: String,
    model_label: String,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    async_stream::stream! {
        let mut answer = String::new();
        let mut errored = false;
        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Fragment { text } => {
                    answer.push_str(&text);
                    match encode_chunk(&model_label, &answer) {
                        Ok(bytes) => yield Ok(bytes),
                        Err(e) => {
                            tracing::error!(error = %e, "failed to encode stream chunk");
                            errored = true;
                            yield Ok(encode_error(GENERIC_ERROR_NOTICE));
                            break;
                        }
                    }
                }
                ChatEvent::RateLimited { retry_after_secs } => {
                    errored = true;
                    yield Ok(encode_error(&rate_limit_notice(retry_after_secs)));
                    break;
                }
                ChatEvent::ToolCall { .. } | ChatEvent::ToolResult { .. } => {
                    // Progress events stay internal; the wire carries
                    // answer text only.
                }
            }
        }
        if !errored {
            telemetry.record_chat(&conversation_id, &query);
        }
    }
}

fn rate_limit_notice(retry_after_secs: Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!("Rate limit is exceeded. Try again in {secs} seconds."),
        None => "Rate limit is exceeded. Try again sometime later.".to_owned(),
    }
}

fn encode_chunk(model_label: &str, answer: &str) -> serde_json::Result<Bytes> {
    let chunk = ChatChunk {
        id: uuid::Uuid::new_v4().to_string(),
        model: model_label.to_owned(),
        created: chrono::Utc::now().timestamp(),
        choices: vec![ChunkChoice {
            messages: vec![ChunkMessage {
                role: "assistant".to_owned(),
                content: answer.to_owned(),
            }],
        }],
    };
    let mut buf = serde_json::to_vec(&chunk)?;
    buf.extend_from_slice(b"\n\n");
    Ok(Bytes::from(buf))
}

fn encode_error(message: &str) -> Bytes {
    let mut line = serde_json::json!({"error": message}).to_string();
    line.push_str("\n\n");
    Bytes::from(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use futures_util::StreamExt;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use tt_domain::turn::{TurnInput, TurnOutcome};

    use crate::api;
    use crate::testutil::{test_state, RecordingTelemetry, ScriptedAgent};

    fn parse_lines(raw: &str) -> Vec<serde_json::Value> {
        raw.split("\n\n")
            .filter(|s| !s.is_empty())
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }

    async fn collect_stream(
        rx: mpsc::Receiver<ChatEvent>,
        telemetry: Arc<RecordingTelemetry>,
    ) -> String {
        let stream = chunk_stream(
            rx,
            telemetry,
            "conv-1".into(),
            "a question".into(),
            "tabletalk".into(),
        );
        let chunks: Vec<_> = stream.collect().await;
        chunks
            .into_iter()
            .map(|c| {
                let bytes = c.unwrap();
                String::from_utf8(bytes.to_vec()).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn fragments_accumulate_into_cumulative_chunks() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(ChatEvent::Fragment {
            text: "The answer".into(),
        })
        .await
        .unwrap();
        tx.send(ChatEvent::Fragment {
            text: " is 42.".into(),
        })
        .await
        .unwrap();
        drop(tx);

        let telemetry = Arc::new(RecordingTelemetry::default());
        let raw = collect_stream(rx, telemetry.clone()).await;

        let lines = parse_lines(&raw);
        assert_eq!(lines.len(), 2);
        let first: ChatChunk = serde_json::from_value(lines[0].clone()).unwrap();
        let second: ChatChunk = serde_json::from_value(lines[1].clone()).unwrap();
        assert_eq!(first.choices[0].messages[0].content, "The answer");
        assert_eq!(second.choices[0].messages[0].content, "The answer is 42.");
        assert_eq!(second.choices[0].messages[0].role, "assistant");
        assert_eq!(second.model, "tabletalk");

        assert_eq!(telemetry.events.lock().len(), 1);
    }

    #[tokio::test]
    async fn rate_limit_becomes_an_error_line_without_telemetry() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(ChatEvent::RateLimited {
            retry_after_secs: Some(50),
        })
        .await
        .unwrap();
        drop(tx);

        let telemetry = Arc::new(RecordingTelemetry::default());
        let raw = collect_stream(rx, telemetry.clone()).await;

        let lines = parse_lines(&raw);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0]["error"],
            "Rate limit is exceeded. Try again in 50 seconds."
        );
        assert!(telemetry.events.lock().is_empty());
    }

    #[tokio::test]
    async fn rate_limit_without_hint_uses_the_vague_notice() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(ChatEvent::RateLimited {
            retry_after_secs: None,
        })
        .await
        .unwrap();
        drop(tx);

        let telemetry = Arc::new(RecordingTelemetry::default());
        let raw = collect_stream(rx, telemetry).await;

        let lines = parse_lines(&raw);
        assert_eq!(
            lines[0]["error"],
            "Rate limit is exceeded. Try again sometime later."
        );
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_conversation_id_is_rejected() {
        let agent = ScriptedAgent::new(vec![]);
        let (state, _telemetry) = test_state(agent, 5).await;
        let app = api::router().with_state(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({"query": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "conversation_id is required");
    }

    #[tokio::test]
    async fn missing_query_is_rejected() {
        let agent = ScriptedAgent::new(vec![]);
        let (state, _telemetry) = test_state(agent, 5).await;
        let app = api::router().with_state(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({"conversation_id": "conv-1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn happy_path_streams_the_answer_and_records_telemetry() {
        let agent = ScriptedAgent::new(vec![Ok(TurnOutcome::FinalText(
            "There were 12 inspections last month.".into(),
        ))]);
        let (state, telemetry) = test_state(agent, 5).await;
        let app = api::router().with_state(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "conversation_id": "conv-1",
                "query": "how many inspections last month?"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json-lines"
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let raw = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(raw.ends_with("\n\n"));

        let lines = parse_lines(&raw);
        assert_eq!(lines.len(), 1);
        let chunk: ChatChunk = serde_json::from_value(lines[0].clone()).unwrap();
        assert_eq!(
            chunk.choices[0].messages[0].content,
            "There were 12 inspections last month."
        );

        let events = telemetry.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "conv-1");
    }

    #[tokio::test]
    async fn blank_query_is_replaced_with_the_placeholder() {
        let agent = ScriptedAgent::new(vec![Ok(TurnOutcome::FinalText("ok".into()))]);
        let (state, _telemetry) = test_state(agent.clone(), 5).await;
        let app = api::router().with_state(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "conversation_id": "conv-1",
                "query": "   "
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // Drain the body so the turn task finishes.
        let _ = response.into_body().collect().await.unwrap();

        let turns = agent.turns.lock();
        match &turns[0].1 {
            TurnInput::UserMessage { content } => {
                assert_eq!(content, EMPTY_QUERY_PLACEHOLDER);
            }
            other => panic!("expected a user message, got {other:?}"),
        }
    }
}
