//! The tool-calling turn loop.
//!
//! One call per user message: resolve the conversation's remote thread,
//! hand the message to the agent service, dispatch the SQL tool calls it
//! asks for, feed the results back, and repeat until the agent answers
//! or the round ceiling is hit. Progress streams to the HTTP layer over
//! a bounded channel.

use tokio::sync::mpsc;
use tracing::Instrument;

use tt_domain::error::{Error, Result};
use tt_domain::tool::{ToolCall, ToolOutput};
use tt_domain::turn::{TurnInput, TurnOutcome};

use crate::runtime::sql_tool::{self, SqlQueryTool};
use crate::state::AppState;

/// Answer text emitted when the loop reaches its round ceiling without a
/// final answer from the agent.
pub const MAX_ROUNDS_NOTICE: &str = "I could not find an answer within the allowed \
     number of steps. Please try rephrasing your question.";

/// Answer text emitted when the turn fails for any reason other than
/// rate limiting.
pub const NO_ANSWER_FALLBACK: &str =
    "I was unable to produce an answer to that question. Please try again.";

pub struct ChatTurnInput {
    pub conversation_id: String,
    pub query: String,
}

/// Progress events streamed from the turn loop to the response adapter.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A piece of answer text; the adapter accumulates fragments.
    Fragment { text: String },
    /// The agent asked for a tool invocation.
    ToolCall {
        tool_name: String,
        arguments: serde_json::Value,
    },
    /// A tool invocation finished.
    ToolResult { tool_name: String, is_error: bool },
    /// The agent service refused the turn with a rate limit.
    RateLimited { retry_after_secs: Option<u64> },
}

/// Spawn the turn loop and hand back its event stream.
///
/// Failures never surface as channel errors: a rate limit becomes a
/// [`ChatEvent::RateLimited`] and anything else becomes a fallback
/// answer fragment, so the adapter always has something to stream.
pub fn run_chat_turn(state: AppState, input: ChatTurnInput) -> mpsc::Receiver<ChatEvent> {
    let (tx, rx) = mpsc::channel(64);
    let span = tracing::info_span!("chat_turn", conversation_id = %input.conversation_id);
    tokio::spawn(
        async move {
            if let Err(e) = run_chat_turn_inner(state, input, &tx).await {
                match e {
                    Error::RateLimited {
                        message,
                        retry_after,
                    } => {
                        tracing::warn!(message = %message, "agent service rate limited the turn");
                        let _ = tx
                            .send(ChatEvent::RateLimited {
                                retry_after_secs: retry_after.map(|d| d.as_secs()),
                            })
                            .await;
                    }
                    other => {
                        tracing::error!(error = %other, "chat turn failed");
                        let _ = tx
                            .send(ChatEvent::Fragment {
                                text: NO_ANSWER_FALLBACK.to_owned(),
                            })
                            .await;
                    }
                }
            }
        }
        .instrument(span),
    );
    rx
}

async fn run_chat_turn_inner(
    state: AppState,
    input: ChatTurnInput,
    tx: &mpsc::Sender<ChatEvent>,
) -> Result<()> {
    // The whole turn needs the database; bail before touching the agent
    // service if the pool cannot provide a connection.
    let conn = state.db.acquire().await.ok_or(Error::ConnectionUnavailable)?;
    let mut sql = SqlQueryTool::new(conn);

    let thread_id = match state.threads.get(&input.conversation_id) {
        Some(id) => id,
        None => {
            let id = state.agent.create_thread().await?;
            tracing::debug!(thread_id = %id, "created remote thread");
            // Cache before the first round trip: from here the thread is
            // owned by the cache lifecycle even when the turn fails, so
            // eviction or expiry will release it.
            state.threads.put(&input.conversation_id, &id);
            id
        }
    };

    let tools = sql_tool::tool_definitions();
    let mut next_input = TurnInput::user(&input.query);

    for round in 0..state.config.chat.max_tool_rounds {
        let outcome = state.agent.run_turn(&thread_id, next_input, &tools).await?;

        match outcome {
            TurnOutcome::FinalText(text) => {
                if text.trim().is_empty() {
                    // A blank answer usually means the remote thread is in
                    // a bad state; drop it so the next turn starts clean.
                    tracing::warn!("agent returned an empty answer, discarding thread");
                    discard_thread(&state, &input.conversation_id, &thread_id);
                    return Err(Error::Agent("empty final answer".into()));
                }
                let _ = tx.send(ChatEvent::Fragment { text }).await;
                return Ok(());
            }
            TurnOutcome::ToolCalls(calls) => {
                tracing::debug!(round, count = calls.len(), "dispatching tool calls");
                let mut outputs = Vec::with_capacity(calls.len());
                for call in calls {
                    // A closed channel means the client went away; stop
                    // burning agent rounds and release the connection.
                    let sent = tx
                        .send(ChatEvent::ToolCall {
                            tool_name: call.tool_name.clone(),
                            arguments: call.arguments.clone(),
                        })
                        .await;
                    if sent.is_err() {
                        tracing::debug!("event receiver dropped, abandoning turn");
                        return Ok(());
                    }
                    let output = dispatch_tool_call(&mut sql, &call).await;
                    let sent = tx
                        .send(ChatEvent::ToolResult {
                            tool_name: call.tool_name.clone(),
                            is_error: output.is_error,
                        })
                        .await;
                    if sent.is_err() {
                        tracing::debug!("event receiver dropped, abandoning turn");
                        return Ok(());
                    }
                    outputs.push(output);
                }
                next_input = TurnInput::tool_outputs(outputs);
            }
        }
    }

    tracing::warn!(
        max_tool_rounds = state.config.chat.max_tool_rounds,
        "turn loop hit the round ceiling"
    );
    let _ = tx
        .send(ChatEvent::Fragment {
            text: MAX_ROUNDS_NOTICE.to_owned(),
        })
        .await;
    Ok(())
}

/// Execute one tool call. Failures never abort the turn: they come back
/// as error outputs the agent can react to.
async fn dispatch_tool_call(sql: &mut SqlQueryTool, call: &ToolCall) -> ToolOutput {
    if call.tool_name != sql_tool::SQL_TOOL_NAME {
        tracing::warn!(tool = %call.tool_name, "agent requested an unknown tool");
        return ToolOutput::error(
            &call.call_id,
            format!("unknown tool '{}'", call.tool_name),
        );
    }
    let query = match sql_tool::parse_query_argument(&call.arguments) {
        Ok(q) => q,
        Err(e) => return ToolOutput::error(&call.call_id, e.to_string()),
    };
    tracing::debug!(query = %query, "running SQL tool query");
    match sql.run_sql_query(&query).await {
        Ok(rows) => match serde_json::to_string(&rows) {
            Ok(json) => ToolOutput::ok(&call.call_id, json),
            Err(e) => ToolOutput::error(&call.call_id, format!("failed to encode rows: {e}")),
        },
        Err(e) => {
            tracing::warn!(error = %e, "SQL tool query failed");
            ToolOutput::error(&call.call_id, e.to_string())
        }
    }
}

/// Forget a conversation's remote thread after a bad answer: drop the
/// cache entry and delete the thread remotely.
fn discard_thread(state: &AppState, conversation_id: &str, thread_id: &str) {
    state.threads.remove(conversation_id);
    let agent = state.agent.clone();
    let thread_id = thread_id.to_owned();
    tokio::spawn(async move {
        if let Err(e) = agent.delete_thread(&thread_id).await {
            tracing::warn!(thread_id = %thread_id, error = %e, "failed to delete discarded thread");
        }
    });
}
