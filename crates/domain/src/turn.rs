//! Agent-turn shapes: what the gateway sends to the agent service each
//! round trip, and the tagged outcome it gets back.

use serde::{Deserialize, Serialize};

use crate::tool::{ToolCall, ToolOutput};

/// Input for one round trip with the agent service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnInput {
    /// The user's question, opening a turn.
    UserMessage { content: String },
    /// The batched results of the tool calls from the previous response.
    ToolOutputs { outputs: Vec<ToolOutput> },
}

impl TurnInput {
    pub fn user(content: impl Into<String>) -> Self {
        Self::UserMessage {
            content: content.into(),
        }
    }

    pub fn tool_outputs(outputs: Vec<ToolOutput>) -> Self {
        Self::ToolOutputs { outputs }
    }
}

/// What the agent service produced for one round trip.
///
/// Exactly one of: a final assistant message, or a batch of tool calls
/// that must be executed and fed back before the agent continues.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    FinalText(String),
    ToolCalls(Vec<ToolCall>),
}
