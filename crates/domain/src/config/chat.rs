use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Behavior of the chat turn loop and the streamed response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum agent/tool round trips per user turn before the loop
    /// stops and emits the iteration-ceiling notice.
    #[serde(default = "d_max_tool_rounds")]
    pub max_tool_rounds: usize,
    /// Fixed `model` label stamped on every streamed chunk.
    #[serde(default = "d_model_label")]
    pub model_label: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: d_max_tool_rounds(),
            model_label: d_model_label(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_max_tool_rounds() -> usize {
    5
}
fn d_model_label() -> String {
    "tabletalk".into()
}
