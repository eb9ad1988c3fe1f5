use tt_domain::error::Result;
use tt_domain::tool::ToolDefinition;
use tt_domain::turn::{TurnInput, TurnOutcome};

/// Trait for the hosted agent service.
///
/// A remote *thread* is the service-side conversation context. The gateway
/// holds thread ids only as references: a thread the gateway no longer
/// tracks must be released with [`delete_thread`](Self::delete_thread).
#[async_trait::async_trait]
pub trait AgentClient: Send + Sync {
    /// Create a new remote conversation thread and return its id.
    async fn create_thread(&self) -> Result<String>;

    /// Delete a remote conversation thread. Best-effort callers log and
    /// ignore failures; the service garbage-collects eventually.
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Run one round trip on a thread: submit the user message or the
    /// previous batch of tool outputs, advertise the available tools, and
    /// return either final text or the next batch of tool calls.
    async fn run_turn(
        &self,
        thread_id: &str,
        input: TurnInput,
        tools: &[ToolDefinition],
    ) -> Result<TurnOutcome>;
}
