//! Best-effort telemetry for completed chat turns.
//!
//! The sink is fire-and-forget by contract: implementations must never
//! fail or block the response path.

/// Sink for completed-chat events.
pub trait TelemetrySink: Send + Sync {
    /// Record a successfully completed chat turn.
    fn record_chat(&self, conversation_id: &str, query: &str);
}

/// Default sink: a structured tracing event.
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn record_chat(&self, conversation_id: &str, query: &str) {
        tracing::info!(
            target: "tabletalk::telemetry",
            conversation_id = %conversation_id,
            query = %query,
            "chat completed"
        );
    }
}
