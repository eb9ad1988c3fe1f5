use std::time::Duration;

/// Shared error type used across all TableTalk crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The agent service rejected the request due to quota exhaustion.
    ///
    /// Classified once at the agent-client boundary; `retry_after` is the
    /// parsed "try again in N seconds" hint when the service supplied one.
    #[error("agent service rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// The database pool could not hand out a connection. Fatal to the
    /// current chat turn.
    #[error("no database connection available")]
    ConnectionUnavailable,

    #[error("agent service: {0}")]
    Agent(String),

    #[error("SQL: {0}")]
    Sql(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for the rate-limit variant, regardless of whether a retry
    /// hint was parsed.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}
