//! Shared helpers for the agent-service adapter.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use tt_domain::error::Error;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Extract a "try again in N seconds" hint from a rate-limit message.
///
/// Returns `None` when the message carries no parseable duration; callers
/// then fall back to a generic phrasing.
pub fn parse_retry_after(message: &str) -> Option<Duration> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)try again in (\d+) second").expect("retry-after pattern is valid")
    });
    let secs: u64 = re.captures(message)?.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_secs(secs))
}
