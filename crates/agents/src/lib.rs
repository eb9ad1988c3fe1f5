//! Client for the hosted agent service that drives TableTalk's reasoning
//! loop.
//!
//! The gateway consumes the service through the [`AgentClient`] trait;
//! [`HttpAgentClient`] is the production adapter for an agents-style REST
//! API (threads + runs). Errors are classified once here: rate limiting
//! becomes a structured variant with a parsed retry-after hint, so nothing
//! downstream ever re-parses error text.

mod http;
mod traits;
mod util;

pub use http::HttpAgentClient;
pub use traits::AgentClient;
pub use util::parse_retry_after;
