//! TableTalk gateway: the HTTP chat surface, the conversation → remote
//! thread cache, and the SQL tool-calling runtime that drives the hosted
//! agent service.

pub mod api;
pub mod bootstrap;
pub mod cache;
pub mod cli;
pub mod db;
pub mod runtime;
pub mod state;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testutil;
