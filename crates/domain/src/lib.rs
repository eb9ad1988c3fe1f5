//! Shared domain types for TableTalk: the error taxonomy, tool-call and
//! agent-turn shapes, and the configuration tree.

pub mod config;
pub mod error;
pub mod tool;
pub mod turn;
