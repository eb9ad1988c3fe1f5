//! The chat runtime: the agent turn loop and the SQL tool it dispatches.

pub mod sql_tool;
pub mod turn;

pub use turn::{run_chat_turn, ChatEvent, ChatTurnInput, MAX_ROUNDS_NOTICE, NO_ANSWER_FALLBACK};
