//! Session memory.
//!
//! # Module Structure
//!
//! - `turn`: conversation types (`TurnRole`, `Turn`, `HistoryEntry`, `ConversationSession`)
//! - `store`: the per-session, append-only [`SessionStore`]

mod store;
mod turn;

pub use store::{ExchangeGuard, SessionStore};
pub use turn::{ConversationSession, HistoryEntry, Turn, TurnRole};
