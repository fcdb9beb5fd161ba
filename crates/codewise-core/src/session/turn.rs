//! Conversation turn types.

use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single appended message in a session.
///
/// Turns are handed out as clones; the stored copy never changes after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    /// 1-based, gap-free position within the session.
    pub sequence_number: u64,
    /// Timestamp when the turn was appended (ISO 8601 format).
    pub created_at: String,
}

/// The `{ role, content }` projection returned by the history query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: TurnRole,
    pub content: String,
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// All turns of one session, in append order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub(crate) fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            turns: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Appends a turn with the next sequence number and returns that number.
    pub(crate) fn push(&mut self, role: TurnRole, content: String) -> u64 {
        let sequence_number = self.turns.len() as u64 + 1;
        self.turns.push(Turn {
            role,
            content,
            sequence_number,
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        sequence_number
    }
}
