//! Append-only conversation memory for a single session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

/// One message in the conversation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: Role,
    content: String,
}

impl ConversationTurn {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered history of turns. Grows by append only; there is no eviction.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<ConversationTurn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Record one completed exchange: the question, then the answer.
    pub fn append_exchange(&mut self, human: impl Into<String>, ai: impl Into<String>) {
        self.turns.reserve(2);
        self.turns.push(ConversationTurn::human(human));
        self.turns.push(ConversationTurn::ai(ai));
    }

    /// Contents of every turn joined by newlines, without role labels.
    pub fn serialize(&self) -> String {
        self.turns
            .iter()
            .map(ConversationTurn::content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn all(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
