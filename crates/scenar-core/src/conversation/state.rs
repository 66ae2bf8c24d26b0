//! Per-session conversation state.

use super::message::{ConversationMessage, MessageRole};
use crate::error::{Result, ScenarError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two phases of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// No exchange has completed yet.
    Uninitialized,
    /// The seed exchange succeeded; further turns continue the dialogue.
    Active,
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Ordered turn history plus the first-message flag.
///
/// Turns only ever grow, two at a time (user then assistant), and only through
/// [`ConversationState::record_exchange`]. The flag flips to `true` with the
/// first recorded exchange and never flips back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    turns: Vec<ConversationMessage>,
    first_message_processed: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds state loaded from storage, rejecting histories that could not
    /// have been produced by `record_exchange`.
    pub fn restore(turns: Vec<ConversationMessage>, first_message_processed: bool) -> Result<Self> {
        if !first_message_processed {
            if !turns.is_empty() {
                return Err(ScenarError::internal(format!(
                    "conversation has {} turn(s) but was never initialized",
                    turns.len()
                )));
            }
            return Ok(Self::default());
        }

        if turns.is_empty() || turns.len() % 2 != 0 {
            return Err(ScenarError::internal(format!(
                "conversation history must hold complete user/assistant pairs, found {} turn(s)",
                turns.len()
            )));
        }
        for (i, pair) in turns.chunks(2).enumerate() {
            if pair[0].role != MessageRole::User || pair[1].role != MessageRole::Assistant {
                return Err(ScenarError::internal(format!(
                    "turn pair {i} is not a user/assistant exchange"
                )));
            }
        }

        Ok(Self {
            turns,
            first_message_processed,
        })
    }

    pub fn phase(&self) -> ConversationPhase {
        if self.first_message_processed {
            ConversationPhase::Active
        } else {
            ConversationPhase::Uninitialized
        }
    }

    pub fn is_active(&self) -> bool {
        self.first_message_processed
    }

    pub fn first_message_processed(&self) -> bool {
        self.first_message_processed
    }

    pub fn turns(&self) -> &[ConversationMessage] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Appends one completed exchange and marks the conversation active.
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.reserve(2);
        self.turns.push(ConversationMessage::user(user));
        self.turns.push(ConversationMessage::assistant(assistant));
        self.first_message_processed = true;
    }

    /// The history to replay to the oracle.
    ///
    /// With `max_pairs` set, only the seed pair plus the most recent pairs are
    /// returned, `max_pairs` pairs in total (never fewer than the seed pair).
    pub fn replay_window(&self, max_pairs: Option<usize>) -> Vec<&ConversationMessage> {
        let total_pairs = self.turns.len() / 2;
        let keep = match max_pairs {
            Some(max) if total_pairs > max.max(1) => max.max(1),
            _ => return self.turns.iter().collect(),
        };

        let recent_start = (total_pairs - (keep - 1)) * 2;
        self.turns[..2]
            .iter()
            .chain(self.turns[recent_start..].iter())
            .collect()
    }
}
