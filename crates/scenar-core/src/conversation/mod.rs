//! Conversation domain module.
//!
//! - `message`: roles and individual turns
//! - `state`: `ConversationState`, the turn history and first-message flag

mod message;
mod state;

pub use message::{ConversationMessage, MessageRole};
pub use state::{ConversationPhase, ConversationState};
