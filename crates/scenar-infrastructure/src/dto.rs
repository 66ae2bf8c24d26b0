//! Persisted record formats.
//!
//! DTOs are separate from the domain models so the on-disk layout can evolve
//! (and be validated) without leaking storage concerns into `scenar-core`.

use scenar_core::conversation::{ConversationMessage, ConversationState};
use scenar_core::error::{Result, ScenarError};
use scenar_core::scenario::RoutingDecision;
use scenar_core::session::{SimulationPhase, SimulationSession};
use serde::{Deserialize, Serialize};

/// Current on-disk version of [`SessionRecord`].
pub const SESSION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTag {
    AwaitingScenario,
    AwaitingConfirmation,
    Active,
}

/// One simulation session as stored in `sessions/<id>.toml`.
///
/// The routing decision is kept as an embedded JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub schema_version: u32,
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub phase: PhaseTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    pub first_message_processed: bool,
    #[serde(default)]
    pub turns: Vec<ConversationMessage>,
}

impl SessionRecord {
    pub fn from_domain(session: &SimulationSession) -> Result<Self> {
        let phase = match &session.phase {
            SimulationPhase::AwaitingScenario => PhaseTag::AwaitingScenario,
            SimulationPhase::AwaitingConfirmation { .. } => PhaseTag::AwaitingConfirmation,
            SimulationPhase::Active { .. } => PhaseTag::Active,
        };
        let decision = session
            .phase
            .decision()
            .map(RoutingDecision::to_json)
            .transpose()?;

        Ok(Self {
            schema_version: SESSION_SCHEMA_VERSION,
            id: session.id.clone(),
            created_at: session.created_at.clone(),
            updated_at: session.updated_at.clone(),
            phase,
            decision,
            first_message_processed: session.conversation.first_message_processed(),
            turns: session.conversation.turns().to_vec(),
        })
    }

    /// Converts back to the domain model, rejecting inconsistent records.
    pub fn into_domain(self) -> Result<SimulationSession> {
        if self.schema_version != SESSION_SCHEMA_VERSION {
            return Err(ScenarError::Serialization {
                format: "TOML".to_string(),
                message: format!(
                    "session '{}' has unsupported schema_version {} (expected {})",
                    self.id, self.schema_version, SESSION_SCHEMA_VERSION
                ),
            });
        }

        let decision = self
            .decision
            .as_deref()
            .map(RoutingDecision::from_json)
            .transpose()?;

        let phase = match (self.phase, decision) {
            (PhaseTag::AwaitingScenario, _) => SimulationPhase::AwaitingScenario,
            (PhaseTag::AwaitingConfirmation, Some(decision)) => {
                SimulationPhase::AwaitingConfirmation { decision }
            }
            (PhaseTag::Active, Some(decision)) => SimulationPhase::Active { decision },
            (tag, None) => {
                return Err(ScenarError::internal(format!(
                    "session '{}' is {:?} but stores no routing decision",
                    self.id, tag
                )));
            }
        };

        let active = matches!(phase, SimulationPhase::Active { .. });
        if active != self.first_message_processed {
            return Err(ScenarError::internal(format!(
                "session '{}' phase {} disagrees with first_message_processed = {}",
                self.id, phase, self.first_message_processed
            )));
        }

        let conversation = ConversationState::restore(self.turns, self.first_message_processed)?;

        Ok(SimulationSession {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            phase,
            conversation,
        })
    }
}
