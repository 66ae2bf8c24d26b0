//! Simulation session domain model.
//!
//! A session pairs the conversation state with the phase of the
//! first-message / confirmation / simulation flow. This is the storage
//! independent model; repositories map it to their own record format.

use crate::conversation::ConversationState;
use crate::scenario::RoutingDecision;
use std::fmt;

/// Where a session is in the route → confirm → simulate flow.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SimulationPhase {
    /// The next message is a new scenario to route.
    #[default]
    AwaitingScenario,
    /// A routed scenario is waiting for the user to confirm or cancel.
    AwaitingConfirmation { decision: RoutingDecision },
    /// The simulation is running on the confirmed decision.
    Active { decision: RoutingDecision },
}

impl SimulationPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingScenario => "awaiting_scenario",
            Self::AwaitingConfirmation { .. } => "awaiting_confirmation",
            Self::Active { .. } => "active",
        }
    }

    /// The pending or confirmed decision, if any.
    pub fn decision(&self) -> Option<&RoutingDecision> {
        match self {
            Self::AwaitingScenario => None,
            Self::AwaitingConfirmation { decision } | Self::Active { decision } => Some(decision),
        }
    }
}

impl fmt::Display for SimulationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One user simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSession {
    /// Unique session identifier (UUID format unless chosen by the caller)
    pub id: String,
    /// Timestamp when the session was created (RFC 3339)
    pub created_at: String,
    /// Timestamp of the last saved mutation (RFC 3339)
    pub updated_at: String,
    pub phase: SimulationPhase,
    pub conversation: ConversationState,
}

impl SimulationSession {
    pub fn new(id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            created_at: now.clone(),
            updated_at: now,
            phase: SimulationPhase::AwaitingScenario,
            conversation: ConversationState::new(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
