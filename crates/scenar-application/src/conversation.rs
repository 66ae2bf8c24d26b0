//! The simulation dialogue.

use crate::prompts;
use scenar_core::config::{ConversationSettings, ReplyContract, RetryPolicy};
use scenar_core::conversation::{ConversationPhase, ConversationState};
use scenar_core::error::{Result, ScenarError};
use scenar_core::heuristic::HeuristicDefinition;
use scenar_core::oracle::{Oracle, OracleMessage, OracleReply};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One simulator turn, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReply {
    pub narrative: String,
    pub state_update: Option<String>,
    pub available_actions: Vec<String>,
    /// The text exactly as the oracle returned it; this is what history keeps.
    #[serde(skip)]
    pub raw: String,
}

impl SimulationReply {
    /// Validates a reply against the JSON contract.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        match OracleReply::from_text(text.to_string()) {
            OracleReply::Structured(object) => Self::from_object(&object, text),
            OracleReply::RawText { reason, .. } => Err(reason),
            OracleReply::Failure(err) => Err(err.to_string()),
        }
    }

    /// Takes any text as the narrative.
    pub fn free_text(text: &str) -> Self {
        Self {
            narrative: text.trim().to_string(),
            state_update: None,
            available_actions: Vec::new(),
            raw: text.to_string(),
        }
    }

    fn from_object(object: &Map<String, Value>, raw: &str) -> std::result::Result<Self, String> {
        let narrative = match object.get("narrative") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::String(_)) => return Err("'narrative' is empty".into()),
            Some(_) => return Err("'narrative' must be a string".into()),
            None => return Err("missing required key 'narrative'".into()),
        };
        let state_update = match object.get("state_update") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err("'state_update' must be a string or null".into()),
        };
        let available_actions = match object.get("available_actions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.trim().to_string()),
                    _ => Err("'available_actions' must contain only strings".to_string()),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
            Some(_) => return Err("'available_actions' must be a list of strings".into()),
        };

        Ok(Self {
            narrative,
            state_update,
            available_actions,
            raw: raw.to_string(),
        })
    }
}

/// Drives the oracle through one session's dialogue.
///
/// History is appended only after a reply has been accepted, so a failed,
/// timed-out or cancelled call leaves the state exactly as it was.
pub struct ConversationEngine {
    oracle: Arc<dyn Oracle>,
    system: String,
    contract: ReplyContract,
    policy: RetryPolicy,
    max_pairs: Option<usize>,
    state: ConversationState,
}

impl ConversationEngine {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        heuristic: Option<&HeuristicDefinition>,
        settings: &ConversationSettings,
        policy: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            oracle,
            system: prompts::simulator_directive(heuristic, settings.reply_contract)?,
            contract: settings.reply_contract,
            policy,
            max_pairs: settings.max_turns_retained,
            state: ConversationState::new(),
        })
    }

    /// Continues from a stored state.
    pub fn with_state(mut self, state: ConversationState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn into_state(self) -> ConversationState {
        self.state
    }

    pub fn phase(&self) -> ConversationPhase {
        self.state.phase()
    }

    pub fn system_directive(&self) -> &str {
        &self.system
    }

    /// Sends the seed turn. Only valid before the first successful exchange.
    pub async fn initialize(&mut self, seed_text: &str) -> Result<SimulationReply> {
        if self.state.first_message_processed() {
            return Err(ScenarError::invalid_state(
                "initialize",
                ConversationPhase::Uninitialized.to_string(),
                self.phase().to_string(),
            ));
        }

        let reply = self
            .exchange(vec![OracleMessage::user(seed_text)], seed_text)
            .await?;
        self.state.record_exchange(seed_text, reply.raw.clone());
        tracing::info!(target: "scenar::pipeline", stage = "initialize", "Simulation initialized");
        Ok(reply)
    }

    /// Sends a follow-up turn with the replay window as context.
    pub async fn continue_with(&mut self, turn_text: &str) -> Result<SimulationReply> {
        if !self.state.is_active() {
            return Err(ScenarError::invalid_state(
                "continue",
                ConversationPhase::Active.to_string(),
                self.phase().to_string(),
            ));
        }

        let mut messages: Vec<OracleMessage> = self
            .state
            .replay_window(self.max_pairs)
            .into_iter()
            .map(OracleMessage::from)
            .collect();
        messages.push(OracleMessage::user(turn_text));

        let reply = self.exchange(messages, turn_text).await?;
        self.state.record_exchange(turn_text, reply.raw.clone());
        tracing::debug!(
            target: "scenar::pipeline",
            stage = "turn",
            turns = self.state.len(),
            "Turn recorded"
        );
        Ok(reply)
    }

    /// One accepted reply. Contract violations are re-prompted with the
    /// rejected reply and the reason appended; those extra messages are
    /// never recorded.
    async fn exchange(
        &self,
        messages: Vec<OracleMessage>,
        turn_text: &str,
    ) -> Result<SimulationReply> {
        if self.contract == ReplyContract::FreeText {
            let text = self.oracle.complete(&self.system, &messages).await?;
            return Ok(SimulationReply::free_text(&text));
        }

        let attempts = self.policy.structural_attempts();
        let mut request = messages.clone();
        let mut last_reason = String::new();

        for attempt in 1..=attempts {
            let text = self.oracle.complete(&self.system, &request).await?;
            match SimulationReply::parse(&text) {
                Ok(reply) => return Ok(reply),
                Err(reason) => {
                    tracing::warn!(attempt, attempts, %reason, "Simulation reply broke the JSON contract");
                    request = messages.clone();
                    request.push(OracleMessage::assistant(text));
                    request.push(OracleMessage::user(prompts::reply_retry_query(
                        &reason, turn_text,
                    )));
                    last_reason = reason;
                }
            }
        }

        Err(ScenarError::MalformedReply {
            attempts,
            reason: last_reason,
        })
    }
}
