//! Session-level use case: route → confirm → simulate.
//!
//! Each session is cached in memory behind its own mutex, so turns of one
//! session are strictly sequential while different sessions proceed in
//! parallel. Every oracle-bound step is raced against the session's
//! cancellation token, and the session is saved after each change.

use crate::catalog_service::CatalogService;
use crate::conversation::{ConversationEngine, SimulationReply};
use crate::router::ScenarioRouter;
use scenar_core::config::EngineConfig;
use scenar_core::conversation::ConversationMessage;
use scenar_core::error::{Result, ScenarError};
use scenar_core::heuristic::HeuristicCatalog;
use scenar_core::oracle::{Oracle, OracleError};
use scenar_core::scenario::RoutingDecision;
use scenar_core::session::{SessionRepository, SimulationPhase, SimulationSession};
use scenar_interaction::with_retry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// What [`SimulationService::handle_message`] did with a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// The message was a new scenario; it now awaits confirmation.
    Routed(RoutingDecision),
    /// The message continued the running simulation.
    Reply(SimulationReply),
}

struct SessionHandle {
    cancel: CancellationToken,
    session: Mutex<SimulationSession>,
}

impl SessionHandle {
    fn new(session: SimulationSession) -> Arc<Self> {
        Arc::new(Self {
            cancel: CancellationToken::new(),
            session: Mutex::new(session),
        })
    }
}

pub struct SimulationService {
    oracle: Arc<dyn Oracle>,
    config: EngineConfig,
    router: ScenarioRouter,
    catalog: Arc<CatalogService>,
    repository: Arc<dyn SessionRepository>,
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
}

impl SimulationService {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        config: EngineConfig,
        catalog: Arc<CatalogService>,
        repository: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            router: ScenarioRouter::from_config(oracle.clone(), &config),
            oracle: with_retry(oracle, config.retry.conversation),
            config,
            catalog,
            repository,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.catalog
    }

    pub async fn reload_catalog(&self) -> Result<Arc<HeuristicCatalog>> {
        self.catalog.reload().await
    }

    /// Creates and stores a new session. A generated UUID is used when no id
    /// is given.
    pub async fn open_session(&self, session_id: Option<String>) -> Result<String> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session_id)
            || self.repository.find_by_id(&session_id).await?.is_some()
        {
            return Err(ScenarError::config(format!(
                "session '{session_id}' already exists"
            )));
        }

        let session = SimulationSession::new(session_id.clone());
        self.repository.save(&session).await?;
        sessions.insert(session_id.clone(), SessionHandle::new(session));
        tracing::info!(session_id = %session_id, "Session opened");
        Ok(session_id)
    }

    /// Loads a stored session into memory and returns its phase.
    pub async fn resume_session(&self, session_id: &str) -> Result<SimulationPhase> {
        let handle = self.handle(session_id).await?;
        let session = handle.session.lock().await;
        tracing::info!(
            session_id = %session_id,
            phase = %session.phase,
            turns = session.conversation.len(),
            "Session resumed"
        );
        Ok(session.phase.clone())
    }

    /// Routes a new scenario and holds the decision for confirmation.
    pub async fn route_scenario(&self, session_id: &str, text: &str) -> Result<RoutingDecision> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.session.lock().await;
        Self::ensure_open(&handle)?;

        if !matches!(session.phase, SimulationPhase::AwaitingScenario) {
            return Err(ScenarError::invalid_state(
                "route_scenario",
                "awaiting_scenario",
                session.phase.name(),
            ));
        }

        let catalog = self.catalog.snapshot().await;
        let decision = guarded(&handle.cancel, self.router.route(&catalog, text)).await?;

        session.phase = SimulationPhase::AwaitingConfirmation {
            decision: decision.clone(),
        };
        self.persist(&mut session).await?;
        Ok(decision)
    }

    /// Starts the simulation on the pending decision.
    ///
    /// On failure the decision stays pending, so confirming again is safe.
    pub async fn confirm_and_initialize(&self, session_id: &str) -> Result<SimulationReply> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.session.lock().await;
        Self::ensure_open(&handle)?;

        let SimulationPhase::AwaitingConfirmation { decision } = &session.phase else {
            return Err(ScenarError::invalid_state(
                "confirm_and_initialize",
                "awaiting_confirmation",
                session.phase.name(),
            ));
        };
        let decision = decision.clone();

        let catalog = self.catalog.snapshot().await;
        let heuristic = catalog.lookup(&decision.heuristic)?;
        let mut engine = ConversationEngine::new(
            self.oracle.clone(),
            Some(heuristic),
            &self.config.conversation,
            self.config.retry.conversation,
        )?
        .with_state(session.conversation.clone());

        let seed = decision.seed_text(&heuristic.reasoning_prompt());
        let reply = guarded(&handle.cancel, engine.initialize(&seed)).await?;

        session.conversation = engine.into_state();
        session.phase = SimulationPhase::Active { decision };
        self.persist(&mut session).await?;
        Ok(reply)
    }

    /// Drops the pending decision, returning it so its text can be edited.
    ///
    /// Without a pending decision (nothing routed yet, or the simulation
    /// already running) the session is left as is and `None` is returned.
    pub async fn cancel(&self, session_id: &str) -> Result<Option<RoutingDecision>> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.session.lock().await;

        let SimulationPhase::AwaitingConfirmation { decision } = &session.phase else {
            tracing::debug!(session_id = %session_id, phase = %session.phase, "Nothing to cancel");
            return Ok(None);
        };
        let decision = decision.clone();

        session.phase = SimulationPhase::AwaitingScenario;
        self.persist(&mut session).await?;
        tracing::info!(session_id = %session_id, "Pending scenario cancelled");
        Ok(Some(decision))
    }

    /// Continues the running simulation with one user turn.
    pub async fn send_turn(&self, session_id: &str, text: &str) -> Result<SimulationReply> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.session.lock().await;
        Self::ensure_open(&handle)?;
        self.continue_locked(&handle, &mut session, text).await
    }

    /// Dispatches a message by phase: a new scenario is routed, a running
    /// simulation is continued. A pending confirmation must be answered
    /// first.
    pub async fn handle_message(&self, session_id: &str, text: &str) -> Result<MessageOutcome> {
        let phase = {
            let handle = self.handle(session_id).await?;
            let session = handle.session.lock().await;
            session.phase.name()
        };

        match phase {
            "awaiting_scenario" => self
                .route_scenario(session_id, text)
                .await
                .map(MessageOutcome::Routed),
            "active" => self
                .send_turn(session_id, text)
                .await
                .map(MessageOutcome::Reply),
            other => Err(ScenarError::invalid_state(
                "handle_message",
                "awaiting_scenario or active",
                other,
            )),
        }
    }

    pub async fn phase(&self, session_id: &str) -> Result<SimulationPhase> {
        let handle = self.handle(session_id).await?;
        let session = handle.session.lock().await;
        Ok(session.phase.clone())
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<ConversationMessage>> {
        let handle = self.handle(session_id).await?;
        let session = handle.session.lock().await;
        Ok(session.conversation.turns().to_vec())
    }

    /// Cancels any in-flight call and evicts the session from memory. The
    /// stored copy is kept. Returns whether the session was loaded.
    pub async fn close_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(handle) => {
                handle.cancel.cancel();
                tracing::info!(session_id = %session_id, "Session closed");
                true
            }
            None => false,
        }
    }

    /// Closes the session and removes its stored copy.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.close_session(session_id).await;
        self.repository.delete(session_id).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<SimulationSession>> {
        self.repository.list_all().await
    }

    async fn continue_locked(
        &self,
        handle: &SessionHandle,
        session: &mut SimulationSession,
        text: &str,
    ) -> Result<SimulationReply> {
        let SimulationPhase::Active { decision } = &session.phase else {
            return Err(ScenarError::invalid_state(
                "send_turn",
                "active",
                session.phase.name(),
            ));
        };

        let catalog = self.catalog.snapshot().await;
        let heuristic = catalog.lookup(&decision.heuristic)?;
        let mut engine = ConversationEngine::new(
            self.oracle.clone(),
            Some(heuristic),
            &self.config.conversation,
            self.config.retry.conversation,
        )?
        .with_state(session.conversation.clone());

        let reply = guarded(&handle.cancel, engine.continue_with(text)).await?;

        session.conversation = engine.into_state();
        self.persist(session).await?;
        Ok(reply)
    }

    async fn persist(&self, session: &mut SimulationSession) -> Result<()> {
        session.touch();
        self.repository.save(session).await
    }

    /// The cached handle, loading the session from the repository on a miss.
    async fn handle(&self, session_id: &str) -> Result<Arc<SessionHandle>> {
        if let Some(handle) = self.sessions.read().await.get(session_id) {
            return Ok(handle.clone());
        }

        let mut sessions = self.sessions.write().await;
        if let Some(handle) = sessions.get(session_id) {
            return Ok(handle.clone());
        }
        let session = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ScenarError::not_found("session", session_id))?;
        let handle = SessionHandle::new(session);
        sessions.insert(session_id.to_string(), handle.clone());
        Ok(handle)
    }

    fn ensure_open(handle: &SessionHandle) -> Result<()> {
        if handle.cancel.is_cancelled() {
            Err(OracleError::Cancelled.into())
        } else {
            Ok(())
        }
    }
}

/// Runs `operation` unless `cancel` fires first.
async fn guarded<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OracleError::Cancelled.into()),
        result = operation => result,
    }
}
