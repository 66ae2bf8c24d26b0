#![allow(dead_code)]

use async_trait::async_trait;
use scenar_application::AppContext;
use scenar_core::oracle::{Oracle, OracleError, OracleMessage};
use scenar_infrastructure::ScenarPaths;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

pub const NEGOTIATION_SCENARIO: &str = r#"{
    "goal": "Agree a ceasefire",
    "constraints": ["by Friday"],
    "conditions": ["both delegations present"],
    "heuristic": "negotiation",
    "response_format": "text",
    "parameters": {"timeline": "by Friday", "analysis_depth": "deep"}
}"#;

pub fn reply(narrative: &str) -> String {
    serde_json::json!({
        "narrative": narrative,
        "state_update": "talks ongoing",
        "available_actions": ["evolve 1", "evolve 2"]
    })
    .to_string()
}

/// Replays canned replies, optionally after a delay or never.
pub struct ReplayOracle {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<OracleMessage>>>,
    delay: Duration,
    hang: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub started: Notify,
}

impl ReplayOracle {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Arc<Self> {
        Self::build(replies, Duration::ZERO, false)
    }

    pub fn delayed<S: Into<String>>(
        replies: impl IntoIterator<Item = S>,
        delay: Duration,
    ) -> Arc<Self> {
        Self::build(replies, delay, false)
    }

    /// Every call blocks until the caller gives up.
    pub fn hanging() -> Arc<Self> {
        Self::build(Vec::<String>::new(), Duration::ZERO, true)
    }

    fn build<S: Into<String>>(
        replies: impl IntoIterator<Item = S>,
        delay: Duration,
        hang: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
            delay,
            hang,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            started: Notify::new(),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> Vec<OracleMessage> {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ReplayOracle {
    async fn complete(
        &self,
        _system: &str,
        messages: &[OracleMessage],
    ) -> Result<String, OracleError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.started.notify_one();

        if self.hang {
            std::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| OracleError::unavailable("no more replies"))
    }

    fn name(&self) -> &str {
        "replay"
    }
}

pub async fn context(dir: &TempDir) -> AppContext {
    let paths = ScenarPaths::with_dirs(dir.path().join("config"), dir.path().join("data"));
    AppContext::load(paths).await.unwrap()
}
