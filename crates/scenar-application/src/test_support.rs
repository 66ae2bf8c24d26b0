//! Oracle double for unit tests.

use async_trait::async_trait;
use scenar_core::oracle::{Oracle, OracleError, OracleMessage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub system: String,
    pub messages: Vec<OracleMessage>,
}

/// Replays canned outcomes in order and records every request.
pub struct ScriptedOracle {
    outcomes: Mutex<VecDeque<Result<String, OracleError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedOracle {
    pub fn new(outcomes: impl IntoIterator<Item = Result<String, OracleError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Arc<Self> {
        Self::new(texts.into_iter().map(|t| Ok(t.to_string())))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> RecordedRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(
        &self,
        system: &str,
        messages: &[OracleMessage],
    ) -> Result<String, OracleError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system: system.to_string(),
            messages: messages.to_vec(),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::unavailable("script exhausted")))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
