//! Per-call time limit for any oracle.

use async_trait::async_trait;
use scenar_core::oracle::{Oracle, OracleError, OracleMessage};
use std::time::Duration;

/// Fails a call with [`OracleError::Timeout`] once `limit` elapses.
///
/// The inner future is dropped on expiry, so nothing the inner oracle would
/// have returned is observed.
pub struct TimeoutOracle<O> {
    inner: O,
    limit: Duration,
}

impl<O: Oracle> TimeoutOracle<O> {
    pub fn new(inner: O, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl<O: Oracle> Oracle for TimeoutOracle<O> {
    async fn complete(
        &self,
        system: &str,
        messages: &[OracleMessage],
    ) -> Result<String, OracleError> {
        match tokio::time::timeout(self.limit, self.inner.complete(system, messages)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    target: "scenar::oracle",
                    backend = self.inner.name(),
                    limit_secs = self.limit.as_secs_f64(),
                    "Oracle call timed out"
                );
                Err(OracleError::Timeout(self.limit))
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
