//! Transient-failure retry for any oracle.
//!
//! Only errors for which [`OracleError::is_transient`] holds are retried.
//! Delays grow exponentially from `RetryPolicy::backoff_ms`, with a little
//! jitter, and a server-supplied `retry-after` takes precedence up to the
//! same 30 second cap.

use async_trait::async_trait;
use rand::Rng;
use scenar_core::config::RetryPolicy;
use scenar_core::oracle::{Oracle, OracleError, OracleMessage};
use std::time::Duration;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub struct RetryingOracle<O> {
    inner: O,
    policy: RetryPolicy,
}

impl<O: Oracle> RetryingOracle<O> {
    pub fn new(inner: O, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

/// Delay before retry number `retries_used + 1`, without jitter.
pub fn compute_backoff(base: Duration, retries_used: u32) -> Duration {
    let base_ms = base.as_millis();
    if base_ms == 0 {
        return Duration::ZERO;
    }
    let max_ms = MAX_BACKOFF.as_millis().max(base_ms);
    let multiplier = 1u128 << retries_used.min(20);
    let backoff_ms = base_ms.saturating_mul(multiplier).min(max_ms);
    Duration::from_millis(u64::try_from(backoff_ms).unwrap_or(u64::MAX))
}

fn with_jitter(delay: Duration) -> Duration {
    let spread = (delay.as_millis() / 4) as u64;
    if spread == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
}

#[async_trait]
impl<O: Oracle> Oracle for RetryingOracle<O> {
    async fn complete(
        &self,
        system: &str,
        messages: &[OracleMessage],
    ) -> Result<String, OracleError> {
        let mut retries_used = 0;
        loop {
            match self.inner.complete(system, messages).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && retries_used < self.policy.transient => {
                    let delay = match err.retry_after() {
                        Some(after) => after.min(MAX_BACKOFF),
                        None => with_jitter(compute_backoff(self.policy.backoff(), retries_used)),
                    };
                    retries_used += 1;
                    tracing::warn!(
                        target: "scenar::oracle",
                        backend = self.inner.name(),
                        error = %err,
                        attempt = retries_used,
                        delay_ms = delay.as_millis() as u64,
                        "Transient oracle failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
