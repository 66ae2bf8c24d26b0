use async_trait::async_trait;
use scenar_core::config::RetryPolicy;
use scenar_core::oracle::{Oracle, OracleError, OracleMessage};
use scenar_interaction::{TimeoutOracle, with_retry};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Stalls on the first `stalls` calls, answers afterwards.
struct StallingOracle {
    stalls: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Oracle for StallingOracle {
    async fn complete(
        &self,
        _system: &str,
        _messages: &[OracleMessage],
    ) -> Result<String, OracleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.stalls {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(format!("answer {call}"))
    }

    fn name(&self) -> &str {
        "stalling"
    }
}

fn stack(stalls: usize, policy: RetryPolicy) -> (Arc<StallingOracle>, Arc<dyn Oracle>) {
    let inner = Arc::new(StallingOracle {
        stalls,
        calls: AtomicUsize::new(0),
    });
    let timed: Arc<dyn Oracle> = Arc::new(TimeoutOracle::new(inner.clone(), Duration::from_secs(5)));
    (inner, with_retry(timed, policy))
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retried_when_policy_allows() {
    let (inner, oracle) = stack(1, RetryPolicy::new(0, 2, 100));
    let answer = oracle
        .complete("system", &[OracleMessage::user("hello")])
        .await
        .unwrap();
    assert_eq!(answer, "answer 1");
    assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fails_fast_by_default() {
    let (inner, oracle) = stack(1, RetryPolicy::default());
    let err = oracle
        .complete("system", &[OracleMessage::user("hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::Timeout(limit) if limit == Duration::from_secs(5)));
    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_is_bounded() {
    let (inner, oracle) = stack(10, RetryPolicy::new(0, 2, 100));
    assert!(oracle.complete("", &[]).await.is_err());
    assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
}
