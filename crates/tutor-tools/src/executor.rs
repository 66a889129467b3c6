//! Tool Executor — launches pedagogical tool calls in background tasks,
//! enforcing a concurrency cap, a bounded queue, per-call deadlines, and
//! cancellation, without ever blocking the submitter.
//!
//! Grounded on the launch-tool-in-a-background-task pattern from the
//! teacher's consciousness loop: every call gets its own `CancellationToken`
//! and `tokio::spawn`'d task, and the task reports back over a channel
//! instead of being awaited directly by the caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tutor_core::types::CorrelationToken;

use crate::client::ToolClient;

/// Terminal result of a submitted tool call. Exactly one of these is
/// delivered per `CorrelationToken`.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    Ok(Value),
    Err(String),
    Timeout,
    Cancelled,
}

/// A submitted call has finished; carries back the token so the Session
/// can match it against its `pending_tools` map.
#[derive(Debug, Clone)]
pub struct ToolCompletion {
    pub token: CorrelationToken,
    pub tool_name: &'static str,
    pub outcome: ToolOutcome,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    pub concurrency_cap: usize,
    pub queue_cap: usize,
    pub default_deadline_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency_cap: 16,
            queue_cap: 64,
            default_deadline_ms: 30_000,
        }
    }
}

/// Error returned by `submit` when the executor cannot accept more work
/// right now. Not a tool-call failure — the caller is expected to retry
/// or surface a "try again" response, per spec §6's back-pressure policy.
#[derive(Debug, thiserror::Error)]
#[error("tool executor is busy: {in_flight} in flight or queued against a cap of {cap}")]
pub struct Busy {
    pub in_flight: usize,
    pub cap: usize,
}

/// Submits pedagogical tool calls to the shared `ToolClient`, bounding how
/// many run at once and how many more are allowed to queue behind them.
pub struct ToolExecutor {
    client: Arc<ToolClient>,
    semaphore: Arc<Semaphore>,
    in_flight_or_queued: Arc<AtomicUsize>,
    queue_cap: usize,
    default_deadline_ms: u64,
    cancellations: Arc<DashMap<CorrelationToken, CancellationToken>>,
}

impl ToolExecutor {
    pub fn new(client: Arc<ToolClient>, config: ExecutorConfig) -> Self {
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(config.concurrency_cap)),
            in_flight_or_queued: Arc::new(AtomicUsize::new(0)),
            queue_cap: config.concurrency_cap + config.queue_cap,
            default_deadline_ms: config.default_deadline_ms,
            cancellations: Arc::new(DashMap::new()),
        }
    }

    /// Submits a call and returns its correlation token immediately. The
    /// terminal `ToolCompletion` is sent to `results` once the call settles,
    /// whether it succeeds, errors, times out, or is cancelled.
    ///
    /// Returns `Busy` without spawning anything if the bounded queue is
    /// already full — this never blocks the caller.
    pub fn submit(
        &self,
        tool_name: &'static str,
        args: Value,
        deadline_ms: Option<u64>,
        results: mpsc::Sender<ToolCompletion>,
    ) -> Result<CorrelationToken, Busy> {
        let in_flight = self.in_flight_or_queued.fetch_add(1, Ordering::SeqCst);
        if in_flight >= self.queue_cap {
            self.in_flight_or_queued.fetch_sub(1, Ordering::SeqCst);
            return Err(Busy {
                in_flight,
                cap: self.queue_cap,
            });
        }

        let token = CorrelationToken::new();
        let cancel = CancellationToken::new();
        self.cancellations.insert(token, cancel.clone());

        let client = self.client.clone();
        let semaphore = self.semaphore.clone();
        let in_flight_or_queued = self.in_flight_or_queued.clone();
        let cancellations = self.cancellations.clone();
        let deadline = Duration::from_millis(deadline_ms.unwrap_or(self.default_deadline_ms));

        tokio::spawn(async move {
            use futures::FutureExt;
            let outcome = std::panic::AssertUnwindSafe(run_one(
                client, semaphore, tool_name, args, deadline, cancel,
            ))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                warn!(tool = tool_name, "tool handler panicked, converting to error outcome");
                ToolOutcome::Err("tool handler panicked".into())
            });
            cancellations.remove(&token);
            in_flight_or_queued.fetch_sub(1, Ordering::SeqCst);
            let _ = results
                .send(ToolCompletion {
                    token,
                    tool_name,
                    outcome,
                })
                .await;
        });

        Ok(token)
    }

    /// Requests cancellation of an in-flight call. A no-op if the call has
    /// already completed or was never known (both are benign races).
    pub fn cancel(&self, token: CorrelationToken) {
        if let Some((_, cancel)) = self.cancellations.remove(&token) {
            cancel.cancel();
        }
    }

    pub fn in_flight_or_queued(&self) -> usize {
        self.in_flight_or_queued.load(Ordering::SeqCst)
    }
}

async fn run_one(
    client: Arc<ToolClient>,
    semaphore: Arc<Semaphore>,
    tool_name: &'static str,
    args: Value,
    deadline: Duration,
    cancel: CancellationToken,
) -> ToolOutcome {
    // Acquiring the permit is itself cancellable and counts against the
    // deadline: a call that never gets a slot in time should time out
    // rather than wait forever.
    let permit = tokio::select! {
        permit = semaphore.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return ToolOutcome::Err("tool executor shut down".into()),
        },
        _ = cancel.cancelled() => return ToolOutcome::Cancelled,
        _ = tokio::time::sleep(deadline) => return ToolOutcome::Timeout,
    };

    let call = client.call(tool_name, args);
    let outcome = tokio::select! {
        result = tokio::time::timeout(deadline, call) => match result {
            Ok(Ok(value)) => ToolOutcome::Ok(value),
            Ok(Err(err)) => ToolOutcome::Err(err.to_string()),
            Err(_) => ToolOutcome::Timeout,
        },
        _ = cancel.cancelled() => ToolOutcome::Cancelled,
    };
    drop(permit);
    if matches!(outcome, ToolOutcome::Err(_)) {
        debug!(tool = tool_name, "tool call errored, caller should fall back");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{PedagogicalTool, ToolCallError};
    use async_trait::async_trait;

    struct SlowEcho;

    #[async_trait]
    impl PedagogicalTool for SlowEcho {
        fn name(&self) -> &'static str {
            "slow_echo"
        }
        async fn call(&self, args: Value) -> Result<Value, ToolCallError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(args)
        }
        fn fallback(&self, _args: &Value) -> Value {
            Value::Null
        }
    }

    fn client_with_slow_echo() -> Arc<ToolClient> {
        let mut client = ToolClient::new();
        client.register(Arc::new(SlowEcho));
        Arc::new(client)
    }

    #[tokio::test]
    async fn submit_delivers_ok_outcome() {
        let executor = ToolExecutor::new(client_with_slow_echo(), ExecutorConfig::default());
        let (tx, mut rx) = mpsc::channel(4);
        executor
            .submit("slow_echo", serde_json::json!({"x": 1}), None, tx)
            .unwrap();
        let completion = rx.recv().await.unwrap();
        assert!(matches!(completion.outcome, ToolOutcome::Ok(_)));
    }

    #[tokio::test]
    async fn submit_times_out_under_tight_deadline() {
        let executor = ToolExecutor::new(client_with_slow_echo(), ExecutorConfig::default());
        let (tx, mut rx) = mpsc::channel(4);
        executor
            .submit("slow_echo", serde_json::json!({}), Some(1), tx)
            .unwrap();
        let completion = rx.recv().await.unwrap();
        assert!(matches!(completion.outcome, ToolOutcome::Timeout));
    }

    #[tokio::test]
    async fn submit_rejects_once_queue_cap_reached() {
        let config = ExecutorConfig {
            concurrency_cap: 1,
            queue_cap: 0,
            default_deadline_ms: 30_000,
        };
        let executor = ToolExecutor::new(client_with_slow_echo(), config);
        let (tx, _rx) = mpsc::channel(4);
        executor
            .submit("slow_echo", serde_json::json!({}), None, tx.clone())
            .unwrap();
        let second = executor.submit("slow_echo", serde_json::json!({}), None, tx);
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn cancel_before_completion_yields_cancelled_outcome() {
        let executor = ToolExecutor::new(client_with_slow_echo(), ExecutorConfig::default());
        let (tx, mut rx) = mpsc::channel(4);
        let token = executor
            .submit("slow_echo", serde_json::json!({}), None, tx)
            .unwrap();
        executor.cancel(token);
        let completion = rx.recv().await.unwrap();
        assert!(matches!(completion.outcome, ToolOutcome::Cancelled));
    }
}
