//! Per-job runtime state and the retry/timeout composition.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::ExecError;
use crate::core::Key;

/// A boxed error that can be sent across threads; the error type user
/// runners return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The future a runner produces.
pub type JobFuture = BoxFuture<'static, Result<(), BoxError>>;

/// Lifecycle states shared by jobs and the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Waiting,
    Running,
    Success,
    Stopped,
    Failed,
    Paused,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Waiting => "waiting",
            State::Running => "running",
            State::Success => "success",
            State::Stopped => "stopped",
            State::Failed => "failed",
            State::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// A user-supplied work item.
///
/// The plain form cannot be preempted: stopping it only abandons the
/// result. The token-aware form receives the node's cancellation handle and
/// is expected to honour it.
#[derive(Clone)]
pub enum Runner {
    Plain(Arc<dyn Fn() -> JobFuture + Send + Sync>),
    Cancellable(Arc<dyn Fn(CancellationToken) -> JobFuture + Send + Sync>),
}

impl Runner {
    /// Wraps a plain async closure.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Runner::Plain(Arc::new(move || Box::pin(f())))
    }

    /// Wraps an async closure that honours a cancellation token.
    pub fn with_token<F, Fut>(f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Runner::Cancellable(Arc::new(move |token| Box::pin(f(token))))
    }

    fn invoke(&self, token: &CancellationToken) -> JobFuture {
        match self {
            Runner::Plain(f) => f(),
            Runner::Cancellable(f) => f(token.clone()),
        }
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runner::Plain(_) => f.write_str("Runner::Plain"),
            Runner::Cancellable(_) => f.write_str("Runner::Cancellable"),
        }
    }
}

/// Snapshot of a job's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo<K> {
    pub key: K,
    pub state: State,
    pub error: Option<ExecError>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// One result posted to the scheduler's inbox.
#[derive(Debug, Clone)]
pub(crate) struct JobOutcome<K> {
    pub key: K,
    pub error: Option<ExecError>,
    #[allow(dead_code)]
    pub ended_at: DateTime<Utc>,
}

struct NodeInner<K> {
    info: JobInfo<K>,
    runner: Option<Runner>,
    retry: u32,
    timeout: Duration,
    /// Bumped on every (re)start and reset; a finishing runner whose
    /// captured version no longer matches posts nothing.
    version: u64,
    cancel: CancellationToken,
}

/// A job node: status, error, timestamps, retry budget, timeout, version
/// counter, and cancellation handle, all behind one per-node lock.
pub(crate) struct JobNode<K> {
    inner: RwLock<NodeInner<K>>,
}

impl<K: Key> JobNode<K> {
    pub fn new(key: K, runner: Option<Runner>, timeout: Duration, retry: u32) -> Self {
        Self {
            inner: RwLock::new(NodeInner {
                info: JobInfo {
                    key,
                    state: State::Waiting,
                    error: None,
                    started_at: None,
                    ended_at: None,
                },
                runner,
                retry,
                timeout,
                version: 0,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn info(&self) -> JobInfo<K> {
        match self.inner.read() {
            Ok(inner) => inner.info.clone(),
            Err(e) => e.into_inner().info.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.info().state == State::Running
    }

    pub fn has_runner(&self) -> bool {
        match self.inner.read() {
            Ok(inner) => inner.runner.is_some(),
            Err(e) => e.into_inner().runner.is_some(),
        }
    }

    pub fn update_runner(&self, runner: Runner) {
        if let Ok(mut inner) = self.inner.write() {
            inner.runner = Some(runner);
        }
    }

    pub fn update_timeout(&self, timeout: Duration) {
        if let Ok(mut inner) = self.inner.write() {
            inner.timeout = timeout;
        }
    }

    pub fn update_retry(&self, retry: u32) {
        if let Ok(mut inner) = self.inner.write() {
            inner.retry = retry;
        }
    }

    /// Starts the job; fast-returns when it is already running.
    ///
    /// The runner executes in its own task. Exactly one outcome is posted
    /// to `outbox` iff the node's version was not superseded and the node
    /// is still running when the runner finishes; otherwise the result is
    /// discarded (someone reset or stopped the node in the meantime).
    pub fn run(
        self: &Arc<Self>,
        outbox: mpsc::Sender<JobOutcome<K>>,
        permits: Option<Arc<Semaphore>>,
    ) {
        let (version, runner, retry, timeout, token) = {
            let mut inner = match self.inner.write() {
                Ok(i) => i,
                Err(e) => e.into_inner(),
            };
            if inner.info.state == State::Running {
                return;
            }
            inner.version += 1;
            inner.info.state = State::Running;
            inner.info.started_at = Some(Utc::now());
            inner.info.ended_at = None;
            inner.info.error = None;
            inner.cancel = CancellationToken::new();
            (
                inner.version,
                inner.runner.clone(),
                inner.retry,
                inner.timeout,
                inner.cancel.clone(),
            )
        };

        let node = Arc::clone(self);
        tokio::spawn(async move {
            let _permit = match permits {
                Some(s) => s.acquire_owned().await.ok(),
                None => None,
            };
            let error = match runner {
                Some(r) => run_with_retry(&r, retry, timeout, &token).await.err(),
                None => Some(ExecError::JobIsNull),
            };
            let ended_at = Utc::now();

            let outcome = {
                let mut inner = match node.inner.write() {
                    Ok(i) => i,
                    Err(e) => e.into_inner(),
                };
                if inner.version != version || inner.info.state != State::Running {
                    // superseded by reset/stop; drop the result
                    None
                } else {
                    inner.info.ended_at = Some(ended_at);
                    match &error {
                        Some(e) => {
                            inner.info.state = State::Failed;
                            inner.info.error = Some(e.clone());
                        }
                        None => inner.info.state = State::Success,
                    }
                    Some(JobOutcome {
                        key: inner.info.key.clone(),
                        error,
                        ended_at,
                    })
                }
            };
            if let Some(outcome) = outcome {
                if outbox.send(outcome).await.is_err() {
                    debug!("result inbox closed; job outcome dropped");
                }
            }
        });
    }

    /// Stops a running job: with `ignore_error` it counts as Success,
    /// otherwise it moves to Stopped with [`ExecError::JobCanceled`].
    pub fn stop(&self, ignore_error: bool) -> Result<(), ExecError> {
        let mut inner = match self.inner.write() {
            Ok(i) => i,
            Err(e) => e.into_inner(),
        };
        if inner.info.state != State::Running {
            return Err(ExecError::JobNotRunning);
        }
        inner.cancel.cancel();
        inner.info.ended_at = Some(Utc::now());
        if ignore_error {
            inner.info.state = State::Success;
        } else {
            inner.info.state = State::Stopped;
            inner.info.error = Some(ExecError::JobCanceled);
        }
        Ok(())
    }

    /// Marks a runnerless slot complete without dispatching work.
    pub fn complete_skipped(&self) {
        let mut inner = match self.inner.write() {
            Ok(i) => i,
            Err(e) => e.into_inner(),
        };
        let now = Utc::now();
        inner.info.state = State::Success;
        inner.info.started_at = Some(now);
        inner.info.ended_at = Some(now);
    }

    /// Cancels in-flight work, clears timestamps and error, and restores
    /// Waiting. The version bump orphans any still-running runner.
    pub fn reset(&self) {
        let mut inner = match self.inner.write() {
            Ok(i) => i,
            Err(e) => e.into_inner(),
        };
        inner.cancel.cancel();
        inner.info.state = State::Waiting;
        inner.info.error = None;
        inner.info.started_at = None;
        inner.info.ended_at = None;
        inner.version += 1;
    }
}

/// Runs one attempt, with the watchdog when a timeout is configured.
async fn run_attempt(
    runner: &Runner,
    timeout: Duration,
    token: &CancellationToken,
) -> Result<(), ExecError> {
    let fut = runner.invoke(token);
    let result = if timeout.is_zero() {
        fut.await
    } else {
        match tokio::time::timeout(timeout, fut).await {
            Ok(r) => r,
            Err(_) => return Err(ExecError::RunTimeout),
        }
    };
    result.map_err(|e| ExecError::JobFailed(e.to_string()))
}

/// The retry/timeout composition:
/// no retry and no timeout runs once; a timeout arms a watchdog per
/// attempt; a retry budget allows `retry + 1` attempts with the first
/// success short-circuiting, and persistent failure wraps the last error
/// with the attempt count.
async fn run_with_retry(
    runner: &Runner,
    retry: u32,
    timeout: Duration,
    token: &CancellationToken,
) -> Result<(), ExecError> {
    if retry == 0 {
        return run_attempt(runner, timeout, token).await;
    }
    let mut last = ExecError::JobFailed(String::new());
    for attempt in 0..=retry {
        match run_attempt(runner, timeout, token).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!(attempt, retry, error = %e, "job attempt failed");
                last = e;
            }
        }
    }
    warn!(retry, error = %last, "job exhausted its retry budget");
    Err(ExecError::RetryExhausted {
        retry,
        last: last.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_runner(counter: Arc<AtomicU32>, fail_below: u32) -> Runner {
        Runner::from_fn(move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < fail_below {
                    Err::<(), BoxError>("transient".into())
                } else {
                    Ok(())
                }
            }
        })
    }

    #[tokio::test]
    async fn run_posts_exactly_one_result() {
        let (tx, mut rx) = mpsc::channel(4);
        let node = Arc::new(JobNode::new(1i64, Some(counting_runner(Arc::new(AtomicU32::new(0)), 0)), Duration::ZERO, 0));
        node.run(tx, None);
        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.key, 1);
        assert!(outcome.error.is_none());
        assert_eq!(node.info().state, State::Success);
        assert!(node.info().started_at.is_some());
        assert!(node.info().ended_at.is_some());
    }

    #[tokio::test]
    async fn retry_short_circuits_on_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = mpsc::channel(4);
        let node = Arc::new(JobNode::new(
            1i64,
            Some(counting_runner(counter.clone(), 3)),
            Duration::ZERO,
            5,
        ));
        node.run(tx, None);
        let outcome = rx.recv().await.unwrap();
        assert!(outcome.error.is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_wrap_the_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = mpsc::channel(4);
        let node = Arc::new(JobNode::new(
            1i64,
            Some(counting_runner(counter.clone(), 100)),
            Duration::ZERO,
            2,
        ));
        node.run(tx, None);
        let outcome = rx.recv().await.unwrap();
        match outcome.error {
            Some(ExecError::RetryExhausted { retry: 2, .. }) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3); // retry + 1 attempts
    }

    #[tokio::test]
    async fn timeout_fires_the_watchdog() {
        let runner = Runner::from_fn(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        });
        let (tx, mut rx) = mpsc::channel(4);
        let node = Arc::new(JobNode::new(
            1i64,
            Some(runner),
            Duration::from_millis(20),
            0,
        ));
        node.run(tx, None);
        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.error, Some(ExecError::RunTimeout));
        assert_eq!(node.info().state, State::Failed);
    }

    #[tokio::test]
    async fn second_start_is_idempotent() {
        let runner = Runner::from_fn(|| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        });
        let (tx, mut rx) = mpsc::channel(4);
        let node = Arc::new(JobNode::new(1i64, Some(runner), Duration::ZERO, 0));
        node.run(tx.clone(), None);
        node.run(tx, None); // fast-return, no second task
        assert!(rx.recv().await.is_some());
        assert!(
            tokio::time::timeout(Duration::from_millis(100), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn reset_discards_the_in_flight_result() {
        let runner = Runner::from_fn(|| async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(())
        });
        let (tx, mut rx) = mpsc::channel(4);
        let node = Arc::new(JobNode::new(1i64, Some(runner), Duration::ZERO, 0));
        node.run(tx, None);
        node.reset();
        assert_eq!(node.info().state, State::Waiting);
        assert!(
            tokio::time::timeout(Duration::from_millis(120), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn stop_cancels_a_token_aware_runner() {
        let runner = Runner::with_token(|token: CancellationToken| async move {
            token.cancelled().await;
            Err::<(), BoxError>("interrupted".into())
        });
        let (tx, mut rx) = mpsc::channel(4);
        let node = Arc::new(JobNode::new(1i64, Some(runner), Duration::ZERO, 0));
        node.run(tx, None);
        tokio::time::sleep(Duration::from_millis(10)).await;
        node.stop(false).unwrap();
        assert_eq!(node.info().state, State::Stopped);
        assert_eq!(node.info().error, Some(ExecError::JobCanceled));
        // the runner's own result is discarded: state is no longer Running
        assert!(
            tokio::time::timeout(Duration::from_millis(60), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn stop_requires_running() {
        let node: Arc<JobNode<i64>> = Arc::new(JobNode::new(1, None, Duration::ZERO, 0));
        assert_eq!(node.stop(false).unwrap_err(), ExecError::JobNotRunning);
    }
}
