//! The DAG scheduler: job registry, dependency topology, candidate
//! bookkeeping, and the scheduling loop.
//!
//! Lock discipline: one reader/writer lock guards the scheduler state.
//! Jobs run outside the lock and interact with the scheduler only by
//! posting to the buffered result inbox. The loop holds the lock during
//! state updates and never while waiting on a channel.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Notify, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{ExecError, ExecResult};
use super::node::{JobInfo, JobNode, JobOutcome, Runner, State};
use crate::core::{Key, SynthesizeKey, Weight};
use crate::graph::{Edge, Graph, GraphError, Vertex};

struct Inner<K> {
    /// Job precedence as a directed graph; vertices are job keys.
    dag: Graph<K, (), i64>,
    nodes: HashMap<K, Arc<JobNode<K>>>,
    /// Waiting jobs and their count of unsatisfied predecessors; a count
    /// of zero means ready to launch.
    candidates: HashMap<K, usize>,
    /// Jobs whose result the scheduler has ingested.
    finished: HashSet<K>,
    status: State,
    /// Halts new launches while letting in-flight jobs continue.
    suspend: bool,
    error: Option<ExecError>,
    /// Closed by stop to terminate the scheduling loop.
    complete: CancellationToken,
    /// Closed when the global state leaves Running; wakes waiters.
    wait: CancellationToken,
    completed: bool,
    outbox: mpsc::Sender<JobOutcome<K>>,
    /// Taken by the scheduling loop at launch.
    inbox: Option<mpsc::Receiver<JobOutcome<K>>>,
    limit: Option<Arc<Semaphore>>,
}

struct Shared<K> {
    state: RwLock<Inner<K>>,
    /// Nudges the loop after resume-from-pause.
    kick: Notify,
}

/// A concurrent job engine driven by a dependency DAG.
///
/// Jobs launch only after every predecessor posted a successful result.
/// A failing job moves the graph to Failed but already-running jobs finish
/// (fail-slow); stop cancels everything cancellable. The handle is cheap
/// to clone and share.
///
/// # Example
///
/// ```no_run
/// use plegma::exec::{ExecGraph, Runner};
///
/// # async fn demo() -> Result<(), plegma::ExecError> {
/// let eg: ExecGraph<String> = ExecGraph::new("pipeline");
/// eg.add_job("fetch".into(), Runner::from_fn(|| async { Ok(()) }))?;
/// eg.add_job("build".into(), Runner::from_fn(|| async { Ok(()) }))?;
/// eg.add_dependency(&"fetch".into(), &"build".into())?;
/// eg.start()?;
/// eg.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct ExecGraph<K> {
    shared: Arc<Shared<K>>,
}

impl<K> Clone for ExecGraph<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K: Key + SynthesizeKey> ExecGraph<K> {
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(16);
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(Inner {
                    dag: Graph::new_digraph(name),
                    nodes: HashMap::new(),
                    candidates: HashMap::new(),
                    finished: HashSet::new(),
                    status: State::Waiting,
                    suspend: false,
                    error: None,
                    complete: CancellationToken::new(),
                    wait: CancellationToken::new(),
                    completed: false,
                    outbox: tx,
                    inbox: Some(rx),
                    limit: None,
                }),
                kick: Notify::new(),
            }),
        }
    }

    /// Builds an engine from an existing directed graph: vertices become
    /// job slots awaiting a runner, edges become dependencies. Slots left
    /// without a runner are skipped at run time (their successors still
    /// unblock) rather than dispatched.
    pub fn from_dag<V: Clone, W: Weight>(g: &Graph<K, V, W>) -> ExecResult<Self> {
        if !g.is_directed() {
            return Err(GraphError::NotDigraph.into());
        }
        let eg = Self::new(g.name().to_string());
        {
            let mut st = eg.write();
            for v in g.all_vertexes() {
                st.dag.add_vertex(Vertex::new(v.key.clone(), ()))?;
                st.nodes.insert(
                    v.key.clone(),
                    Arc::new(JobNode::new(v.key, None, Duration::ZERO, 0)),
                );
            }
            for e in g.all_edges() {
                st.dag
                    .add_edge(Edge::new(e.key.clone(), e.head.clone(), e.tail.clone(), 0))?;
            }
        }
        Ok(eg)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<K>> {
        self.shared
            .state
            .write()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner<K>> {
        self.shared.state.read().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Starts (or resumes) the run.
    ///
    /// From Paused the suspension lifts and in-flight work continues; from
    /// Waiting, Stopped, or Failed every node is re-initialized and the
    /// scheduling loop is spawned; from Success this is a no-op (reset
    /// first for a second run); from Running it fails with
    /// [`ExecError::AlreadyRunning`].
    pub fn start(&self) -> ExecResult<()> {
        let mut st = self.write();
        if !st.dag.is_acyclic() {
            return Err(ExecError::ExistsCycle);
        }
        match st.status {
            State::Running => Err(ExecError::AlreadyRunning),
            State::Paused => {
                st.suspend = false;
                st.status = State::Running;
                info!(graph = st.dag.name(), "resumed");
                drop(st);
                self.shared.kick.notify_one();
                Ok(())
            }
            State::Waiting | State::Stopped | State::Failed => {
                self.reinit(&mut st);
                self.launch(&mut st);
                Ok(())
            }
            State::Success => Ok(()),
        }
    }

    /// Re-initializes node state, bookkeeping, and per-lifecycle signals.
    fn reinit(&self, st: &mut Inner<K>) {
        for node in st.nodes.values() {
            node.reset();
        }
        st.candidates.clear();
        st.finished.clear();
        st.complete = CancellationToken::new();
        st.wait = CancellationToken::new();
        st.completed = false;
        st.suspend = false;
        st.error = None;
        st.status = State::Waiting;
        let (tx, rx) = mpsc::channel(st.nodes.len() * 2 + 16);
        st.outbox = tx;
        st.inbox = Some(rx);
    }

    fn launch(&self, st: &mut Inner<K>) {
        st.status = State::Running;
        info!(graph = st.dag.name(), jobs = st.nodes.len(), "started");
        if st.dag.order() > 0 {
            let sources = match st.dag.sources() {
                Ok(s) => s,
                Err(e) => {
                    scheduled_error(st, e.into());
                    return;
                }
            };
            if sources.is_empty() {
                scheduled_error(st, ExecError::NoEntrypoint);
                return;
            }
            for s in sources {
                st.candidates.insert(s.key, 0);
            }
        }
        let inbox = match st.inbox.take() {
            Some(rx) => rx,
            None => {
                scheduled_error(st, ExecError::AlreadyRunning);
                return;
            }
        };
        let complete = st.complete.clone();
        let shared = Arc::clone(&self.shared);
        tokio::spawn(scheduler_loop(shared, inbox, complete));
    }

    /// Stops the run: suspends launches, cancels every running job, and
    /// records [`ExecError::ExecCanceled`]. Idempotent on Stopped; fails
    /// on Success with a diagnostic.
    pub fn stop(&self) -> ExecResult<()> {
        let mut st = self.write();
        let result = match st.status {
            State::Stopped => Ok(()),
            State::Failed => {
                st.suspend = true;
                stop_running_nodes(&st);
                Ok(())
            }
            State::Waiting | State::Running | State::Paused => {
                st.suspend = true;
                stop_running_nodes(&st);
                st.status = State::Stopped;
                st.error = Some(ExecError::ExecCanceled);
                st.wait.cancel();
                info!(graph = st.dag.name(), "stopped");
                Ok(())
            }
            State::Success => Err(ExecError::NothingRunning(State::Success)),
        };
        if !st.completed {
            st.complete.cancel();
            st.completed = true;
        }
        result
    }

    /// Pauses the run: new launches halt, in-flight jobs continue.
    /// Idempotent on Paused; fails on Success.
    pub fn pause(&self) -> ExecResult<()> {
        let mut st = self.write();
        match st.status {
            State::Paused => Ok(()),
            State::Running | State::Waiting => {
                st.suspend = true;
                st.status = State::Paused;
                info!(graph = st.dag.name(), "paused");
                Ok(())
            }
            State::Failed | State::Stopped => {
                st.suspend = true;
                Ok(())
            }
            State::Success => Err(ExecError::NothingRunning(State::Success)),
        }
    }

    /// Blocks until the run leaves Running, then surfaces the recorded
    /// error, if any.
    pub async fn wait(&self) -> ExecResult<()> {
        let wait = { self.read().wait.clone() };
        wait.cancelled().await;
        let st = self.read();
        match &st.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Stops the run (if needed) and restores every node and the graph to
    /// the initial Waiting state, with fresh per-lifecycle signals.
    pub fn reset(&self) -> ExecResult<()> {
        let _ = self.stop();
        let mut st = self.write();
        self.reinit(&mut st);
        Ok(())
    }

    pub fn status(&self) -> State {
        self.read().status
    }

    /// Snapshot of one job's status.
    pub fn job(&self, key: &K) -> ExecResult<JobInfo<K>> {
        let st = self.read();
        st.nodes
            .get(key)
            .map(|n| n.info())
            .ok_or(ExecError::JobNotExists)
    }

    /// Cancels a single running job and posts a synthetic result so the
    /// scheduler updates the ready set. With `ignore_error` the job counts
    /// as Success and its successors unblock.
    pub async fn stop_job(&self, key: &K, ignore_error: bool) -> ExecResult<()> {
        let (node, outbox) = {
            let st = self.read();
            let node = st
                .nodes
                .get(key)
                .cloned()
                .ok_or(ExecError::JobNotExists)?;
            (node, st.outbox.clone())
        };
        node.stop(ignore_error)?;
        let outcome = JobOutcome {
            key: key.clone(),
            error: if ignore_error {
                None
            } else {
                Some(ExecError::JobCanceled)
            },
            ended_at: Utc::now(),
        };
        if outbox.send(outcome).await.is_err() {
            debug!("scheduler inbox closed; synthetic result dropped");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Structural mutation (Waiting state only)
    // ------------------------------------------------------------------

    pub fn add_job(&self, key: K, runner: Runner) -> ExecResult<()> {
        self.upsert_job(key, runner, Duration::ZERO, 0)
    }

    /// Adds a job whose every attempt is bounded by an elapsed-time
    /// watchdog; expiry fails the attempt with [`ExecError::RunTimeout`].
    pub fn add_timeout_job(&self, key: K, runner: Runner, timeout: Duration) -> ExecResult<()> {
        self.upsert_job(key, runner, timeout, 0)
    }

    /// Adds a job retried up to `retry` extra times; the first success
    /// short-circuits.
    pub fn add_retry_job(&self, key: K, runner: Runner, retry: u32) -> ExecResult<()> {
        self.upsert_job(key, runner, Duration::ZERO, retry)
    }

    fn upsert_job(&self, key: K, runner: Runner, timeout: Duration, retry: u32) -> ExecResult<()> {
        let mut st = self.write();
        if st.status != State::Waiting {
            return Err(ExecError::ForbidModify);
        }
        if let Some(node) = st.nodes.get(&key) {
            node.update_runner(runner);
            if !timeout.is_zero() {
                node.update_timeout(timeout);
            }
            if retry != 0 {
                node.update_retry(retry);
            }
            return Ok(());
        }
        st.dag.add_vertex(Vertex::new(key.clone(), ()))?;
        st.nodes.insert(
            key.clone(),
            Arc::new(JobNode::new(key, Some(runner), timeout, retry)),
        );
        Ok(())
    }

    pub fn remove_job(&self, key: &K) -> ExecResult<()> {
        let mut st = self.write();
        if st.status != State::Waiting {
            return Err(ExecError::ForbidModify);
        }
        if !st.nodes.contains_key(key) {
            return Err(ExecError::JobNotExists);
        }
        st.dag.remove_vertex(key)?;
        st.nodes.remove(key);
        st.candidates.remove(key);
        Ok(())
    }

    /// Declares that `target` depends on `source` completing first.
    pub fn add_dependency(&self, source: &K, target: &K) -> ExecResult<()> {
        let mut st = self.write();
        if st.status != State::Waiting {
            return Err(ExecError::ForbidModify);
        }
        if !st.nodes.contains_key(source) || !st.nodes.contains_key(target) {
            return Err(ExecError::JobNotExists);
        }
        if st.dag.get_edge(source, target).is_ok() {
            return Err(GraphError::EdgeExists.into());
        }
        st.dag
            .add_edge_auto(source.clone(), target.clone(), 0)?;
        Ok(())
    }

    pub fn remove_dependency(&self, source: &K, target: &K) -> ExecResult<()> {
        let mut st = self.write();
        if st.status != State::Waiting {
            return Err(ExecError::ForbidModify);
        }
        if !st.nodes.contains_key(source) || !st.nodes.contains_key(target) {
            return Err(ExecError::JobNotExists);
        }
        let arcs = st.dag.get_edge(source, target)?;
        for e in arcs {
            st.dag.remove_edge_by_key(&e.key)?;
        }
        Ok(())
    }

    /// Bounds the number of concurrently executing jobs; zero means
    /// unbounded. Jobs queue for a permit inside their own task, so the
    /// scheduling loop never blocks on the bound.
    pub fn set_max_concurrency(&self, n: usize) {
        let mut st = self.write();
        st.limit = if n == 0 {
            None
        } else {
            Some(Arc::new(Semaphore::new(n)))
        };
    }

    /// Cycles in the topology, delegated to the graph model.
    pub fn detect_cycle(&self) -> ExecResult<Vec<Vec<K>>> {
        Ok(self.read().dag.detect_cycle()?)
    }
}

fn stop_running_nodes<K: Key>(st: &Inner<K>) {
    for node in st.nodes.values() {
        if node.is_running() {
            let _ = node.stop(false);
        }
    }
}

fn scheduled_error<K>(st: &mut Inner<K>, err: ExecError) {
    warn!(error = %err, "scheduling failed");
    st.status = State::Failed;
    st.error = Some(err);
    st.suspend = true;
    st.wait.cancel();
}

/// One iteration handles exactly one of: completion signal (exit), a job
/// result (ingest), or a wake-up (drain the ready set / check
/// termination).
async fn scheduler_loop<K: Key>(
    shared: Arc<Shared<K>>,
    mut inbox: mpsc::Receiver<JobOutcome<K>>,
    complete: CancellationToken,
) {
    loop {
        let mut skipped: Vec<JobOutcome<K>> = Vec::new();
        let mut skip_outbox = None;
        let mut finished = false;
        {
            let mut st = shared.state.write().unwrap_or_else(|e| e.into_inner());
            let mut launched = false;
            if st.status == State::Running && !st.suspend {
                let ready: Vec<K> = st
                    .candidates
                    .iter()
                    .filter(|(_, n)| **n == 0)
                    .map(|(k, _)| k.clone())
                    .collect();
                for key in ready {
                    st.candidates.remove(&key);
                    if st.finished.contains(&key) {
                        continue;
                    }
                    match st.nodes.get(&key) {
                        Some(node) if node.has_runner() => {
                            // launching under the lock keeps stop() from
                            // racing past a not-yet-started job; run() only
                            // spawns, it never blocks
                            debug!(job = ?key, "launching job");
                            node.run(st.outbox.clone(), st.limit.clone());
                            launched = true;
                        }
                        other => {
                            // runnerless slot: completes without dispatch,
                            // successors still unblock
                            if let Some(node) = other {
                                node.complete_skipped();
                            }
                            debug!(job = ?key, "skipping runnerless job slot");
                            skipped.push(JobOutcome {
                                key,
                                error: None,
                                ended_at: Utc::now(),
                            });
                            skip_outbox = Some(st.outbox.clone());
                        }
                    }
                }
            }
            if !launched && skipped.is_empty() {
                let any_running = st.nodes.values().any(|n| n.is_running());
                let any_ready = st.candidates.values().any(|n| *n == 0);
                if !any_running && !any_ready {
                    if st.status == State::Running {
                        st.status = State::Success;
                        st.error = None;
                        st.wait.cancel();
                        info!(graph = st.dag.name(), "run succeeded");
                    }
                    finished = true;
                }
            }
        }

        if let Some(outbox) = skip_outbox {
            // posted outside the lock; the select below ingests these
            // before any termination check
            for outcome in skipped {
                if outbox.send(outcome).await.is_err() {
                    return;
                }
            }
        }
        if finished {
            return;
        }

        tokio::select! {
            _ = complete.cancelled() => return,
            res = inbox.recv() => match res {
                Some(outcome) => ingest(&shared, outcome),
                None => return,
            },
            _ = shared.kick.notified() => {}
        }
    }
}

/// Folds one job result into the scheduler state.
fn ingest<K: Key>(shared: &Arc<Shared<K>>, outcome: JobOutcome<K>) {
    let mut st = shared.state.write().unwrap_or_else(|e| e.into_inner());
    match outcome.error {
        Some(err) => {
            warn!(job = ?outcome.key, error = %err, "job failed");
            st.error = Some(err);
            if st.status == State::Running || st.status == State::Paused {
                st.status = State::Failed;
                st.wait.cancel();
                // suspend stays unset: already-ready jobs keep running
                // (fail-slow); nothing new launches outside Running
            }
        }
        None => {
            debug!(job = ?outcome.key, "job succeeded");
            let outs = match st.dag.out_neighbours(&outcome.key) {
                Ok(outs) => outs,
                Err(e) => {
                    scheduled_error(&mut st, e.into());
                    return;
                }
            };
            for v in outs {
                if let Some(dep) = st.candidates.get_mut(&v.key) {
                    *dep = dep.saturating_sub(1);
                } else if !st.finished.contains(&v.key) {
                    match st.dag.in_degree(&v.key) {
                        Ok(n) if n > 0 => {
                            st.candidates.insert(v.key.clone(), n - 1);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            scheduled_error(&mut st, e.into());
                            return;
                        }
                    }
                }
                // a successor already in the finished set ended before this
                // job (single-job retrigger); its completion stands
            }
        }
    }
    st.finished.insert(outcome.key);
}
