//! The workflow object: task registry, dependency wiring, parameter
//! resolution, and lifecycle delegation to the execution engine.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::task::{Parameter, Task};
use crate::exec::{BoxError, ExecError, ExecGraph, Runner, State};

/// Errors raised by workflow operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WorkflowError {
    /// The workflow is running; the task set, dependencies, and parameter
    /// bindings are frozen.
    #[error("workflow is running, not support dynamic modification")]
    Modify,

    /// A parameter reference is not `workflow.task.input|output.name`, or
    /// does not resolve.
    #[error("unknown ref format of parameter: {0}")]
    BadRef(String),

    /// The referenced task is not part of the workflow.
    #[error("task {0} not exists")]
    TaskNotExists(String),

    /// The underlying engine rejected an operation.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Snapshot of one task's execution status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub name: String,
    pub status: String,
    pub err: String,
    pub start_at: String,
    pub end_at: String,
    pub successor: HashSet<String>,
    pub precursor: HashSet<String>,
}

/// Snapshot of the whole workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInfo {
    pub name: String,
    pub status: String,
    pub start_at: String,
    pub end_at: String,
    pub err: String,
    pub tasks: Vec<TaskInfo>,
}

struct StepParams {
    inputs: HashMap<String, Parameter>,
    outputs: HashMap<String, Parameter>,
}

/// One task slot: the task object plus its declared parameter maps.
struct StepSlot {
    task: Arc<dyn Task>,
    params: RwLock<StepParams>,
}

#[derive(Default)]
struct Links {
    successor: HashSet<String>,
    precursor: HashSet<String>,
}

struct WfState {
    name: String,
    status: State,
    err: String,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    steps: HashMap<String, Arc<StepSlot>>,
    links: HashMap<String, Links>,
    eg: Option<ExecGraph<String>>,
    runs: u32,
}

struct WfShared {
    state: RwLock<WfState>,
}

/// A named collection of tasks with parameter wiring, executed by the DAG
/// engine. The handle is cheap to clone and share.
///
/// # Example
///
/// ```no_run
/// use plegma::workflow::{GeneralTask, Parameter, Workflow};
///
/// # async fn demo() -> Result<(), plegma::workflow::WorkflowError> {
/// let wf = Workflow::new("etl");
/// wf.add_task(GeneralTask::new("extract", |_| {
///     Ok(vec![Parameter::literal("rows", 42)])
/// }))?;
/// wf.add_task(GeneralTask::new("report", |inputs| {
///     println!("rows: {}", inputs["rows"].value);
///     Ok(vec![])
/// }))?;
/// wf.add_dependency("extract", "report")?;
/// wf.set_output("extract", vec![Parameter::literal("rows", 0)])?;
/// wf.set_input("report", vec![Parameter::by_ref("rows", "etl.extract.output.rows")])?;
/// wf.start()?;
/// wf.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct Workflow {
    shared: Arc<WfShared>,
}

impl Clone for Workflow {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(WfShared {
                state: RwLock::new(WfState {
                    name: name.into(),
                    status: State::Waiting,
                    err: String::new(),
                    started_at: None,
                    ended_at: None,
                    steps: HashMap::new(),
                    links: HashMap::new(),
                    eg: None,
                    runs: 0,
                }),
            }),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, WfState> {
        self.shared
            .state
            .write()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> RwLockReadGuard<'_, WfState> {
        self.shared.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    pub fn status(&self) -> State {
        self.read().status
    }

    // ------------------------------------------------------------------
    // Construction (frozen while running)
    // ------------------------------------------------------------------

    pub fn add_task(&self, task: impl Task + 'static) -> Result<(), WorkflowError> {
        let mut st = self.write();
        if st.status == State::Running {
            return Err(WorkflowError::Modify);
        }
        let name = task.name().to_string();
        st.steps.insert(
            name.clone(),
            Arc::new(StepSlot {
                task: Arc::new(task),
                params: RwLock::new(StepParams {
                    inputs: HashMap::new(),
                    outputs: HashMap::new(),
                }),
            }),
        );
        st.links.entry(name).or_default();
        Ok(())
    }

    pub fn remove_task(&self, name: &str) -> Result<(), WorkflowError> {
        let mut st = self.write();
        if st.status == State::Running {
            return Err(WorkflowError::Modify);
        }
        if st.steps.remove(name).is_none() {
            return Err(WorkflowError::TaskNotExists(name.to_string()));
        }
        st.links.remove(name);
        for link in st.links.values_mut() {
            link.successor.remove(name);
            link.precursor.remove(name);
        }
        Ok(())
    }

    /// Declares that `successor` runs after `precursor`.
    pub fn add_dependency(&self, precursor: &str, successor: &str) -> Result<(), WorkflowError> {
        let mut st = self.write();
        if st.status == State::Running {
            return Err(WorkflowError::Modify);
        }
        for t in [precursor, successor] {
            if !st.steps.contains_key(t) {
                return Err(WorkflowError::TaskNotExists(t.to_string()));
            }
        }
        st.links
            .entry(precursor.to_string())
            .or_default()
            .successor
            .insert(successor.to_string());
        st.links
            .entry(successor.to_string())
            .or_default()
            .precursor
            .insert(precursor.to_string());
        Ok(())
    }

    pub fn remove_dependency(&self, precursor: &str, successor: &str) -> Result<(), WorkflowError> {
        let mut st = self.write();
        if st.status == State::Running {
            return Err(WorkflowError::Modify);
        }
        for t in [precursor, successor] {
            if !st.steps.contains_key(t) {
                return Err(WorkflowError::TaskNotExists(t.to_string()));
            }
        }
        if let Some(link) = st.links.get_mut(precursor) {
            link.successor.remove(successor);
        }
        if let Some(link) = st.links.get_mut(successor) {
            link.precursor.remove(precursor);
        }
        Ok(())
    }

    /// Declares (or re-binds) input parameters of a task.
    pub fn set_input(&self, task: &str, params: Vec<Parameter>) -> Result<(), WorkflowError> {
        self.bind(task, params, true)
    }

    /// Declares output parameters of a task; undeclared runner outputs are
    /// dropped at execution time.
    pub fn set_output(&self, task: &str, params: Vec<Parameter>) -> Result<(), WorkflowError> {
        self.bind(task, params, false)
    }

    pub fn set_inputs(
        &self,
        bindings: HashMap<String, Vec<Parameter>>,
    ) -> Result<(), WorkflowError> {
        for (task, params) in bindings {
            self.bind(&task, params, true)?;
        }
        Ok(())
    }

    pub fn set_outputs(
        &self,
        bindings: HashMap<String, Vec<Parameter>>,
    ) -> Result<(), WorkflowError> {
        for (task, params) in bindings {
            self.bind(&task, params, false)?;
        }
        Ok(())
    }

    fn bind(&self, task: &str, params: Vec<Parameter>, input: bool) -> Result<(), WorkflowError> {
        let st = self.write();
        if st.status == State::Running {
            return Err(WorkflowError::Modify);
        }
        let slot = st
            .steps
            .get(task)
            .ok_or_else(|| WorkflowError::TaskNotExists(task.to_string()))?;
        let mut ps = slot.params.write().unwrap_or_else(|e| e.into_inner());
        let map = if input { &mut ps.inputs } else { &mut ps.outputs };
        for p in params {
            map.insert(p.name.clone(), p);
        }
        Ok(())
    }

    /// Current values of a task's declared outputs.
    pub fn get_output(&self, task: &str) -> Result<Vec<Parameter>, WorkflowError> {
        let st = self.read();
        let slot = st
            .steps
            .get(task)
            .ok_or_else(|| WorkflowError::TaskNotExists(task.to_string()))?;
        let ps = slot.params.read().unwrap_or_else(|e| e.into_inner());
        Ok(ps.outputs.values().cloned().collect())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Builds a fresh exec graph from the task set and starts it.
    /// A no-op when already running.
    pub fn start(&self) -> Result<(), WorkflowError> {
        let mut st = self.write();
        if st.status == State::Running {
            return Ok(());
        }
        if st.status == State::Paused {
            // lift the suspension; in-flight tasks were never cancelled
            if let Some(eg) = &st.eg {
                eg.start()?;
            }
            st.status = State::Running;
            return Ok(());
        }
        st.status = State::Running;
        st.started_at = Some(Utc::now());
        st.ended_at = None;
        st.err.clear();
        if let Some(old) = st.eg.take() {
            let _ = old.stop();
        }

        let eg: ExecGraph<String> = ExecGraph::new(st.name.clone());
        let built = (|| -> Result<(), WorkflowError> {
            for (name, slot) in &st.steps {
                let runner = step_runner(Arc::clone(&self.shared), name.clone(), Arc::clone(slot));
                eg.add_job(name.clone(), runner)?;
            }
            for (name, link) in &st.links {
                for s in &link.successor {
                    eg.add_dependency(name, s)?;
                }
            }
            eg.start()?;
            Ok(())
        })();

        match built {
            Ok(()) => {
                st.runs += 1;
                st.eg = Some(eg);
                debug!(workflow = %st.name, run = st.runs, "workflow started");
                Ok(())
            }
            Err(e) => {
                st.status = State::Failed;
                st.err = e.to_string();
                st.ended_at = Some(Utc::now());
                Err(e)
            }
        }
    }

    /// Stops the running workflow; a no-op otherwise.
    pub fn stop(&self) -> Result<(), WorkflowError> {
        let mut st = self.write();
        if st.status != State::Running {
            return Ok(());
        }
        if let Some(eg) = &st.eg {
            let _ = eg.stop();
        }
        st.status = State::Stopped;
        st.err = "canceled".to_string();
        st.ended_at = Some(Utc::now());
        Ok(())
    }

    /// Pauses new task launches; running tasks continue.
    pub fn pause(&self) -> Result<(), WorkflowError> {
        let mut st = self.write();
        if st.status != State::Running {
            return Ok(());
        }
        if let Some(eg) = &st.eg {
            eg.pause()?;
        }
        st.status = State::Paused;
        Ok(())
    }

    /// Waits for the run to finish and surfaces the engine's error.
    pub async fn wait(&self) -> Result<(), WorkflowError> {
        let eg = { self.read().eg.clone() };
        let Some(eg) = eg else {
            return Ok(());
        };
        let result = eg.wait().await;
        let mut st = self.write();
        if st.status == State::Running || st.status == State::Paused {
            st.status = eg.status();
            st.ended_at = Some(Utc::now());
            if let Err(e) = &result {
                st.err = e.to_string();
            }
        }
        result.map_err(Into::into)
    }

    /// Snapshot of the workflow and each task.
    pub fn info(&self) -> WorkflowInfo {
        let mut st = self.write();
        let live = st.eg.as_ref().map(|eg| eg.status());
        if st.status == State::Running {
            if let Some(s) = live {
                st.status = s;
            }
        }
        let fmt = |t: Option<DateTime<Utc>>| t.map(|t| t.to_rfc3339()).unwrap_or_default();

        let mut tasks = Vec::with_capacity(st.steps.len());
        for name in st.steps.keys() {
            let link = st.links.get(name);
            let (status, err, start_at, end_at) = match st.eg.as_ref().and_then(|eg| eg.job(name).ok()) {
                Some(job) => (
                    job.state.to_string(),
                    job.error.map(|e| e.to_string()).unwrap_or_default(),
                    fmt(job.started_at),
                    fmt(job.ended_at),
                ),
                None => (State::Waiting.to_string(), String::new(), String::new(), String::new()),
            };
            tasks.push(TaskInfo {
                name: name.clone(),
                status,
                err,
                start_at,
                end_at,
                successor: link.map(|l| l.successor.clone()).unwrap_or_default(),
                precursor: link.map(|l| l.precursor.clone()).unwrap_or_default(),
            });
        }
        WorkflowInfo {
            name: st.name.clone(),
            status: st.status.to_string(),
            start_at: fmt(st.started_at),
            end_at: fmt(st.ended_at),
            err: st.err.clone(),
            tasks,
        }
    }
}

/// Wraps one task slot as an engine runner: resolve inputs, run the task on
/// the blocking pool, copy declared outputs back.
fn step_runner(shared: Arc<WfShared>, name: String, slot: Arc<StepSlot>) -> Runner {
    Runner::from_fn(move || {
        let shared = Arc::clone(&shared);
        let name = name.clone();
        let slot = Arc::clone(&slot);
        async move {
            let inputs = resolve_inputs(&shared, &slot).map_err(|e| -> BoxError { e.into() })?;
            debug!(task = %name, "running task");
            let task = Arc::clone(&slot.task);
            let outputs = tokio::task::spawn_blocking(move || task.run(inputs))
                .await
                .map_err(|e| -> BoxError { e.to_string().into() })??;

            let mut ps = slot.params.write().unwrap_or_else(|e| e.into_inner());
            for p in outputs {
                if let Some(declared) = ps.outputs.get_mut(&p.name) {
                    declared.value = p.value;
                }
                // undeclared outputs are dropped
            }
            Ok(())
        }
    })
}

fn resolve_inputs(
    shared: &WfShared,
    slot: &StepSlot,
) -> Result<HashMap<String, Parameter>, WorkflowError> {
    let declared: Vec<Parameter> = {
        let ps = slot.params.read().unwrap_or_else(|e| e.into_inner());
        ps.inputs.values().cloned().collect()
    };
    let mut resolved = HashMap::with_capacity(declared.len());
    for mut p in declared {
        if let Some(r) = p.reference.clone() {
            p.value = lookup_ref(shared, &r)?.value;
        }
        resolved.insert(p.name.clone(), p);
    }
    Ok(resolved)
}

/// Resolves a dotted `workflow.task.input|output.name` reference.
fn lookup_ref(shared: &WfShared, reference: &str) -> Result<Parameter, WorkflowError> {
    let parts: Vec<&str> = reference.split('.').collect();
    if parts.len() != 4 {
        return Err(WorkflowError::BadRef(reference.to_string()));
    }
    let (wf, task, kind, param) = (parts[0], parts[1], parts[2], parts[3]);
    let st = shared.state.read().unwrap_or_else(|e| e.into_inner());
    if wf != st.name {
        return Err(WorkflowError::BadRef(reference.to_string()));
    }
    let slot = st
        .steps
        .get(task)
        .ok_or_else(|| WorkflowError::TaskNotExists(task.to_string()))?;
    let ps = slot.params.read().unwrap_or_else(|e| e.into_inner());
    let map = match kind.to_ascii_lowercase().as_str() {
        "input" | "inputs" => &ps.inputs,
        "output" | "outputs" => &ps.outputs,
        _ => return Err(WorkflowError::BadRef(reference.to_string())),
    };
    map.get(param)
        .cloned()
        .ok_or_else(|| WorkflowError::BadRef(reference.to_string()))
}
