//! Error types for the execution engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::GraphError;

use super::node::State;

/// Result type for engine operations.
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors raised by the scheduler, job nodes, and lifecycle operations.
///
/// Job payload errors are carried as strings so snapshots stay cloneable.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ExecError {
    /// The topology contains a cycle; a run cannot start.
    #[error("there are cycles in the current exec graph")]
    ExistsCycle,

    /// Start was called while the graph is already running.
    #[error("the current exec graph is already running")]
    AlreadyRunning,

    /// The referenced job is not registered.
    #[error("the job not exists in current graph")]
    JobNotExists,

    /// The whole run was cancelled by a stop request.
    #[error("the exec graph has been canceled")]
    ExecCanceled,

    /// A single job was cancelled.
    #[error("the job has been canceled")]
    JobCanceled,

    /// Structural mutation was attempted outside the waiting state.
    #[error("current status is not waiting, cannot modify exec graph structure")]
    ForbidModify,

    /// The job slot has no runner attached.
    #[error("the job is null")]
    JobIsNull,

    /// The graph has nodes but no in-degree-zero entry point.
    #[error("not found entrypoint node in current exec graph")]
    NoEntrypoint,

    /// A job attempt exceeded its watchdog timeout.
    #[error("job run timeout")]
    RunTimeout,

    /// The job is not running, so it cannot be stopped.
    #[error("job status is not running, cannot stop it")]
    JobNotRunning,

    /// Lifecycle operation on a finished graph.
    #[error("current status is {0}, no jobs running, nothing to do")]
    NothingRunning(State),

    /// The job's runner returned an error.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// Every attempt failed; carries the retry budget and the last error.
    #[error("job runs exceeds the retry limit {retry}: {last}")]
    RetryExhausted { retry: u32, last: String },

    /// A topology operation failed.
    #[error("graph error: {0}")]
    Graph(GraphError),
}

impl ExecError {
    /// Whether this error reports a missing entity.
    pub fn is_not_exists(&self) -> bool {
        match self {
            Self::JobNotExists => true,
            Self::Graph(e) => e.is_not_exists(),
            _ => false,
        }
    }

    /// Whether this error reports a duplicate entity.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Graph(e) => e.is_already_exists(),
            _ => false,
        }
    }
}

impl From<GraphError> for ExecError {
    fn from(e: GraphError) -> Self {
        ExecError::Graph(e)
    }
}
