//! The DAG-driven concurrent job engine.
//!
//! An [`ExecGraph`] owns a registry of job nodes and a directed dependency
//! topology. A single scheduling loop launches ready jobs, ingests their
//! results from a buffered inbox, and drives the global state machine;
//! the jobs themselves run as independent tokio tasks.

mod error;
#[allow(clippy::module_inception)]
mod graph;
mod node;

pub use error::{ExecError, ExecResult};
pub use graph::ExecGraph;
pub use node::{BoxError, JobFuture, JobInfo, Runner, State};
