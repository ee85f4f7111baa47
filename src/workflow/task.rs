//! Tasks and their parameters.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::exec::BoxError;

/// A named parameter. When `reference` is set it points at a producing
/// parameter elsewhere in the workflow, as a dotted string
/// `workflow.task.input|output.name`; otherwise the literal value is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl Parameter {
    /// A parameter holding a literal value.
    pub fn literal(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            reference: None,
            value: value.into(),
        }
    }

    /// A parameter resolved from another task's parameter at run time.
    pub fn by_ref(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: Some(reference.into()),
            value: Value::Null,
        }
    }
}

/// A workflow node: a name and a runner from resolved inputs to produced
/// outputs. Runners execute on the blocking pool, so plain synchronous
/// code is fine.
pub trait Task: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, inputs: HashMap<String, Parameter>) -> Result<Vec<Parameter>, BoxError>;
}

/// A closure-backed task.
///
/// # Example
///
/// ```
/// use plegma::workflow::{GeneralTask, Parameter, Task};
///
/// let double = GeneralTask::new("double", |inputs| {
///     let x = inputs["x"].value.as_i64().unwrap_or(0);
///     Ok(vec![Parameter::literal("y", 2 * x)])
/// });
/// assert_eq!(double.name(), "double");
/// ```
pub struct GeneralTask {
    name: String,
    #[allow(clippy::type_complexity)]
    runner: Box<dyn Fn(HashMap<String, Parameter>) -> Result<Vec<Parameter>, BoxError> + Send + Sync>,
}

impl GeneralTask {
    pub fn new<F>(name: impl Into<String>, runner: F) -> Self
    where
        F: Fn(HashMap<String, Parameter>) -> Result<Vec<Parameter>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            runner: Box::new(runner),
        }
    }
}

impl Task for GeneralTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, inputs: HashMap<String, Parameter>) -> Result<Vec<Parameter>, BoxError> {
        (self.runner)(inputs)
    }
}

impl fmt::Debug for GeneralTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralTask")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
