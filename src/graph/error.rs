//! Error types for graph operations.
//!
//! Every fallible graph operation returns one of these sentinels; callers
//! can match on the variant or use the stable kind predicates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised by the graph model and the algorithm suite.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum GraphError {
    /// The referenced vertex is not in the graph.
    #[error("vertex not exists")]
    VertexNotExists,

    /// A vertex with the same key is already in the graph.
    #[error("vertex already exists")]
    VertexExists,

    /// The referenced edge is not in the graph.
    #[error("edge not exists")]
    EdgeNotExists,

    /// An edge with the same key is already in the graph.
    #[error("edge already exists")]
    EdgeExists,

    /// The property name is not recognized.
    #[error("unknown graph property")]
    UnknownProperty,

    /// The operation requires a directed graph.
    #[error("the graph is not digraph")]
    NotDigraph,

    /// A negative-weight cycle was found during shortest-path computation.
    #[error("found negative cycle")]
    HasNegativeCycle,

    /// The digraph contains a cycle where a DAG was required.
    #[error("current digraph is not DAG")]
    NotDAG,

    /// The graph is not connected where connectivity was required.
    #[error("current graph is not connected")]
    NotConnected,

    /// The graph has no vertices.
    #[error("current graph is empty")]
    EmptyGraph,

    /// The graph has loops or parallel edges where simplicity was required.
    #[error("current graph is not simple")]
    NotSimple,

    /// The edge would put both endpoints in the same part of a bipartition.
    #[error("violate the definition of bipartite")]
    ViolatesBipartite,

    /// Cloning the graph failed.
    #[error("clone current graph failed")]
    CloneFailed,

    /// The surface is a placeholder.
    #[error("not implement the method now")]
    NotImplemented,

    /// No feasible colouring exists with the supplied palette.
    #[error("no feasible colouring with the given palette")]
    NoColouring,

    /// The requested matching does not exist.
    #[error("the matching not exists")]
    MatchNotExists,
}

impl GraphError {
    /// Whether this error reports a missing entity.
    pub fn is_not_exists(&self) -> bool {
        matches!(self, Self::VertexNotExists | Self::EdgeNotExists)
    }

    /// Whether this error reports a duplicate entity.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::VertexExists | Self::EdgeExists)
    }
}
