//! Vertex and edge records, and the named-property surface.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A vertex: a unique key, an opaque payload, and a string label mapping.
///
/// Two vertices are equal iff their keys are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex<K, V> {
    pub key: K,
    pub value: V,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl<K, V> Vertex<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            labels: HashMap::new(),
        }
    }

    pub fn with_labels(key: K, value: V, labels: HashMap<String, String>) -> Self {
        Self { key, value, labels }
    }
}

impl<K: PartialEq, V> PartialEq for Vertex<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq, V> Eq for Vertex<K, V> {}

/// An edge: a unique key, head and tail vertex keys, a numeric weight, and
/// a string label mapping.
///
/// In a directed graph `head -> tail` is an ordered arc; in an undirected
/// graph the endpoints are unordered. Parallel edges between the same
/// endpoints are permitted, and `head == tail` is a loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge<K, W> {
    pub key: K,
    pub head: K,
    pub tail: K,
    pub weight: W,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl<K, W> Edge<K, W> {
    pub fn new(key: K, head: K, tail: K, weight: W) -> Self {
        Self {
            key,
            head,
            tail,
            weight,
            labels: HashMap::new(),
        }
    }

    /// Whether the edge joins a vertex to itself.
    pub fn is_loop(&self) -> bool
    where
        K: PartialEq,
    {
        self.head == self.tail
    }
}

impl<K: PartialEq, W> PartialEq for Edge<K, W> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

/// Names of the queryable graph properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphProperty {
    Digraph,
    Acyclic,
    Simple,
    Regular,
    Connected,
    UnilateralConnected,
    Forest,
    Tree,
    Complete,
    Loop,
    NegativeWeight,
    Name,
    Order,
    Size,
    MinDegree,
    MaxDegree,
    AvgDegree,
}

/// The value of a queried property, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(usize),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<usize> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Whether `labels` contains every key/value pair in `wanted`.
pub(crate) fn labels_match(labels: &HashMap<String, String>, wanted: &HashMap<String, String>) -> bool {
    wanted
        .iter()
        .all(|(k, v)| labels.get(k).map(|l| l == v).unwrap_or(false))
}
