//! Matrix views over the facade for matrix-driven algorithms.
//!
//! Each view publishes its column order so callers can map indices back to
//! vertex keys.

use std::collections::HashMap;

use super::error::{GraphError, GraphResult};
use super::graph::Graph;
use crate::core::{Key, Weight};

/// n x n matrix with entry 1 iff an edge `head -> tail` exists (symmetric
/// for undirected graphs).
#[derive(Debug, Clone)]
pub struct AdjacencyMatrix<K> {
    vertexes: Vec<K>,
    data: Vec<Vec<u8>>,
}

impl<K: Key> AdjacencyMatrix<K> {
    pub fn new<V: Clone, W: Weight>(g: &Graph<K, V, W>) -> GraphResult<Self> {
        if g.order() == 0 {
            return Err(GraphError::EmptyGraph);
        }
        let vertexes: Vec<K> = g.all_vertexes().into_iter().map(|v| v.key).collect();
        let idx: HashMap<&K, usize> = vertexes.iter().enumerate().map(|(i, k)| (k, i)).collect();
        let n = vertexes.len();
        let mut data = vec![vec![0u8; n]; n];
        for e in g.all_edges() {
            let (i, j) = (idx[&e.head], idx[&e.tail]);
            data[i][j] = 1;
            if !g.is_directed() {
                data[j][i] = 1;
            }
        }
        Ok(Self { vertexes, data })
    }

    pub fn matrix(&self) -> &[Vec<u8>] {
        &self.data
    }

    pub fn columns(&self) -> &[K] {
        &self.vertexes
    }
}

/// n x n diagonal matrix of vertex degrees.
#[derive(Debug, Clone)]
pub struct DegreeMatrix<K> {
    vertexes: Vec<K>,
    data: Vec<Vec<usize>>,
}

impl<K: Key> DegreeMatrix<K> {
    pub fn new<V: Clone, W: Weight>(g: &Graph<K, V, W>) -> GraphResult<Self> {
        let vertexes: Vec<K> = g.all_vertexes().into_iter().map(|v| v.key).collect();
        let n = vertexes.len();
        let mut data = vec![vec![0usize; n]; n];
        for (i, k) in vertexes.iter().enumerate() {
            data[i][i] = g.degree(k)?;
        }
        Ok(Self { vertexes, data })
    }

    pub fn degrees(&self) -> &[Vec<usize>] {
        &self.data
    }

    pub fn columns(&self) -> &[K] {
        &self.vertexes
    }
}

/// n x n matrix of edge weights: diagonal zero, absent pairs hold the
/// weight type's maximum sentinel. Requires a simple graph so the entry per
/// pair is unambiguous.
#[derive(Debug, Clone)]
pub struct WeightMatrix<K, W> {
    none: W,
    vertexes: Vec<K>,
    data: Vec<Vec<W>>,
}

impl<K: Key, W: Weight> WeightMatrix<K, W> {
    pub fn new<V: Clone>(g: &Graph<K, V, W>) -> GraphResult<Self> {
        if g.order() == 0 {
            return Err(GraphError::EmptyGraph);
        }
        if !g.is_simple() {
            return Err(GraphError::NotSimple);
        }
        let none = W::max_value();
        let vertexes: Vec<K> = g.all_vertexes().into_iter().map(|v| v.key).collect();
        let idx: HashMap<&K, usize> = vertexes.iter().enumerate().map(|(i, k)| (k, i)).collect();
        let n = vertexes.len();
        let mut data = vec![vec![none; n]; n];
        for (i, row) in data.iter_mut().enumerate() {
            row[i] = W::zero();
        }
        for e in g.all_edges() {
            let (i, j) = (idx[&e.head], idx[&e.tail]);
            data[i][j] = e.weight;
            if !g.is_directed() {
                data[j][i] = e.weight;
            }
        }
        Ok(Self {
            none,
            vertexes,
            data,
        })
    }

    /// Re-materializes the matrix substituting `none` for absent pairs.
    pub fn weights(&self, none: W) -> Vec<Vec<W>> {
        self.data
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&w| if w == self.none { none } else { w })
                    .collect()
            })
            .collect()
    }

    /// Distances as floats with a caller-chosen infinity.
    pub fn distances(&self, infinite: f64) -> Vec<Vec<f64>> {
        self.data
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&w| if w == self.none { infinite } else { w.as_f64() })
                    .collect()
            })
            .collect()
    }

    pub fn columns(&self) -> &[K] {
        &self.vertexes
    }
}
