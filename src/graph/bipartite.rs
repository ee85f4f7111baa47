//! Bipartite specialization: two disjoint vertex-key parts, and every edge
//! crosses between them.

use std::collections::{HashMap, HashSet, VecDeque};

use super::error::{GraphError, GraphResult};
use super::graph::Graph;
use super::types::{Edge, Vertex};
use crate::core::{Key, Weight};

/// A graph whose vertex set splits into two parts A and B such that every
/// edge has one endpoint in each part. Adding an edge inside one part fails
/// with [`GraphError::ViolatesBipartite`].
pub struct Bipartite<K, V, W> {
    g: Graph<K, V, W>,
    part_a: HashSet<K>,
    part_b: HashSet<K>,
}

impl<K: Key, V: Clone + std::fmt::Debug, W: Weight> std::fmt::Debug for Bipartite<K, V, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bipartite")
            .field("g", &self.g)
            .field("part_a", &self.part_a)
            .field("part_b", &self.part_b)
            .finish()
    }
}

impl<K: Key, V: Clone, W: Weight> Clone for Bipartite<K, V, W> {
    fn clone(&self) -> Self {
        Self {
            g: self.g.clone(),
            part_a: self.part_a.clone(),
            part_b: self.part_b.clone(),
        }
    }
}

impl<K: Key, V: Clone, W: Weight> Bipartite<K, V, W> {
    pub fn new(directed: bool, name: impl Into<String>) -> Self {
        Self {
            g: Graph::new(directed, name),
            part_a: HashSet::new(),
            part_b: HashSet::new(),
        }
    }

    /// The underlying read-only graph surface.
    pub fn graph(&self) -> &Graph<K, V, W> {
        &self.g
    }

    pub fn name(&self) -> &str {
        self.g.name()
    }

    pub fn is_directed(&self) -> bool {
        self.g.is_directed()
    }

    pub fn order(&self) -> usize {
        self.g.order()
    }

    pub fn size(&self) -> usize {
        self.g.size()
    }

    /// Adds a vertex, assigning it to a part by a stable hash of its key.
    /// Use [`Bipartite::add_vertex_to`] to choose the part explicitly.
    pub fn add_vertex(&mut self, v: Vertex<K, V>) -> GraphResult<()> {
        let to_a = seahash::hash(format!("{:?}", v.key).as_bytes()) % 2 == 0;
        self.add_vertex_to(v, to_a)
    }

    pub fn add_vertex_to(&mut self, v: Vertex<K, V>, part_a: bool) -> GraphResult<()> {
        let key = v.key.clone();
        self.g.add_vertex(v)?;
        if part_a {
            self.part_a.insert(key);
        } else {
            self.part_b.insert(key);
        }
        Ok(())
    }

    /// The vertices of one part.
    pub fn part(&self, part_a: bool) -> GraphResult<Vec<Vertex<K, V>>> {
        let keys = if part_a { &self.part_a } else { &self.part_b };
        keys.iter().map(|k| self.g.get_vertex(k)).collect()
    }

    pub(crate) fn part_keys(&self, part_a: bool) -> &HashSet<K> {
        if part_a {
            &self.part_a
        } else {
            &self.part_b
        }
    }

    pub fn remove_vertex(&mut self, key: &K) -> GraphResult<()> {
        self.g.remove_vertex(key)?;
        self.part_a.remove(key);
        self.part_b.remove(key);
        Ok(())
    }

    /// Adds an edge; both endpoints in the same part is a violation.
    pub fn add_edge(&mut self, edge: Edge<K, W>) -> GraphResult<()> {
        let same_a = self.part_a.contains(&edge.head) && self.part_a.contains(&edge.tail);
        let same_b = self.part_b.contains(&edge.head) && self.part_b.contains(&edge.tail);
        if same_a || same_b {
            return Err(GraphError::ViolatesBipartite);
        }
        self.g.add_edge(edge)
    }

    pub fn remove_edge_by_key(&mut self, key: &K) -> GraphResult<()> {
        self.g.remove_edge_by_key(key)
    }

    pub fn remove_edge(&mut self, v1: &K, v2: &K) -> GraphResult<()> {
        self.g.remove_edge(v1, v2)
    }

    pub fn degree(&self, key: &K) -> GraphResult<usize> {
        self.g.degree(key)
    }

    pub fn neighbours(&self, key: &K) -> GraphResult<Vec<Vertex<K, V>>> {
        self.g.neighbours(key)
    }

    pub fn get_vertex(&self, key: &K) -> GraphResult<Vertex<K, V>> {
        self.g.get_vertex(key)
    }

    pub fn get_edge(&self, v1: &K, v2: &K) -> GraphResult<Vec<Edge<K, W>>> {
        self.g.get_edge(v1, v2)
    }

    pub fn all_vertexes(&self) -> Vec<Vertex<K, V>> {
        self.g.all_vertexes()
    }

    pub fn all_edges(&self) -> Vec<Edge<K, W>> {
        self.g.all_edges()
    }
}

/// Whether the graph is 2-colourable. Every component is checked; graphs
/// with fewer than two vertices are not considered bipartite.
pub fn is_bipartite<K: Key, V: Clone, W: Weight>(g: &Graph<K, V, W>) -> GraphResult<bool> {
    let vertexes = g.all_vertexes();
    match vertexes.len() {
        0 | 1 => return Ok(false),
        2 => return Ok(true),
        _ => {}
    }

    let mut colour: HashMap<K, u8> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(vertexes[0].key.clone());
    colour.insert(vertexes[0].key.clone(), 0);

    loop {
        while let Some(u) = queue.pop_front() {
            let cu = colour.get(&u).copied().unwrap_or(0);
            for v in g.neighbours(&u)? {
                if v.key == u {
                    return Ok(false); // loop
                }
                match colour.get(&v.key) {
                    None => {
                        colour.insert(v.key.clone(), (cu + 1) % 2);
                        queue.push_back(v.key);
                    }
                    Some(&cv) if cv == cu => return Ok(false),
                    Some(_) => {}
                }
            }
        }
        if colour.len() == vertexes.len() {
            return Ok(true);
        }
        // next component
        match vertexes.iter().find(|v| !colour.contains_key(&v.key)) {
            Some(v) => {
                colour.insert(v.key.clone(), 0);
                queue.push_back(v.key.clone());
            }
            None => return Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_part_edge_rejected() {
        let mut bg: Bipartite<i64, (), i64> = Bipartite::new(false, "t");
        bg.add_vertex_to(Vertex::new(1, ()), true).unwrap();
        bg.add_vertex_to(Vertex::new(2, ()), true).unwrap();
        bg.add_vertex_to(Vertex::new(3, ()), false).unwrap();

        let err = bg.add_edge(Edge::new(100, 1, 2, 1)).unwrap_err();
        assert_eq!(err, GraphError::ViolatesBipartite);
        bg.add_edge(Edge::new(101, 1, 3, 1)).unwrap();
        assert_eq!(bg.size(), 1);
    }

    #[test]
    fn removing_vertex_clears_part_membership() {
        let mut bg: Bipartite<i64, (), i64> = Bipartite::new(false, "t");
        bg.add_vertex_to(Vertex::new(1, ()), true).unwrap();
        bg.remove_vertex(&1).unwrap();
        assert!(bg.part(true).unwrap().is_empty());
    }

    #[test]
    fn even_cycle_is_bipartite_odd_is_not() {
        let mut g: Graph<i64, (), i64> = Graph::new_undirected("t");
        for v in 1..=4 {
            g.add_vertex(Vertex::new(v, ())).unwrap();
        }
        for (k, h, t) in [(100, 1, 2), (101, 2, 3), (102, 3, 4), (103, 4, 1)] {
            g.add_edge(Edge::new(k, h, t, 1)).unwrap();
        }
        assert!(is_bipartite(&g).unwrap());

        g.add_edge(Edge::new(104, 1, 3, 1)).unwrap();
        assert!(!is_bipartite(&g).unwrap());
    }
}
