//! The graph facade: entity bookkeeping, versioned property cache, and the
//! directed query surface.

use std::collections::HashMap;
use std::sync::RwLock;

use rand::Rng;

use super::adjacency::AdjacencyIndex;
use super::error::{GraphError, GraphResult};
use super::types::{labels_match, Edge, GraphProperty, PropertyValue, Vertex};
use crate::core::{Key, SynthesizeKey, Weight};

/// A graph (directed or undirected) over keyed vertices and weighted edges.
///
/// The facade owns all vertex and edge records and hands out copies. Every
/// structural mutation bumps a monotonic version counter; derived properties
/// are computed lazily through the adjacency index and cached together with
/// the version they were computed at, so a stale cache entry is never
/// served. Order and size are read straight from the entity maps and never
/// cached.
///
/// The facade is not internally synchronized against concurrent structural
/// mutation; callers serialize externally. Property cache reads are safe
/// while no mutation is in flight.
///
/// # Example
///
/// ```
/// use plegma::{Graph, Vertex, Edge};
///
/// let mut g: Graph<i64, (), i64> = Graph::new_undirected("demo");
/// g.add_vertex(Vertex::new(1, ())).unwrap();
/// g.add_vertex(Vertex::new(2, ())).unwrap();
/// g.add_edge(Edge::new(100, 1, 2, 5)).unwrap();
///
/// assert_eq!(g.order(), 2);
/// assert_eq!(g.size(), 1);
/// assert!(g.is_connected());
/// ```
#[derive(Debug)]
pub struct Graph<K, V, W> {
    name: String,
    version: u64,
    vertexes: HashMap<K, Vertex<K, V>>,
    edges: HashMap<K, Edge<K, W>>,
    adj: AdjacencyIndex<K, W>,
    cache: RwLock<HashMap<GraphProperty, (u64, PropertyValue)>>,
}

impl<K: Key, V: Clone, W: Weight> Graph<K, V, W> {
    pub fn new(directed: bool, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            vertexes: HashMap::new(),
            edges: HashMap::new(),
            adj: AdjacencyIndex::new(directed),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn new_digraph(name: impl Into<String>) -> Self {
        Self::new(true, name)
    }

    pub fn new_undirected(name: impl Into<String>) -> Self {
        Self::new(false, name)
    }

    /// Builds a graph from vertex and edge sets.
    pub fn construct(
        directed: bool,
        name: impl Into<String>,
        vertexes: Vec<Vertex<K, V>>,
        edges: Vec<Edge<K, W>>,
    ) -> GraphResult<Self> {
        let mut g = Self::new(directed, name);
        for v in vertexes {
            g.add_vertex(v)?;
        }
        for e in edges {
            g.add_edge(e)?;
        }
        Ok(g)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_directed(&self) -> bool {
        self.adj.is_directed()
    }

    /// |V|. Never cached.
    pub fn order(&self) -> usize {
        self.vertexes.len()
    }

    /// |E|. Never cached.
    pub fn size(&self) -> usize {
        self.edges.len()
    }

    /// The structural version; strictly increases on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    // ------------------------------------------------------------------
    // Cached derived properties
    // ------------------------------------------------------------------

    fn cached(
        &self,
        p: GraphProperty,
        compute: impl FnOnce(&AdjacencyIndex<K, W>) -> PropertyValue,
    ) -> PropertyValue {
        if let Ok(cache) = self.cache.read() {
            if let Some((ver, val)) = cache.get(&p) {
                if *ver == self.version {
                    return val.clone();
                }
            }
        }
        let val = compute(&self.adj);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(p, (self.version, val.clone()));
        }
        val
    }

    fn cached_bool(&self, p: GraphProperty, f: impl FnOnce(&AdjacencyIndex<K, W>) -> bool) -> bool {
        self.cached(p, |adj| PropertyValue::Bool(f(adj)))
            .as_bool()
            .unwrap_or(false)
    }

    pub fn is_simple(&self) -> bool {
        self.cached_bool(GraphProperty::Simple, |adj| adj.is_simple())
    }

    pub fn is_regular(&self) -> bool {
        self.cached_bool(GraphProperty::Regular, |adj| adj.is_regular())
    }

    pub fn is_acyclic(&self) -> bool {
        self.cached_bool(GraphProperty::Acyclic, |adj| adj.is_acyclic())
    }

    /// Connectivity. For directed graphs this is weak connectivity: one BFS
    /// over the union of both directions reaches every vertex.
    pub fn is_connected(&self) -> bool {
        self.cached_bool(GraphProperty::Connected, |adj| adj.is_connected())
    }

    /// Unilateral connectivity for directed graphs: between every vertex
    /// pair at least one direction has a path. Computed via the SCC
    /// condensation in O(V+E). Always false for undirected graphs.
    pub fn is_unilateral_connected(&self) -> bool {
        self.cached_bool(GraphProperty::UnilateralConnected, |adj| adj.is_unilateral())
    }

    pub fn is_forest(&self) -> bool {
        self.cached_bool(GraphProperty::Forest, |adj| adj.is_forest())
    }

    pub fn is_tree(&self) -> bool {
        self.is_connected() && self.is_forest()
    }

    pub fn is_complete(&self) -> bool {
        if self.order() == 0 {
            return false;
        }
        self.is_simple() && self.min_degree() == self.order() - 1
    }

    pub fn has_loop(&self) -> bool {
        self.cached_bool(GraphProperty::Loop, |adj| adj.has_loop())
    }

    pub fn has_negative_weight(&self) -> bool {
        self.cached_bool(GraphProperty::NegativeWeight, |adj| adj.has_negative_weight())
    }

    pub fn min_degree(&self) -> usize {
        self.cached(GraphProperty::MinDegree, |adj| {
            PropertyValue::Int(adj.min_degree())
        })
        .as_int()
        .unwrap_or(0)
    }

    pub fn max_degree(&self) -> usize {
        self.cached(GraphProperty::MaxDegree, |adj| {
            PropertyValue::Int(adj.max_degree())
        })
        .as_int()
        .unwrap_or(0)
    }

    pub fn avg_degree(&self) -> f64 {
        if self.order() == 0 {
            return 0.0;
        }
        let avg = 2.0 * self.size() as f64 / self.order() as f64;
        self.cached(GraphProperty::AvgDegree, |_| PropertyValue::Float(avg))
            .as_float()
            .unwrap_or(avg)
    }

    /// Single dispatcher over the named property surface.
    pub fn property(&self, p: GraphProperty) -> GraphResult<PropertyValue> {
        let v = match p {
            GraphProperty::Digraph => PropertyValue::Bool(self.is_directed()),
            GraphProperty::Acyclic => PropertyValue::Bool(self.is_acyclic()),
            GraphProperty::Simple => PropertyValue::Bool(self.is_simple()),
            GraphProperty::Regular => PropertyValue::Bool(self.is_regular()),
            GraphProperty::Connected => PropertyValue::Bool(self.is_connected()),
            GraphProperty::UnilateralConnected => {
                PropertyValue::Bool(self.is_unilateral_connected())
            }
            GraphProperty::Forest => PropertyValue::Bool(self.is_forest()),
            GraphProperty::Tree => PropertyValue::Bool(self.is_tree()),
            GraphProperty::Complete => PropertyValue::Bool(self.is_complete()),
            GraphProperty::Loop => PropertyValue::Bool(self.has_loop()),
            GraphProperty::NegativeWeight => PropertyValue::Bool(self.has_negative_weight()),
            GraphProperty::Name => PropertyValue::Text(self.name.clone()),
            GraphProperty::Order => PropertyValue::Int(self.order()),
            GraphProperty::Size => PropertyValue::Int(self.size()),
            GraphProperty::MinDegree => PropertyValue::Int(self.min_degree()),
            GraphProperty::MaxDegree => PropertyValue::Int(self.max_degree()),
            GraphProperty::AvgDegree => PropertyValue::Float(self.avg_degree()),
        };
        Ok(v)
    }

    // ------------------------------------------------------------------
    // Entity CRUD
    // ------------------------------------------------------------------

    pub fn all_vertexes(&self) -> Vec<Vertex<K, V>> {
        self.vertexes.values().cloned().collect()
    }

    pub fn all_edges(&self) -> Vec<Edge<K, W>> {
        self.edges.values().cloned().collect()
    }

    pub fn add_vertex(&mut self, v: Vertex<K, V>) -> GraphResult<()> {
        if self.vertexes.contains_key(&v.key) {
            return Err(GraphError::VertexExists);
        }
        self.adj.add_vertex(v.key.clone());
        self.vertexes.insert(v.key.clone(), v);
        self.version += 1;
        Ok(())
    }

    /// Removes a vertex and, atomically with it, every incident edge.
    pub fn remove_vertex(&mut self, key: &K) -> GraphResult<()> {
        if !self.vertexes.contains_key(key) {
            return Err(GraphError::VertexNotExists);
        }
        self.adj.remove_vertex(key)?;
        self.edges.retain(|_, e| e.head != *key && e.tail != *key);
        self.vertexes.remove(key);
        self.version += 1;
        Ok(())
    }

    pub fn add_edge(&mut self, edge: Edge<K, W>) -> GraphResult<()> {
        if self.edges.contains_key(&edge.key) {
            return Err(GraphError::EdgeExists);
        }
        self.adj
            .add_edge(&edge.head, &edge.tail, &edge.key, edge.weight)?;
        self.edges.insert(edge.key.clone(), edge);
        self.version += 1;
        Ok(())
    }

    /// Adds an edge with a synthesized key and returns it.
    ///
    /// Candidates derive deterministically from the endpoint keys; the
    /// nonce is bumped until the key is collision-free within this graph.
    pub fn add_edge_auto(&mut self, head: K, tail: K, weight: W) -> GraphResult<K>
    where
        K: SynthesizeKey,
    {
        let mut nonce = 0u64;
        let key = loop {
            let k = K::synthesize(&head, &tail, nonce);
            if !self.edges.contains_key(&k) {
                break k;
            }
            nonce += 1;
        };
        self.add_edge(Edge::new(key.clone(), head, tail, weight))?;
        Ok(key)
    }

    pub fn remove_edge_by_key(&mut self, key: &K) -> GraphResult<()> {
        let e = self.edges.get(key).ok_or(GraphError::EdgeNotExists)?;
        let (head, tail, k) = (e.head.clone(), e.tail.clone(), e.key.clone());
        self.adj.remove_edge(&head, &tail, &k)?;
        self.edges.remove(key);
        self.version += 1;
        Ok(())
    }

    /// Removes every edge between the endpoint pair (either orientation for
    /// directed graphs, matching the endpoint-pair surface).
    pub fn remove_edge(&mut self, v1: &K, v2: &K) -> GraphResult<()> {
        let keys: Vec<K> = self
            .edges
            .values()
            .filter(|e| {
                (e.head == *v1 && e.tail == *v2) || (e.head == *v2 && e.tail == *v1)
            })
            .map(|e| e.key.clone())
            .collect();
        if keys.is_empty() {
            return Err(GraphError::EdgeNotExists);
        }
        for k in keys {
            self.remove_edge_by_key(&k)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn degree(&self, key: &K) -> GraphResult<usize> {
        if !self.vertexes.contains_key(key) {
            return Err(GraphError::VertexNotExists);
        }
        self.adj.degree(key)
    }

    pub fn neighbours(&self, key: &K) -> GraphResult<Vec<Vertex<K, V>>> {
        let keys = self.adj.neighbours(key, false)?;
        self.collect_vertexes(&keys)
    }

    pub fn get_vertex(&self, key: &K) -> GraphResult<Vertex<K, V>> {
        self.vertexes
            .get(key)
            .cloned()
            .ok_or(GraphError::VertexNotExists)
    }

    pub fn contains_vertex(&self, key: &K) -> bool {
        self.vertexes.contains_key(key)
    }

    /// Every edge between the endpoint pair; for undirected graphs both
    /// orientations match.
    pub fn get_edge(&self, v1: &K, v2: &K) -> GraphResult<Vec<Edge<K, W>>> {
        let edges: Vec<Edge<K, W>> = self
            .edges
            .values()
            .filter(|e| {
                (e.head == *v1 && e.tail == *v2)
                    || (!self.is_directed() && e.head == *v2 && e.tail == *v1)
            })
            .cloned()
            .collect();
        if edges.is_empty() {
            return Err(GraphError::EdgeNotExists);
        }
        Ok(edges)
    }

    pub fn get_edge_by_key(&self, key: &K) -> GraphResult<Edge<K, W>> {
        self.edges
            .get(key)
            .cloned()
            .ok_or(GraphError::EdgeNotExists)
    }

    /// Vertices whose label map contains every pair in `labels`.
    pub fn vertexes_by_label(&self, labels: &HashMap<String, String>) -> Vec<Vertex<K, V>> {
        self.vertexes
            .values()
            .filter(|v| labels_match(&v.labels, labels))
            .cloned()
            .collect()
    }

    /// Edges whose label map contains every pair in `labels`.
    pub fn edges_by_label(&self, labels: &HashMap<String, String>) -> Vec<Edge<K, W>> {
        self.edges
            .values()
            .filter(|e| labels_match(&e.labels, labels))
            .cloned()
            .collect()
    }

    pub fn set_vertex_value(&mut self, key: &K, value: V) -> GraphResult<()> {
        let v = self
            .vertexes
            .get_mut(key)
            .ok_or(GraphError::VertexNotExists)?;
        v.value = value;
        Ok(())
    }

    pub fn set_vertex_label(
        &mut self,
        key: &K,
        label_key: impl Into<String>,
        label_val: impl Into<String>,
    ) -> GraphResult<()> {
        let v = self
            .vertexes
            .get_mut(key)
            .ok_or(GraphError::VertexNotExists)?;
        v.labels.insert(label_key.into(), label_val.into());
        Ok(())
    }

    pub fn delete_vertex_label(&mut self, key: &K, label_key: &str) -> GraphResult<()> {
        let v = self
            .vertexes
            .get_mut(key)
            .ok_or(GraphError::VertexNotExists)?;
        v.labels.remove(label_key);
        Ok(())
    }

    pub fn set_edge_label_by_key(
        &mut self,
        key: &K,
        label_key: impl Into<String>,
        label_val: impl Into<String>,
    ) -> GraphResult<()> {
        let e = self.edges.get_mut(key).ok_or(GraphError::EdgeNotExists)?;
        e.labels.insert(label_key.into(), label_val.into());
        Ok(())
    }

    pub fn delete_edge_label_by_key(&mut self, key: &K, label_key: &str) -> GraphResult<()> {
        let e = self.edges.get_mut(key).ok_or(GraphError::EdgeNotExists)?;
        e.labels.remove(label_key);
        Ok(())
    }

    /// Labels every edge between the endpoint pair.
    pub fn set_edge_label(
        &mut self,
        v1: &K,
        v2: &K,
        label_key: impl Into<String> + Clone,
        label_val: impl Into<String> + Clone,
    ) -> GraphResult<()> {
        let keys: Vec<K> = self.get_edge(v1, v2)?.into_iter().map(|e| e.key).collect();
        for k in keys {
            self.set_edge_label_by_key(&k, label_key.clone(), label_val.clone())?;
        }
        Ok(())
    }

    pub fn delete_edge_label(&mut self, v1: &K, v2: &K, label_key: &str) -> GraphResult<()> {
        let keys: Vec<K> = self.get_edge(v1, v2)?.into_iter().map(|e| e.key).collect();
        for k in keys {
            self.delete_edge_label_by_key(&k, label_key)?;
        }
        Ok(())
    }

    /// Every edge incident to the vertex.
    pub fn incident_edges(&self, vertex: &K) -> GraphResult<Vec<Edge<K, W>>> {
        if !self.vertexes.contains_key(vertex) {
            return Err(GraphError::VertexNotExists);
        }
        Ok(self
            .edges
            .values()
            .filter(|e| e.head == *vertex || e.tail == *vertex)
            .cloned()
            .collect())
    }

    /// Edges sharing an endpoint with the given edge.
    pub fn neighbour_edges_by_key(&self, edge: &K) -> GraphResult<Vec<Edge<K, W>>> {
        let e = self.edges.get(edge).ok_or(GraphError::EdgeNotExists)?;
        Ok(self
            .edges
            .values()
            .filter(|o| {
                o.key != e.key
                    && (o.head == e.head || o.head == e.tail || o.tail == e.head || o.tail == e.tail)
            })
            .cloned()
            .collect())
    }

    /// Edges sharing an endpoint with any edge between the endpoint pair.
    pub fn neighbour_edges(&self, v1: &K, v2: &K) -> GraphResult<Vec<Edge<K, W>>> {
        let es = self.get_edge(v1, v2)?;
        match es.first() {
            Some(e) => self.neighbour_edges_by_key(&e.key),
            None => Ok(Vec::new()),
        }
    }

    pub fn random_vertex(&self) -> GraphResult<Vertex<K, V>> {
        if self.vertexes.is_empty() {
            return Err(GraphError::VertexNotExists);
        }
        let n = rand::thread_rng().gen_range(0..self.vertexes.len());
        self.vertexes
            .values()
            .nth(n)
            .cloned()
            .ok_or(GraphError::VertexNotExists)
    }

    pub fn random_edge(&self) -> GraphResult<Edge<K, W>> {
        if self.edges.is_empty() {
            return Err(GraphError::EdgeNotExists);
        }
        let n = rand::thread_rng().gen_range(0..self.edges.len());
        self.edges
            .values()
            .nth(n)
            .cloned()
            .ok_or(GraphError::EdgeNotExists)
    }

    // ------------------------------------------------------------------
    // Directed surface
    // ------------------------------------------------------------------

    pub fn in_degree(&self, vertex: &K) -> GraphResult<usize> {
        self.adj.in_degree(vertex)
    }

    pub fn out_degree(&self, vertex: &K) -> GraphResult<usize> {
        self.adj.out_degree(vertex)
    }

    /// Heads of all arcs pointing at the vertex.
    pub fn in_neighbours(&self, vertex: &K) -> GraphResult<Vec<Vertex<K, V>>> {
        let keys = self.adj.in_neighbours(vertex, false)?;
        self.collect_vertexes(&keys)
    }

    /// Tails of all arcs leaving the vertex.
    pub fn out_neighbours(&self, vertex: &K) -> GraphResult<Vec<Vertex<K, V>>> {
        let keys = self.adj.out_neighbours(vertex, false)?;
        self.collect_vertexes(&keys)
    }

    pub fn in_edges(&self, vertex: &K) -> GraphResult<Vec<Edge<K, W>>> {
        let keys = self.adj.in_edges(vertex)?;
        self.collect_edges(&keys)
    }

    pub fn out_edges(&self, vertex: &K) -> GraphResult<Vec<Edge<K, W>>> {
        let keys = self.adj.out_edges(vertex)?;
        self.collect_edges(&keys)
    }

    /// Vertices with in-degree zero. Directed graphs only.
    pub fn sources(&self) -> GraphResult<Vec<Vertex<K, V>>> {
        let keys = self.adj.sources()?;
        self.collect_vertexes(&keys)
    }

    /// Vertices with out-degree zero. Directed graphs only.
    pub fn sinks(&self) -> GraphResult<Vec<Vertex<K, V>>> {
        let keys = self.adj.sinks()?;
        self.collect_vertexes(&keys)
    }

    /// The vertex sets of all cycles: nontrivial strongly connected
    /// components, plus self-loop singletons.
    pub fn detect_cycle(&self) -> GraphResult<Vec<Vec<K>>> {
        if !self.is_directed() {
            return Err(GraphError::NotDigraph);
        }
        let mut cycles: Vec<Vec<K>> = self
            .adj
            .strongly_connected_components()
            .into_iter()
            .filter(|c| c.len() > 1)
            .collect();
        for e in self.edges.values() {
            if e.head == e.tail && !cycles.iter().any(|c| c.len() == 1 && c[0] == e.head) {
                cycles.push(vec![e.head.clone()]);
            }
        }
        Ok(cycles)
    }

    fn collect_vertexes(&self, keys: &[K]) -> GraphResult<Vec<Vertex<K, V>>> {
        keys.iter()
            .map(|k| {
                self.vertexes
                    .get(k)
                    .cloned()
                    .ok_or(GraphError::VertexNotExists)
            })
            .collect()
    }

    fn collect_edges(&self, keys: &[K]) -> GraphResult<Vec<Edge<K, W>>> {
        keys.iter()
            .map(|k| self.edges.get(k).cloned().ok_or(GraphError::EdgeNotExists))
            .collect()
    }

    pub(crate) fn adjacency(&self) -> &AdjacencyIndex<K, W> {
        &self.adj
    }
}

impl<K: Key, V: Clone, W: Weight> Clone for Graph<K, V, W> {
    fn clone(&self) -> Self {
        let cache = self
            .cache
            .read()
            .map(|c| c.clone())
            .unwrap_or_default();
        Self {
            name: self.name.clone(),
            version: self.version,
            vertexes: self.vertexes.clone(),
            edges: self.edges.clone(),
            adj: self.adj.clone(),
            cache: RwLock::new(cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn undirected(edges: &[(i64, i64, i64, i64)]) -> Graph<i64, (), i64> {
        let mut g = Graph::new_undirected("t");
        let mut vs: Vec<i64> = edges.iter().flat_map(|&(_, h, t, _)| [h, t]).collect();
        vs.sort();
        vs.dedup();
        for v in vs {
            g.add_vertex(Vertex::new(v, ())).unwrap();
        }
        for &(k, h, t, w) in edges {
            g.add_edge(Edge::new(k, h, t, w)).unwrap();
        }
        g
    }

    #[test]
    fn duplicate_vertex_rejected() {
        let mut g: Graph<i64, (), i64> = Graph::new_undirected("t");
        g.add_vertex(Vertex::new(1, ())).unwrap();
        let err = g.add_vertex(Vertex::new(1, ())).unwrap_err();
        assert_eq!(err, GraphError::VertexExists);
        assert!(err.is_already_exists());
    }

    #[test]
    fn add_remove_vertex_round_trip() {
        let mut g: Graph<i64, (), i64> = Graph::new_undirected("t");
        g.add_vertex(Vertex::new(1, ())).unwrap();
        assert_eq!(g.order(), 1);
        g.remove_vertex(&1).unwrap();
        assert_eq!(g.order(), 0);
        assert!(g.remove_vertex(&1).unwrap_err().is_not_exists());
    }

    #[test]
    fn version_bumps_on_structural_mutation() {
        let mut g: Graph<i64, (), i64> = Graph::new_undirected("t");
        let v0 = g.version();
        g.add_vertex(Vertex::new(1, ())).unwrap();
        assert!(g.version() > v0);
        let v1 = g.version();
        g.add_vertex(Vertex::new(2, ())).unwrap();
        g.add_edge(Edge::new(100, 1, 2, 1)).unwrap();
        assert!(g.version() > v1);
    }

    #[test]
    fn labels_do_not_bump_version() {
        let mut g: Graph<i64, (), i64> = Graph::new_undirected("t");
        g.add_vertex(Vertex::new(1, ())).unwrap();
        let v = g.version();
        g.set_vertex_label(&1, "env", "prod").unwrap();
        assert_eq!(g.version(), v);
    }

    #[test]
    fn property_cache_invalidation_scenario() {
        // undirected graph on 1..=6, edges 1-2, 1-3, 2-3, 4-5, 5-6
        let mut g = undirected(&[
            (100, 1, 2, 1),
            (101, 1, 3, 1),
            (102, 2, 3, 1),
            (103, 4, 5, 1),
            (104, 5, 6, 1),
        ]);
        assert_eq!(g.order(), 6);
        assert_eq!(g.size(), 5);
        assert!(g.is_simple());
        assert!(!g.is_connected());
        assert!(!g.is_acyclic());

        g.remove_vertex(&1).unwrap();
        assert_eq!(g.order(), 5);
        assert_eq!(g.size(), 3);
        assert!(g.is_simple());
        assert!(!g.is_connected());
        assert!(g.is_acyclic());
    }

    #[test]
    fn directed_acyclicity_after_edit_scenario() {
        // 1->2->3, 4->5->6, 2->5
        let mut g: Graph<i64, (), i64> = Graph::new_digraph("t");
        for v in 1..=6 {
            g.add_vertex(Vertex::new(v, ())).unwrap();
        }
        for (k, h, t) in [(1, 1, 2), (2, 2, 3), (3, 4, 5), (4, 5, 6), (5, 2, 5)] {
            g.add_edge(Edge::new(100 + k, h, t, 1)).unwrap();
        }
        assert!(g.is_connected());
        assert!(!g.is_unilateral_connected());
        assert!(g.is_acyclic());

        g.add_edge(Edge::new(200, 5, 1, 1)).unwrap();
        assert!(!g.is_acyclic());
    }

    #[test]
    fn edge_key_synthesis_is_collision_checked() {
        let mut g: Graph<String, (), i64> = Graph::new_undirected("t");
        g.add_vertex(Vertex::new("a".into(), ())).unwrap();
        g.add_vertex(Vertex::new("b".into(), ())).unwrap();
        let k1 = g.add_edge_auto("a".into(), "b".into(), 1).unwrap();
        let k2 = g.add_edge_auto("a".into(), "b".into(), 2).unwrap();
        assert_eq!(k1, "a-b");
        assert_eq!(k2, "a-b#1");
        assert_eq!(g.size(), 2);
    }

    #[test]
    fn duplicate_edge_key_rejected() {
        let mut g = undirected(&[(100, 1, 2, 1)]);
        let err = g.add_edge(Edge::new(100, 1, 2, 9)).unwrap_err();
        assert_eq!(err, GraphError::EdgeExists);
    }

    #[test]
    fn degree_counts_parallel_edges() {
        let g = undirected(&[(100, 1, 2, 1), (101, 1, 2, 1)]);
        assert_eq!(g.degree(&1).unwrap(), 2);
        assert!(!g.is_simple());
    }

    #[test]
    fn endpoint_pair_fetch_and_removal() {
        let mut g = undirected(&[(100, 1, 2, 1), (101, 2, 1, 3), (102, 2, 3, 1)]);
        assert_eq!(g.get_edge(&1, &2).unwrap().len(), 2);
        g.remove_edge(&1, &2).unwrap();
        assert!(g.get_edge(&1, &2).is_err());
        assert_eq!(g.size(), 1);
    }

    #[test]
    fn label_filtering() {
        let mut g = undirected(&[(100, 1, 2, 1)]);
        g.set_vertex_label(&1, "tier", "web").unwrap();
        g.set_vertex_label(&2, "tier", "db").unwrap();
        let wanted: HashMap<String, String> =
            [("tier".to_string(), "web".to_string())].into_iter().collect();
        let vs = g.vertexes_by_label(&wanted);
        assert_eq!(vs.len(), 1);
        assert_eq!(vs[0].key, 1);
    }

    #[test]
    fn directed_queries() {
        let mut g: Graph<i64, (), i64> = Graph::new_digraph("t");
        for v in 1..=3 {
            g.add_vertex(Vertex::new(v, ())).unwrap();
        }
        g.add_edge(Edge::new(100, 1, 2, 1)).unwrap();
        g.add_edge(Edge::new(101, 2, 3, 1)).unwrap();
        assert_eq!(g.in_degree(&2).unwrap(), 1);
        assert_eq!(g.out_degree(&2).unwrap(), 1);
        assert_eq!(g.sources().unwrap()[0].key, 1);
        assert_eq!(g.sinks().unwrap()[0].key, 3);
        assert!(g.detect_cycle().unwrap().is_empty());

        let mut cyclic = g.clone();
        cyclic.add_edge(Edge::new(102, 3, 1, 1)).unwrap();
        let cycles = cyclic.detect_cycle().unwrap();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
    }

    #[test]
    fn clone_is_independent() {
        let g = undirected(&[(100, 1, 2, 1)]);
        let mut c = g.clone();
        c.remove_vertex(&1).unwrap();
        assert_eq!(g.order(), 2);
        assert_eq!(c.order(), 1);
    }
}
