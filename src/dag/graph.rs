//! DirectedGraph - adjacency-list directed graph (Arc<str> optimized)
//!
//! The same structure carries both pipeline views:
//! - dependency view: stage -> stages it depends on
//! - execution-order view: stage -> stages that run after it
//!
//! Performance notes:
//! - Arc<str> for zero-cost cloning of stage IDs
//! - FxHashMap for the key index
//! - SmallVec for stack-allocated small neighbor lists (0-4 items)
//!
//! Node order is insertion order and drives iteration, serialization
//! and layout, so output is deterministic.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

/// Stack-allocated neighbor list: most stages have 0-4 neighbors
pub type AdjVec = SmallVec<[Arc<str>; 4]>;

/// Directed graph stored as `node -> ordered neighbor list`.
///
/// Every node that appears in a neighbor list is also a key, so the
/// graph is always closed over its own IDs.
#[derive(Debug, Clone, Default)]
pub struct DirectedGraph {
    /// All node IDs in insertion order
    nodes: Vec<Arc<str>>,
    /// node -> ordered neighbors
    adjacency: FxHashMap<Arc<str>, AdjVec>,
}

impl DirectedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            adjacency: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Build a graph from `(node, neighbors)` entries.
    ///
    /// Neighbors that never appear as a key are registered as nodes with
    /// no outgoing edges.
    pub fn from_adjacency<I, K, V, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for (node, neighbors) in entries {
            let node = graph.add_node(node.as_ref());
            for neighbor in neighbors {
                graph.add_edge(&node, neighbor.as_ref());
            }
        }
        graph
    }

    /// Register a node, returning its shared ID. Idempotent.
    pub fn add_node(&mut self, id: &str) -> Arc<str> {
        if let Some((key, _)) = self.adjacency.get_key_value(id) {
            return Arc::clone(key);
        }
        let key: Arc<str> = Arc::from(id);
        self.nodes.push(Arc::clone(&key));
        self.adjacency.insert(Arc::clone(&key), AdjVec::new());
        key
    }

    /// Append `to` to the neighbor list of `from`. Both endpoints become nodes.
    ///
    /// No validation: parallel edges and self-loops are stored as given.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let to = self.add_node(to);
        let from = self.add_node(from);
        self.adjacency.entry(from).or_default().push(to);
    }

    /// Remove every `from -> to` entry. Returns whether anything was removed.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        match self.adjacency.get_mut(from) {
            Some(neighbors) => {
                let before = neighbors.len();
                neighbors.retain(|n| n.as_ref() != to);
                neighbors.len() != before
            }
            None => false,
        }
    }

    /// Return a new graph without `id`, purged from every neighbor list.
    ///
    /// Deleting an unknown node is a recoverable no-op: a warning is
    /// logged and an unchanged copy is returned.
    pub fn delete_node(&self, id: &str) -> Self {
        if !self.contains(id) {
            tracing::warn!(node = %id, "delete requested for unknown node, graph left unchanged");
            return self.clone();
        }

        let mut result = Self::with_capacity(self.nodes.len() - 1);
        for node in self.nodes.iter().filter(|n| n.as_ref() != id) {
            let neighbors: AdjVec = self
                .neighbors(node)
                .iter()
                .filter(|n| n.as_ref() != id)
                .cloned()
                .collect();
            result.nodes.push(Arc::clone(node));
            result.adjacency.insert(Arc::clone(node), neighbors);
        }
        result
    }

    /// Return a new graph with every edge `A -> B` reversed to `B -> A`.
    ///
    /// Every node of the input is a key of the output; nodes without
    /// incoming edges get an empty list. Node order is preserved.
    pub fn transpose(&self) -> Self {
        let mut result = Self::with_capacity(self.nodes.len());
        for node in &self.nodes {
            result.nodes.push(Arc::clone(node));
            result.adjacency.insert(Arc::clone(node), AdjVec::new());
        }

        for node in &self.nodes {
            for neighbor in self.neighbors(node) {
                // Keys are closed over neighbors, but keep the output
                // well-formed even for hand-assembled inputs.
                let target = result.add_node(neighbor);
                result
                    .adjacency
                    .entry(target)
                    .or_default()
                    .push(Arc::clone(node));
            }
        }
        result
    }

    /// Check if node exists
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.adjacency.contains_key(id)
    }

    /// Neighbors of a node (empty for unknown nodes)
    #[inline]
    pub fn neighbors(&self, id: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.adjacency.get(id).map_or(EMPTY, SmallVec::as_slice)
    }

    /// Number of outgoing edges of a node
    #[inline]
    pub fn out_degree(&self, id: &str) -> usize {
        self.neighbors(id).len()
    }

    /// All node IDs in insertion order
    pub fn nodes(&self) -> &[Arc<str>] {
        &self.nodes
    }

    /// Explicit edge list `(from, to)` in node order
    pub fn edges(&self) -> Vec<(Arc<str>, Arc<str>)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for node in &self.nodes {
            for neighbor in self.neighbors(node) {
                edges.push((Arc::clone(node), Arc::clone(neighbor)));
            }
        }
        edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(SmallVec::len).sum()
    }
}

/// Equality ignores key order; neighbor lists are compared in order.
impl PartialEq for DirectedGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.len() == other.nodes.len()
            && self
                .adjacency
                .iter()
                .all(|(node, neighbors)| other.adjacency.get(node) == Some(neighbors))
    }
}

impl Eq for DirectedGraph {}

impl Serialize for DirectedGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.nodes.len()))?;
        for node in &self.nodes {
            let neighbors: Vec<&str> = self.neighbors(node).iter().map(AsRef::as_ref).collect();
            map.serialize_entry(node.as_ref(), &neighbors)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DirectedGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GraphVisitor;

        impl<'de> Visitor<'de> for GraphVisitor {
            type Value = DirectedGraph;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of node ID to a list of node IDs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut graph = DirectedGraph::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((node, neighbors)) = access.next_entry::<String, Vec<String>>()? {
                    let node = graph.add_node(&node);
                    for neighbor in &neighbors {
                        graph.add_edge(&node, neighbor);
                    }
                }
                Ok(graph)
            }
        }

        deserializer.deserialize_map(GraphVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(slice: &[Arc<str>]) -> Vec<&str> {
        slice.iter().map(AsRef::as_ref).collect()
    }

    // ═══════════════════════════════════════════════════════════════
    // CONSTRUCTION TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_add_edge_registers_both_endpoints() {
        let mut graph = DirectedGraph::new();
        graph.add_edge("b", "a");

        assert!(graph.contains("a"));
        assert!(graph.contains("b"));
        assert_eq!(ids(graph.neighbors("b")), vec!["a"]);
        assert!(graph.neighbors("a").is_empty());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_add_node_is_idempotent_and_reuses_arc() {
        let mut graph = DirectedGraph::new();
        let first = graph.add_node("compile");
        let second = graph.add_node("compile");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_from_adjacency_preserves_order() {
        let graph = DirectedGraph::from_adjacency([("c", vec!["a", "b"]), ("a", vec![])]);
        assert_eq!(ids(graph.nodes()), vec!["c", "a", "b"]);
        assert_eq!(ids(graph.neighbors("c")), vec!["a", "b"]);
    }

    // ═══════════════════════════════════════════════════════════════
    // DELETE NODE TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_delete_node_purges_key_and_references() {
        let graph =
            DirectedGraph::from_adjacency([("a", vec![]), ("b", vec!["a"]), ("c", vec!["a", "b"])]);
        let result = graph.delete_node("a");

        assert!(!result.contains("a"));
        assert!(result.edges().iter().all(|(f, t)| f.as_ref() != "a" && t.as_ref() != "a"));
        assert_eq!(ids(result.neighbors("c")), vec!["b"]);
        assert!(result.neighbors("b").is_empty());
        // Input untouched
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_delete_unknown_node_is_noop() {
        let graph = DirectedGraph::from_adjacency([("a", vec![]), ("b", vec!["a"])]);
        let result = graph.delete_node("ghost");
        assert_eq!(result, graph);
    }

    #[test]
    fn test_delete_unknown_node_warns() {
        use std::io;
        use std::sync::Mutex;

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let graph = DirectedGraph::from_adjacency([("a", vec!["b"])]);
        tracing::subscriber::with_default(subscriber, || {
            let _ = graph.delete_node("a");
            let _ = graph.delete_node("ghost");
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("delete requested for unknown node").count(), 1);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("node=ghost"));
    }

    // ═══════════════════════════════════════════════════════════════
    // TRANSPOSE TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_transpose_reverses_edges() {
        let graph = DirectedGraph::from_adjacency([("a", vec![]), ("b", vec!["a"]), ("c", vec!["b"])]);
        let transposed = graph.transpose();

        assert_eq!(ids(transposed.neighbors("a")), vec!["b"]);
        assert_eq!(ids(transposed.neighbors("b")), vec!["c"]);
        assert!(transposed.neighbors("c").is_empty());
    }

    #[test]
    fn test_transpose_lists_nodes_without_incoming_edges() {
        // Only "b" is a key in the input; "a" and "c" appear as values
        let mut graph = DirectedGraph::new();
        graph.add_edge("b", "a");
        graph.add_edge("b", "c");
        let transposed = graph.transpose();

        assert_eq!(transposed.len(), 3);
        assert!(transposed.contains("b"));
        assert!(transposed.neighbors("b").is_empty());
    }

    #[test]
    fn test_transpose_twice_is_identity() {
        let graph = DirectedGraph::from_adjacency([
            ("a", vec![]),
            ("b", vec!["a"]),
            ("c", vec!["a", "b"]),
            ("d", vec![]),
        ]);
        assert_eq!(graph.transpose().transpose(), graph);
    }

    #[test]
    fn test_transpose_does_not_mutate_input() {
        let graph = DirectedGraph::from_adjacency([("a", vec![]), ("b", vec!["a"])]);
        let snapshot = graph.clone();
        let _ = graph.transpose();
        assert_eq!(graph, snapshot);
    }

    // ═══════════════════════════════════════════════════════════════
    // EDGE TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_remove_edge() {
        let mut graph = DirectedGraph::from_adjacency([("a", vec![]), ("b", vec!["a"])]);
        assert!(graph.remove_edge("b", "a"));
        assert!(!graph.remove_edge("b", "a"));
        assert!(!graph.remove_edge("ghost", "a"));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_equality_ignores_key_order() {
        let left = DirectedGraph::from_adjacency([("a", vec![]), ("b", vec!["a"])]);
        let right = DirectedGraph::from_adjacency([("b", vec!["a"]), ("a", vec![])]);
        assert_eq!(left, right);
    }

    // ═══════════════════════════════════════════════════════════════
    // SERDE TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_yaml_map_form() {
        let yaml = "a: []\nb: [a]\nc: [a, b]\n";
        let graph: DirectedGraph = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(ids(graph.nodes()), vec!["a", "b", "c"]);
        assert_eq!(serde_yaml::to_string(&graph).unwrap(), "a: []\nb:\n- a\nc:\n- a\n- b\n");
    }

    #[test]
    fn test_json_serializes_in_node_order() {
        let graph = DirectedGraph::from_adjacency([("z", vec![]), ("a", vec!["z"])]);
        let json = serde_json::to_string(&graph).unwrap();
        assert_eq!(json, r#"{"z":[],"a":["z"]}"#);
    }
}
