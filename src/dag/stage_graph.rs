//! StageDependencyGraph - "stage X depends on stages Y"
//!
//! Canonical direction: a connection `source -> target` drawn in the
//! editor is an execution edge, stored as `target depends on source`.
//! The execution-order graph is the transpose and is always derived,
//! never stored.
//!
//! Mutations here perform no validation. Adding structure must be gated
//! by [`super::is_valid_connection`]; removing structure can never break
//! the single-successor or acyclicity invariants.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::StageGraphError;

use super::cycle::detect_cycles;
use super::graph::DirectedGraph;

/// Separator used in the textual edge ID form `source->target`
pub const EDGE_SEPARATOR: &str = "->";

/// Identity of a single edge, derived from its (source, target) pair.
///
/// `source` runs before `target`, i.e. `target` depends on `source`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeId {
    pub source: Arc<str>,
    pub target: Arc<str>,
}

impl EdgeId {
    pub fn new(source: impl Into<Arc<str>>, target: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.source, EDGE_SEPARATOR, self.target)
    }
}

impl FromStr for EdgeId {
    type Err = StageGraphError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.split_once(EDGE_SEPARATOR) {
            Some((source, target))
                if !source.is_empty()
                    && !target.is_empty()
                    && !target.contains(EDGE_SEPARATOR) =>
            {
                Ok(Self::new(source, target))
            }
            _ => Err(StageGraphError::InvalidEdgeId {
                raw: raw.to_string(),
            }),
        }
    }
}

/// Dependency graph of pipeline stages: stage -> ordered predecessors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageDependencyGraph {
    graph: DirectedGraph,
}

impl StageDependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(stage, depends_on)` entries.
    pub fn from_dependencies<I, K, V, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            graph: DirectedGraph::from_adjacency(entries),
        }
    }

    /// Register a stage with no dependencies. Idempotent.
    pub fn add_stage(&mut self, stage_id: &str) -> Arc<str> {
        self.graph.add_node(stage_id)
    }

    /// Record that `dependent` depends on `depends_on`.
    ///
    /// No validation: callers check the connection first.
    pub fn add_dependency(&mut self, dependent: &str, depends_on: &str) {
        self.graph.add_edge(dependent, depends_on);
    }

    /// Remove the edge addressed by `edge`. Returns whether it existed.
    pub fn remove_edge(&mut self, edge: &EdgeId) -> bool {
        let removed = self.graph.remove_edge(&edge.target, &edge.source);
        if !removed {
            tracing::debug!(edge = %edge, "edge not present, nothing removed");
        }
        removed
    }

    /// Delete a stage and every dependency referencing it.
    pub fn delete_stage(&mut self, stage_id: &str) {
        self.graph = self.graph.delete_node(stage_id);
    }

    /// Stages `stage_id` depends on, in insertion order
    #[inline]
    pub fn dependencies(&self, stage_id: &str) -> &[Arc<str>] {
        self.graph.neighbors(stage_id)
    }

    #[inline]
    pub fn contains(&self, stage_id: &str) -> bool {
        self.graph.contains(stage_id)
    }

    /// All stage IDs in insertion order
    pub fn stage_ids(&self) -> &[Arc<str>] {
        self.graph.nodes()
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Every edge in editor form (source runs before target)
    pub fn edges(&self) -> Vec<EdgeId> {
        self.graph
            .edges()
            .into_iter()
            .map(|(dependent, depends_on)| EdgeId {
                source: depends_on,
                target: dependent,
            })
            .collect()
    }

    /// Underlying dependency-direction graph
    pub fn as_graph(&self) -> &DirectedGraph {
        &self.graph
    }

    /// Derived execution-order view: stage -> stages that run after it
    pub fn execution_order_graph(&self) -> DirectedGraph {
        self.graph.transpose()
    }

    /// Stages in a valid execution order (Kahn's algorithm).
    ///
    /// Ties are broken by insertion order so the result is stable.
    pub fn execution_order(&self) -> Result<Vec<Arc<str>>, StageGraphError> {
        let successors = self.execution_order_graph();
        let mut in_degree: FxHashMap<&str, usize> = self
            .stage_ids()
            .iter()
            .map(|id| (id.as_ref(), self.dependencies(id).len()))
            .collect();

        let mut queue: VecDeque<Arc<str>> = self
            .stage_ids()
            .iter()
            .filter(|id| in_degree.get(id.as_ref()) == Some(&0))
            .cloned()
            .collect();
        let mut order: Vec<Arc<str>> = Vec::with_capacity(self.len());

        while let Some(current) = queue.pop_front() {
            for succ in successors.neighbors(&current) {
                if let Some(deg) = in_degree.get_mut(succ.as_ref()) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        queue.push_back(Arc::clone(succ));
                    }
                }
            }
            order.push(current);
        }

        if order.len() != self.len() {
            // Leftover stages sit on (or behind) a cycle
            detect_cycles(&self.graph)?;
            let placed: Vec<&str> = order.iter().map(AsRef::as_ref).collect();
            let leftover: Vec<&str> = self
                .stage_ids()
                .iter()
                .map(AsRef::as_ref)
                .filter(|id| !placed.contains(id))
                .collect();
            return Err(StageGraphError::CycleDetected {
                cycle: leftover.join(" → "),
            });
        }

        Ok(order)
    }
}

impl From<DirectedGraph> for StageDependencyGraph {
    fn from(graph: DirectedGraph) -> Self {
        Self { graph }
    }
}
