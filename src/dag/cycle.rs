//! Cycle detection over an explicit edge list
//!
//! Standard three-color DFS:
//! - White: unvisited
//! - Gray: currently in DFS stack (visiting)
//! - Black: fully processed (all descendants visited)
//!
//! A cycle is detected when we encounter a Gray node while traversing.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::StageGraphError;

use super::graph::DirectedGraph;

/// Find a cycle in the directed edge list, returning its path
/// (first node repeated at the end), or `None` when acyclic.
pub fn find_cycle(edges: &[(Arc<str>, Arc<str>)]) -> Option<Vec<Arc<str>>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    // Rebuild adjacency from the edge list, keeping first-seen node order
    let mut order: Vec<Arc<str>> = Vec::new();
    let mut adjacency: FxHashMap<Arc<str>, Vec<Arc<str>>> = FxHashMap::default();
    for (from, to) in edges {
        for node in [from, to] {
            if !adjacency.contains_key(node) {
                adjacency.insert(Arc::clone(node), Vec::new());
                order.push(Arc::clone(node));
            }
        }
        adjacency
            .entry(Arc::clone(from))
            .or_default()
            .push(Arc::clone(to));
    }

    let mut colors: FxHashMap<Arc<str>, Color> = order
        .iter()
        .map(|id| (Arc::clone(id), Color::White))
        .collect();
    let mut stack: Vec<Arc<str>> = Vec::new();

    fn dfs(
        node: Arc<str>,
        adjacency: &FxHashMap<Arc<str>, Vec<Arc<str>>>,
        colors: &mut FxHashMap<Arc<str>, Color>,
        stack: &mut Vec<Arc<str>>,
    ) -> Option<Vec<Arc<str>>> {
        colors.insert(Arc::clone(&node), Color::Gray);
        stack.push(Arc::clone(&node));

        if let Some(neighbors) = adjacency.get(&node) {
            for neighbor in neighbors {
                match colors.get(neighbor) {
                    Some(Color::Gray) => {
                        // Gray means the neighbor is on the current DFS path
                        let cycle_start = stack
                            .iter()
                            .position(|x| x == neighbor)
                            .unwrap_or(0);
                        let mut cycle = stack[cycle_start..].to_vec();
                        cycle.push(Arc::clone(neighbor));
                        return Some(cycle);
                    }
                    Some(Color::White) | None => {
                        if let Some(cycle) = dfs(Arc::clone(neighbor), adjacency, colors, stack) {
                            return Some(cycle);
                        }
                    }
                    Some(Color::Black) => {}
                }
            }
        }

        stack.pop();
        colors.insert(node, Color::Black);
        None
    }

    for node in &order {
        if colors.get(node) == Some(&Color::White) {
            if let Some(cycle) = dfs(Arc::clone(node), &adjacency, &mut colors, &mut stack) {
                return Some(cycle);
            }
        }
    }

    None
}

/// Detect cycles in a graph.
///
/// Returns `Err(StageGraphError::CycleDetected)` with the cycle path if found.
pub fn detect_cycles(graph: &DirectedGraph) -> Result<(), StageGraphError> {
    match find_cycle(&graph.edges()) {
        None => Ok(()),
        Some(cycle) => {
            let path: Vec<&str> = cycle.iter().map(AsRef::as_ref).collect();
            Err(StageGraphError::CycleDetected {
                cycle: path.join(" → "),
            })
        }
    }
}
