//! Restricted-DAG invariant: single successor per stage
//!
//! Stated on the execution-order graph: a stage may feed into at most one
//! next stage (no fan-out), while several stages may feed into the same
//! next stage (fan-in is fine). Cycle detection lives in `cycle`.

use crate::error::StageGraphError;

use super::graph::DirectedGraph;

/// Find the first node (in node order) with more than one successor.
pub fn find_branching(execution_order: &DirectedGraph) -> Option<(&str, Vec<&str>)> {
    execution_order
        .nodes()
        .iter()
        .find(|node| execution_order.out_degree(node) > 1)
        .map(|node| {
            let successors = execution_order
                .neighbors(node)
                .iter()
                .map(AsRef::as_ref)
                .collect();
            (node.as_ref(), successors)
        })
}

/// Check that no node of the execution-order graph has more than one successor.
pub fn check_single_successor(execution_order: &DirectedGraph) -> Result<(), StageGraphError> {
    match find_branching(execution_order) {
        None => Ok(()),
        Some((stage_id, successors)) => Err(StageGraphError::BranchedPipeline {
            stage_id: stage_id.to_string(),
            successors: format!("[{}]", successors.join(", ")),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_passes() {
        // a → b → c
        let exec = DirectedGraph::from_adjacency([("a", vec!["b"]), ("b", vec!["c"]), ("c", vec![])]);
        assert!(check_single_successor(&exec).is_ok());
    }

    #[test]
    fn test_fan_in_passes() {
        // a → c, b → c
        let exec = DirectedGraph::from_adjacency([("a", vec!["c"]), ("b", vec!["c"]), ("c", vec![])]);
        assert!(check_single_successor(&exec).is_ok());
    }

    #[test]
    fn test_fan_out_fails() {
        // a → {b, c}
        let exec = DirectedGraph::from_adjacency([("a", vec!["b", "c"]), ("b", vec![]), ("c", vec![])]);

        let (stage, successors) = find_branching(&exec).unwrap();
        assert_eq!(stage, "a");
        assert_eq!(successors, vec!["b", "c"]);

        let err = check_single_successor(&exec).unwrap_err();
        assert!(err.to_string().contains("SG-022"));
        assert!(err.to_string().contains("[b, c]"));
    }

    #[test]
    fn test_parallel_edge_counts_as_branching() {
        let mut exec = DirectedGraph::new();
        exec.add_edge("a", "b");
        exec.add_edge("a", "b");
        assert!(check_single_successor(&exec).is_err());
    }

    #[test]
    fn test_cycle_is_not_this_checks_concern() {
        // a → b → a: each node has one successor
        let exec = DirectedGraph::from_adjacency([("a", vec!["b"]), ("b", vec!["a"])]);
        assert!(check_single_successor(&exec).is_ok());
    }

    #[test]
    fn test_empty_graph_passes() {
        assert!(check_single_successor(&DirectedGraph::new()).is_ok());
    }
}
