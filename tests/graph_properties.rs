//! Property-Based Testing for the stage graph model
//!
//! Uses proptest to check the graph laws against random inputs.
//! Coverage targets:
//! - DirectedGraph primitives (dag/graph.rs)
//! - Connection Validator (dag/connect.rs)
//! - Auto-layout (dag/layout.rs)

use proptest::prelude::*;
use stagegraph::dag::{validate_structure, DirectedGraph};
use stagegraph::{is_valid_connection, layout_pipeline, Connection, StageDependencyGraph};

fn node_name(index: usize) -> String {
    format!("n{index}")
}

prop_compose! {
    /// Random graph over n0..nK with neighbor lists in node order and
    /// no parallel edges.
    fn arb_graph()(size in 1usize..12)(
        matrix in prop::collection::vec(prop::collection::vec(any::<bool>(), size), size)
    ) -> DirectedGraph {
        DirectedGraph::from_adjacency(matrix.iter().enumerate().map(|(i, row)| {
            let neighbors: Vec<String> = row
                .iter()
                .enumerate()
                .filter(|(_, linked)| **linked)
                .map(|(j, _)| node_name(j))
                .collect();
            (node_name(i), neighbors)
        }))
    }
}

prop_compose! {
    /// Random sequence of connection attempts between `size` stages
    fn arb_attempts()(size in 2usize..10)(
        size in Just(size),
        attempts in prop::collection::vec((0..size, 0..size), 0..40)
    ) -> (usize, Vec<(usize, usize)>) {
        (size, attempts)
    }
}

// =============================================================================
// DirectedGraph primitives
// =============================================================================

proptest! {
    #[test]
    fn transpose_is_an_involution(graph in arb_graph()) {
        prop_assert_eq!(graph.transpose().transpose(), graph);
    }

    #[test]
    fn transpose_preserves_edge_count(graph in arb_graph()) {
        let transposed = graph.transpose();
        prop_assert_eq!(transposed.edge_count(), graph.edge_count());
        prop_assert_eq!(transposed.len(), graph.len());
    }

    #[test]
    fn delete_node_purges_every_reference(graph in arb_graph(), pick in any::<prop::sample::Index>()) {
        let victim = pick.get(graph.nodes()).to_string();
        let result = graph.delete_node(&victim);

        prop_assert!(!result.contains(&victim));
        prop_assert_eq!(result.len(), graph.len() - 1);
        for node in result.nodes() {
            prop_assert!(result.neighbors(node).iter().all(|n| n.as_ref() != victim));
        }
    }

    #[test]
    fn delete_node_leaves_input_untouched(graph in arb_graph(), pick in any::<prop::sample::Index>()) {
        let before = graph.clone();
        let victim = pick.get(graph.nodes()).to_string();
        let _ = graph.delete_node(&victim);
        prop_assert_eq!(graph, before);
    }

    #[test]
    fn delete_absent_node_is_identity(graph in arb_graph()) {
        prop_assert_eq!(graph.delete_node("absent"), graph);
    }
}

// =============================================================================
// Connection Validator
// =============================================================================

proptest! {
    #[test]
    fn self_loops_always_rejected(graph in arb_graph(), pick in any::<prop::sample::Index>()) {
        let stage = pick.get(graph.nodes()).to_string();
        let graph = StageDependencyGraph::from(graph);
        prop_assert!(!is_valid_connection(&Connection::new(stage.as_str(), stage.as_str()), &graph));
    }

    /// Applying only accepted connections keeps the pipeline a restricted DAG
    #[test]
    fn accepted_connections_keep_pipeline_valid((size, attempts) in arb_attempts()) {
        let mut graph = StageDependencyGraph::new();
        for i in 0..size {
            graph.add_stage(&node_name(i));
        }

        for (source, target) in attempts {
            let connection = Connection::new(node_name(source), node_name(target));
            let before = graph.clone();
            let accepted = is_valid_connection(&connection, &graph);
            prop_assert_eq!(&graph, &before);

            if accepted {
                graph.add_dependency(&node_name(target), &node_name(source));
                prop_assert!(validate_structure(&graph).is_ok());
            }
        }
    }

    /// In a valid pipeline every dependency sits in an earlier layout rank
    #[test]
    fn layout_respects_dependencies((size, attempts) in arb_attempts()) {
        let mut graph = StageDependencyGraph::new();
        for i in 0..size {
            graph.add_stage(&node_name(i));
        }
        for (source, target) in attempts {
            if is_valid_connection(&Connection::new(node_name(source), node_name(target)), &graph) {
                graph.add_dependency(&node_name(target), &node_name(source));
            }
        }

        let layout = layout_pipeline(&graph);
        prop_assert_eq!(layout.len(), size);
        prop_assert!(layout.unplaced().is_empty());
        for edge in graph.edges() {
            let source = layout.position(&edge.source).unwrap();
            let target = layout.position(&edge.target).unwrap();
            prop_assert!(source.x < target.x);
        }
    }
}
