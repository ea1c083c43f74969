//! Pipeline Validation - whole-graph checks for loaded snapshots
//!
//! Validates:
//! - every dependency references a known stage
//! - execution order has no branching (single successor per stage)
//! - the dependency graph is acyclic
//!
//! Editing never needs this: connections are gated one at a time by
//! `is_valid_connection`. It exists for graphs that arrive whole.

use rustc_hash::FxHashSet;

use crate::error::StageGraphError;

use super::cycle::detect_cycles;
use super::invariant::check_single_successor;
use super::stage_graph::StageDependencyGraph;

/// Check the restricted-DAG shape only (branching, then cycles).
pub fn validate_structure(graph: &StageDependencyGraph) -> Result<(), StageGraphError> {
    check_single_successor(&graph.execution_order_graph())?;
    detect_cycles(graph.as_graph())
}

/// Validate a pipeline graph against the set of known stage IDs.
pub fn validate_pipeline(
    graph: &StageDependencyGraph,
    known_stages: &FxHashSet<&str>,
) -> Result<(), StageGraphError> {
    for stage_id in graph.stage_ids() {
        for dep in graph.dependencies(stage_id) {
            if !known_stages.contains(dep.as_ref()) {
                return Err(StageGraphError::MissingDependency {
                    stage_id: stage_id.to_string(),
                    dep_id: dep.to_string(),
                });
            }
        }
        if !known_stages.contains(stage_id.as_ref()) {
            return Err(StageGraphError::UnknownStage {
                id: stage_id.to_string(),
            });
        }
    }

    validate_structure(graph)
}
