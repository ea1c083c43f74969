//! Connection Validator - gate for every edge the editor tries to add
//!
//! Rules, checked in order (first failure wins, fail closed):
//! 1. both endpoints present and distinct (no self-loops)
//! 2. simulate `target depends on source` on a copy of the graph
//! 3. execution-order view: no stage with more than one successor
//! 4. no cycle in the simulated dependency graph
//!
//! Never mutates the caller's graph.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cycle::find_cycle;
use super::invariant::find_branching;
use super::stage_graph::StageDependencyGraph;

/// A proposed edge from a drag-to-connect gesture.
///
/// Endpoints are optional because the gesture can end on empty canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: Option<String>,
    pub target: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
        }
    }
}

/// Why a connection was refused. Not an error: the editor simply does
/// not draw the edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionRejection {
    #[error("connection is missing its source or target")]
    MissingEndpoint,

    #[error("stage '{stage_id}' cannot depend on itself")]
    SelfLoop { stage_id: String },

    #[error("branched pipelines are not supported: '{stage_id}' would feed into [{}]", .successors.join(", "))]
    BranchedPipeline {
        stage_id: String,
        successors: Vec<String>,
    },

    #[error("connection would create a cycle: {}", .cycle.join(" → "))]
    Cycle { cycle: Vec<String> },
}

/// Check a proposed connection and explain the first rule it breaks.
pub fn check_connection(
    connection: &Connection,
    graph: &StageDependencyGraph,
) -> Result<(), ConnectionRejection> {
    let (source, target) = match (connection.source.as_deref(), connection.target.as_deref()) {
        (Some(source), Some(target)) => (source, target),
        _ => return Err(ConnectionRejection::MissingEndpoint),
    };
    if source == target {
        return Err(ConnectionRejection::SelfLoop {
            stage_id: source.to_string(),
        });
    }

    let mut simulated = graph.clone();
    simulated.add_dependency(target, source);

    let execution_order = simulated.execution_order_graph();
    if let Some((stage_id, successors)) = find_branching(&execution_order) {
        return Err(ConnectionRejection::BranchedPipeline {
            stage_id: stage_id.to_string(),
            successors: successors.into_iter().map(str::to_string).collect(),
        });
    }

    if let Some(cycle) = find_cycle(&simulated.as_graph().edges()) {
        return Err(ConnectionRejection::Cycle {
            cycle: cycle.iter().map(|id| id.to_string()).collect(),
        });
    }

    Ok(())
}

/// Decide whether adding `connection` keeps the pipeline a valid
/// restricted DAG.
pub fn is_valid_connection(connection: &Connection, graph: &StageDependencyGraph) -> bool {
    match check_connection(connection, graph) {
        Ok(()) => true,
        Err(reason) => {
            tracing::debug!(
                source = ?connection.source,
                target = ?connection.target,
                reason = %reason,
                "connection rejected"
            );
            false
        }
    }
}
