//! DAG Module - stage dependency graph model
//!
//! Contains the graph representation, its invariants and algorithms:
//! - `graph`: DirectedGraph adjacency list (delete_node, transpose)
//! - `stage_graph`: StageDependencyGraph ("X depends on Y"), EdgeId
//! - `invariant`: single-successor rule on the execution-order view
//! - `cycle`: DFS three-color cycle detection over an edge list
//! - `connect`: Connection Validator gating every new edge
//! - `layout`: rank/row auto-layout for the editor canvas
//! - `validate`: whole-graph validation for loaded snapshots

mod connect;
mod cycle;
mod graph;
mod invariant;
mod layout;
mod stage_graph;
mod validate;

// Re-export public types
pub use connect::{check_connection, is_valid_connection, Connection, ConnectionRejection};
pub use cycle::{detect_cycles, find_cycle};
pub use graph::{AdjVec, DirectedGraph};
pub use invariant::{check_single_successor, find_branching};
pub use layout::{
    layout_pipeline, overlapping_stages, LayoutConfig, NodePlacement, PipelineLayout, Position,
};
pub use stage_graph::{EdgeId, StageDependencyGraph, EDGE_SEPARATOR};
pub use validate::{validate_pipeline, validate_structure};
