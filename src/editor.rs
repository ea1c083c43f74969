//! PipelineEditor - owner of the pipeline editing session
//!
//! Keeps the stage map and the dependency graph in lock-step: every
//! stage is a graph node, deleting a stage deletes its edges, and new
//! edges only go in through the Connection Validator.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ast::{validate_stage_id, PipelineSnapshot, Stage, StageEntry};
use crate::dag::{
    check_connection, Connection, EdgeId, LayoutConfig, PipelineLayout, StageDependencyGraph,
};
use crate::error::{Result, StageGraphError};

/// Editing session state
#[derive(Debug, Clone, Default)]
pub struct PipelineEditor {
    stages: FxHashMap<Arc<str>, Stage>,
    graph: StageDependencyGraph,
}

impl PipelineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a stage onto the canvas. Returns its ID.
    pub fn add_stage(&mut self, stage: Stage) -> Result<Arc<str>> {
        validate_stage_id(&stage.id)?;
        if self.stages.contains_key(stage.id.as_str()) {
            return Err(StageGraphError::DuplicateStage { id: stage.id });
        }

        let id = self.graph.add_stage(&stage.id);
        tracing::debug!(stage_id = %id, kind = %stage.kind, "stage added");
        self.stages.insert(Arc::clone(&id), stage);
        Ok(id)
    }

    /// Try to connect two stages. Returns whether the edge was added.
    pub fn connect(&mut self, connection: &Connection) -> bool {
        for endpoint in [&connection.source, &connection.target].into_iter().flatten() {
            if !self.stages.contains_key(endpoint.as_str()) {
                tracing::warn!(stage_id = %endpoint, "connection references unknown stage");
                return false;
            }
        }

        match check_connection(connection, &self.graph) {
            Ok(()) => {
                // check_connection guarantees both endpoints are present
                if let (Some(source), Some(target)) = (&connection.source, &connection.target) {
                    self.graph.add_dependency(target, source);
                    tracing::debug!(source = %source, target = %target, "stages connected");
                    return true;
                }
                false
            }
            Err(reason) => {
                tracing::debug!(reason = %reason, "connection rejected");
                false
            }
        }
    }

    /// Remove an edge. Returns whether it existed.
    pub fn disconnect(&mut self, edge: &EdgeId) -> bool {
        self.graph.remove_edge(edge)
    }

    /// Delete a stage and every edge touching it.
    pub fn delete_stage(&mut self, stage_id: &str) -> Option<Stage> {
        self.graph.delete_stage(stage_id);
        let removed = self.stages.remove(stage_id);
        if removed.is_some() {
            tracing::debug!(stage_id = %stage_id, "stage deleted");
        }
        removed
    }

    /// Copy a stage (kind, label and config) under a fresh ID, without edges.
    pub fn duplicate_stage(&mut self, stage_id: &str) -> Option<Arc<str>> {
        let Some(original) = self.stages.get(stage_id) else {
            tracing::warn!(stage_id = %stage_id, "duplicate requested for unknown stage");
            return None;
        };

        let copy = Stage::new(original.kind)
            .with_label(format!("{} (copy)", original.display_name()))
            .with_config(original.config.clone());

        // Fresh UUIDs cannot collide or fail ID validation
        self.add_stage(copy).ok()
    }

    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.get(stage_id)
    }

    /// Stages in canvas (insertion) order
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.graph
            .stage_ids()
            .iter()
            .filter_map(|id| self.stages.get(id))
    }

    pub fn graph(&self) -> &StageDependencyGraph {
        &self.graph
    }

    /// Swap in a graph validated elsewhere (snapshot loading).
    pub(crate) fn replace_graph(&mut self, graph: StageDependencyGraph) {
        self.graph = graph;
    }

    /// "Format nicely": compute fresh positions for every stage
    pub fn format_layout(&self, config: &LayoutConfig) -> PipelineLayout {
        PipelineLayout::compute(&self.graph, config)
    }

    /// Stages in execution order
    pub fn execution_order(&self) -> Result<Vec<&Stage>> {
        let order = self.graph.execution_order()?;
        Ok(order.iter().filter_map(|id| self.stages.get(id)).collect())
    }

    pub fn to_snapshot(&self) -> PipelineSnapshot {
        let stages = self
            .stages()
            .map(|stage| StageEntry {
                id: stage.id.clone(),
                kind: stage.kind,
                label: stage.label.clone(),
                config: stage.config.clone(),
                depends_on: self
                    .graph
                    .dependencies(&stage.id)
                    .iter()
                    .map(|d| d.to_string())
                    .collect(),
            })
            .collect();

        PipelineSnapshot { name: None, stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
