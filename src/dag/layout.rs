//! Auto-Layout Engine
//!
//! Hierarchical layout for the pipeline canvas ("format nicely").
//! Ranks run left to right, parallel stages of one rank stack top to bottom.
//!
//! Algorithm steps:
//! 1. Kahn traversal of the execution-order graph assigns each stage a
//!    rank = longest path from a stage without dependencies
//! 2. Order stages within each rank (barycenter passes)
//! 3. Compute x/y coordinates from the spacing config
//!
//! Stages never released by the traversal (only possible with cyclic
//! input) go to a fallback row below every rank.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::graph::DirectedGraph;
use super::stage_graph::StageDependencyGraph;

/// Canvas coordinates of a stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Where a stage landed in the layout
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodePlacement {
    /// Rank (column), `None` for stages in the fallback row
    pub rank: Option<usize>,
    /// Index within the rank (or within the fallback row)
    pub row: usize,
    pub position: Position,
}

/// Layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal distance between ranks
    pub rank_spacing: f64,
    /// Vertical distance between stages of one rank
    pub row_spacing: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_spacing: 250.0,
            row_spacing: 120.0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

/// Computed pipeline layout
#[derive(Debug, Clone, Default)]
pub struct PipelineLayout {
    /// Stage IDs in graph order (drives iteration and serialization)
    order: Vec<Arc<str>>,
    placements: FxHashMap<Arc<str>, NodePlacement>,
    /// Stages organized by rank
    ranks: Vec<Vec<Arc<str>>>,
    /// Stages placed in the fallback row
    unplaced: Vec<Arc<str>>,
}

/// Lay out a pipeline with the default spacing.
pub fn layout_pipeline(graph: &StageDependencyGraph) -> PipelineLayout {
    PipelineLayout::compute(graph, &LayoutConfig::default())
}

impl PipelineLayout {
    /// Compute layout for a dependency graph
    pub fn compute(graph: &StageDependencyGraph, config: &LayoutConfig) -> Self {
        if graph.is_empty() {
            return Self::default();
        }

        let execution_order = graph.execution_order_graph();

        // Step 1: Assign ranks via topological traversal
        let (rank_assignments, unplaced) = Self::assign_ranks(graph, &execution_order);

        // Step 2: Order stages within each rank
        let ranks = Self::order_within_ranks(graph, &execution_order, &rank_assignments);

        // Step 3: Compute positions
        let placements = Self::compute_placements(&ranks, &unplaced, config);

        tracing::debug!(
            stages = graph.len(),
            ranks = ranks.len(),
            unplaced = unplaced.len(),
            "pipeline layout computed"
        );

        Self {
            order: graph.stage_ids().to_vec(),
            placements,
            ranks,
            unplaced,
        }
    }

    /// Placement of a stage by ID
    pub fn get(&self, id: &str) -> Option<&NodePlacement> {
        self.placements.get(id)
    }

    /// Position of a stage by ID
    pub fn position(&self, id: &str) -> Option<Position> {
        self.placements.get(id).map(|p| p.position)
    }

    pub fn rank_count(&self) -> usize {
        self.ranks.len()
    }

    /// Iterate over ranks (each rank is a list of stage IDs, top to bottom)
    pub fn ranks(&self) -> impl Iterator<Item = &[Arc<str>]> {
        self.ranks.iter().map(Vec::as_slice)
    }

    /// Stages that could not be ranked
    pub fn unplaced(&self) -> &[Arc<str>] {
        &self.unplaced
    }

    /// All positions in graph order
    pub fn positions(&self) -> impl Iterator<Item = (&str, Position)> + '_ {
        self.order.iter().filter_map(|id| {
            self.placements
                .get(id)
                .map(|placement| (id.as_ref(), placement.position))
        })
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Assign ranks with Kahn's algorithm over the execution-order graph.
    ///
    /// Each stage gets rank = max(dependency ranks) + 1; stages without
    /// dependencies get rank 0. Returns the ranks of released stages and
    /// the stages never released, both in graph order.
    fn assign_ranks(
        graph: &StageDependencyGraph,
        execution_order: &DirectedGraph,
    ) -> (FxHashMap<Arc<str>, usize>, Vec<Arc<str>>) {
        let mut in_degree: FxHashMap<&str, usize> = graph
            .stage_ids()
            .iter()
            .map(|id| (id.as_ref(), graph.dependencies(id).len()))
            .collect();
        let mut candidate: FxHashMap<&str, usize> = FxHashMap::default();
        let mut ranks: FxHashMap<Arc<str>, usize> = FxHashMap::default();

        let mut queue: VecDeque<Arc<str>> = graph
            .stage_ids()
            .iter()
            .filter(|id| graph.dependencies(id).is_empty())
            .cloned()
            .collect();

        while let Some(current) = queue.pop_front() {
            let current_rank = candidate.get(current.as_ref()).copied().unwrap_or(0);

            for succ in execution_order.neighbors(&current) {
                let succ_rank = candidate.entry(succ.as_ref()).or_insert(0);
                *succ_rank = (*succ_rank).max(current_rank + 1);

                if let Some(deg) = in_degree.get_mut(succ.as_ref()) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        queue.push_back(Arc::clone(succ));
                    }
                }
            }

            ranks.insert(current, current_rank);
        }

        let unplaced: Vec<Arc<str>> = graph
            .stage_ids()
            .iter()
            .filter(|id| !ranks.contains_key(id.as_ref()))
            .cloned()
            .collect();

        (ranks, unplaced)
    }

    /// Order stages within each rank using the barycenter method
    ///
    /// Each stage is placed near the average row of its neighbors in the
    /// adjacent rank, which keeps fan-ins next to the stage they merge into.
    fn order_within_ranks(
        graph: &StageDependencyGraph,
        execution_order: &DirectedGraph,
        rank_assignments: &FxHashMap<Arc<str>, usize>,
    ) -> Vec<Vec<Arc<str>>> {
        if rank_assignments.is_empty() {
            return Vec::new();
        }

        let max_rank = rank_assignments.values().copied().max().unwrap_or(0);
        let mut ranks: Vec<Vec<Arc<str>>> = vec![Vec::new(); max_rank + 1];

        // Initial order: graph order
        for id in graph.stage_ids() {
            if let Some(&rank) = rank_assignments.get(id) {
                ranks[rank].push(Arc::clone(id));
            }
        }

        const MAX_ITERATIONS: usize = 4;

        for _ in 0..MAX_ITERATIONS {
            // Forward pass: order by dependency rows
            for rank_idx in 1..ranks.len() {
                Self::order_rank_by_barycenter(&mut ranks, rank_idx, graph.as_graph(), true);
            }

            // Backward pass: order by successor rows
            for rank_idx in (0..ranks.len().saturating_sub(1)).rev() {
                Self::order_rank_by_barycenter(&mut ranks, rank_idx, execution_order, false);
            }
        }

        ranks
    }

    /// Order a single rank by the average row of its neighbors in the
    /// previous (`use_prev_rank`) or next rank. Stable for ties.
    fn order_rank_by_barycenter(
        ranks: &mut [Vec<Arc<str>>],
        rank_idx: usize,
        neighbors: &DirectedGraph,
        use_prev_rank: bool,
    ) {
        let adjacent_idx = if use_prev_rank {
            rank_idx.saturating_sub(1)
        } else {
            rank_idx.saturating_add(1)
        };

        if adjacent_idx >= ranks.len() || adjacent_idx == rank_idx {
            return;
        }

        let adjacent_rows: FxHashMap<&str, usize> = ranks[adjacent_idx]
            .iter()
            .enumerate()
            .map(|(row, id)| (id.as_ref(), row))
            .collect();

        let mut barycenters: Vec<(Arc<str>, f64)> = ranks[rank_idx]
            .iter()
            .map(|id| {
                let rows: Vec<usize> = neighbors
                    .neighbors(id)
                    .iter()
                    .filter_map(|n| adjacent_rows.get(n.as_ref()).copied())
                    .collect();

                let barycenter = if rows.is_empty() {
                    // No neighbors in the adjacent rank - sort last
                    f64::MAX
                } else {
                    let sum: usize = rows.iter().sum();
                    (sum as f64) / (rows.len() as f64)
                };

                (Arc::clone(id), barycenter)
            })
            .collect();

        barycenters.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        ranks[rank_idx] = barycenters.into_iter().map(|(id, _)| id).collect();
    }

    /// Compute x/y for ranked stages, then the fallback row
    fn compute_placements(
        ranks: &[Vec<Arc<str>>],
        unplaced: &[Arc<str>],
        config: &LayoutConfig,
    ) -> FxHashMap<Arc<str>, NodePlacement> {
        let mut placements: FxHashMap<Arc<str>, NodePlacement> = FxHashMap::default();

        for (rank_idx, rank) in ranks.iter().enumerate() {
            let x = config.origin_x + rank_idx as f64 * config.rank_spacing;
            for (row, id) in rank.iter().enumerate() {
                placements.insert(
                    Arc::clone(id),
                    NodePlacement {
                        rank: Some(rank_idx),
                        row,
                        position: Position {
                            x,
                            y: config.origin_y + row as f64 * config.row_spacing,
                        },
                    },
                );
            }
        }

        let tallest = ranks.iter().map(Vec::len).max().unwrap_or(0);
        let fallback_y = config.origin_y + tallest as f64 * config.row_spacing;
        for (row, id) in unplaced.iter().enumerate() {
            placements.insert(
                Arc::clone(id),
                NodePlacement {
                    rank: None,
                    row,
                    position: Position {
                        x: config.origin_x + row as f64 * config.rank_spacing,
                        y: fallback_y,
                    },
                },
            );
        }

        placements
    }
}

impl Serialize for PipelineLayout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.placements.len()))?;
        for (id, position) in self.positions() {
            map.serialize_entry(id, &position)?;
        }
        map.end()
    }
}

/// Stage IDs that share a coordinate with another stage
pub fn overlapping_stages(layout: &PipelineLayout) -> Vec<&str> {
    let mut seen: FxHashSet<(u64, u64)> = FxHashSet::default();
    layout
        .positions()
        .filter(|(_, p)| !seen.insert((p.x.to_bits(), p.y.to_bits())))
        .map(|(id, _)| id)
        .collect()
}
