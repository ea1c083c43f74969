// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Stagegraph Error Types with Error Codes
//!
//! Error code ranges:
//! - SG-000-009: Snapshot/input errors
//! - SG-010-019: Stage errors
//! - SG-020-029: Graph errors
//! - SG-030-039: Configuration errors
//!
//! Rejected connections are not errors: see [`crate::dag::ConnectionRejection`].

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StageGraphError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
pub enum StageGraphError {
    // ═══════════════════════════════════════════
    // SNAPSHOT ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[SG-001] Failed to parse pipeline snapshot: {details}")]
    #[diagnostic(
        code(stagegraph::parse_error),
        help("Check YAML syntax: indentation and quoting")
    )]
    ParseError { details: String },

    #[error("[SG-002] Snapshot file not found: {path}")]
    #[diagnostic(code(stagegraph::snapshot_not_found))]
    SnapshotNotFound { path: String },

    #[error("[SG-003] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[SG-004] Failed to serialize output: {details}")]
    SerializeError { details: String },

    // ═══════════════════════════════════════════
    // STAGE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[SG-010] Invalid stage ID '{id}': {reason}")]
    #[diagnostic(code(stagegraph::invalid_stage_id))]
    InvalidStageId { id: String, reason: String },

    #[error("[SG-011] Duplicate stage ID '{id}'")]
    DuplicateStage { id: String },

    #[error("[SG-012] Stage '{id}' not found")]
    UnknownStage { id: String },

    // ═══════════════════════════════════════════
    // GRAPH ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[SG-020] Cycle detected in pipeline: {cycle}")]
    #[diagnostic(code(stagegraph::cycle_detected))]
    CycleDetected { cycle: String },

    #[error("[SG-021] Missing dependency: stage '{stage_id}' depends on unknown '{dep_id}'")]
    MissingDependency { stage_id: String, dep_id: String },

    #[error("[SG-022] Branched pipeline: stage '{stage_id}' feeds into {successors}")]
    #[diagnostic(code(stagegraph::branched_pipeline))]
    BranchedPipeline {
        stage_id: String,
        successors: String,
    },

    #[error("[SG-023] Invalid edge ID '{raw}' (expected 'source->target')")]
    InvalidEdgeId { raw: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[SG-030] Configuration error: {reason}")]
    #[diagnostic(code(stagegraph::config_error))]
    ConfigError { reason: String },
}

impl From<serde_yaml::Error> for StageGraphError {
    fn from(err: serde_yaml::Error) -> Self {
        StageGraphError::ParseError {
            details: err.to_string(),
        }
    }
}

impl FixSuggestion for StageGraphError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            StageGraphError::ParseError { .. } => {
                Some("Check YAML syntax: indentation and quoting")
            }
            StageGraphError::SnapshotNotFound { .. } => Some("Check the file path exists"),
            StageGraphError::Io(_) => Some("Check file path and permissions"),
            StageGraphError::SerializeError { .. } => None,
            StageGraphError::InvalidStageId { .. } => {
                Some("Use IDs without whitespace or '->', e.g. 'compile-1'")
            }
            StageGraphError::DuplicateStage { .. } => Some("Give every stage a unique id"),
            StageGraphError::UnknownStage { .. } => {
                Some("Verify the stage id exists in the pipeline")
            }
            StageGraphError::CycleDetected { .. } => {
                Some("Remove one of the dependencies forming the cycle")
            }
            StageGraphError::MissingDependency { .. } => {
                Some("Add the missing stage or remove it from dependsOn")
            }
            StageGraphError::BranchedPipeline { .. } => Some(
                "A stage may feed into only one next stage; merge the branches into a single chain",
            ),
            StageGraphError::InvalidEdgeId { .. } => Some("Use the form 'source->target'"),
            StageGraphError::ConfigError { .. } => {
                Some("Check ~/.config/stagegraph/config.toml syntax")
            }
        }
    }
}
