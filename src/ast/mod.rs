//! AST Module - stage and snapshot types
//!
//! - `stage`: Stage, StageKind, stage ID rules
//! - `snapshot`: PipelineSnapshot, StageEntry (YAML session view)
//!
//! These types carry what the graph model treats as opaque: stage kinds,
//! labels and type-specific configs.

mod snapshot;
mod stage;

// Re-export all public types
pub use snapshot::{PipelineSnapshot, StageEntry};
pub use stage::{validate_stage_id, Stage, StageKind};
