//! Stagegraph - stage dependency graph model for grading pipelines
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       Stage, StageKind, PipelineSnapshot (YAML view)   │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  dag/       Graph model, connection validator, auto-layout   │
//! │  editor     PipelineEditor (stages + graph in lock-step)     │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  config     Layout settings (TOML + env overrides)           │
//! │  error      Error types with fix suggestions                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | Stage types and session snapshots |
//! | [`dag`] | DirectedGraph, StageDependencyGraph, `is_valid_connection`, `layout_pipeline` |
//! | [`editor`] | Validator-gated editing operations |
//! | [`config`] | `~/.config/stagegraph/config.toml` |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - YAML → Rust types
// ═══════════════════════════════════════════════════════════════
pub mod ast;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Graph model and editing
// ═══════════════════════════════════════════════════════════════
pub mod dag;
pub mod editor;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - Config, errors
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// Re-export commonly used types
pub use ast::{PipelineSnapshot, Stage, StageKind};
pub use config::StageGraphConfig;
pub use dag::{
    is_valid_connection, layout_pipeline, Connection, DirectedGraph, EdgeId, LayoutConfig,
    PipelineLayout, Position, StageDependencyGraph,
};
pub use editor::PipelineEditor;
pub use error::{FixSuggestion, Result, StageGraphError};
