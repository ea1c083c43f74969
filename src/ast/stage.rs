//! Stage Types - pipeline nodes
//!
//! - `StageKind`: the fixed set of grading stage types
//! - `Stage`: one node on the pipeline canvas
//! - `validate_stage_id`: ID rules for stages arriving from snapshots

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StageGraphError;

/// Word characters plus `.`, `:` and `-`. Excludes `>` so an ID can
/// never contain the edge separator `->`.
static STAGE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.:-]+$").unwrap());

/// Grading stage types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    Compile,
    DiffWithSkeleton,
    FileStructureValidation,
    Score,
    StdioTest,
    Valgrind,
    Shell,
    Make,
    GoogleTest,
    PyTest,
    ClangTidy,
    CppCheck,
}

impl StageKind {
    pub const ALL: [StageKind; 12] = [
        StageKind::Compile,
        StageKind::DiffWithSkeleton,
        StageKind::FileStructureValidation,
        StageKind::Score,
        StageKind::StdioTest,
        StageKind::Valgrind,
        StageKind::Shell,
        StageKind::Make,
        StageKind::GoogleTest,
        StageKind::PyTest,
        StageKind::ClangTidy,
        StageKind::CppCheck,
    ];

    /// Tag used in pipeline configs
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Compile => "Compile",
            StageKind::DiffWithSkeleton => "DiffWithSkeleton",
            StageKind::FileStructureValidation => "FileStructureValidation",
            StageKind::Score => "Score",
            StageKind::StdioTest => "StdioTest",
            StageKind::Valgrind => "Valgrind",
            StageKind::Shell => "Shell",
            StageKind::Make => "Make",
            StageKind::GoogleTest => "GoogleTest",
            StageKind::PyTest => "PyTest",
            StageKind::ClangTidy => "ClangTidy",
            StageKind::CppCheck => "CppCheck",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the pipeline.
///
/// `config` is the type-specific payload; the graph model never looks
/// inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub kind: StageKind,
    /// User-facing label, disambiguates stages of the same kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
}

impl Stage {
    /// Create a stage with a fresh client-side ID
    pub fn new(kind: StageKind) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), kind)
    }

    pub fn with_id(id: impl Into<String>, kind: StageKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
            config: serde_json::Value::Null,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    /// Label if set, otherwise the kind tag
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(self.kind.as_str())
    }
}

/// Validate a stage ID.
///
/// Accepts UUIDs and readable IDs such as `compile-1` or `stdio:test.2`.
/// Rejects empty IDs, whitespace and anything that could form `->`.
pub fn validate_stage_id(id: &str) -> Result<(), StageGraphError> {
    if id.is_empty() {
        return Err(StageGraphError::InvalidStageId {
            id: id.to_string(),
            reason: "cannot be empty".into(),
        });
    }

    if !STAGE_ID_PATTERN.is_match(id) {
        return Err(StageGraphError::InvalidStageId {
            id: id.to_string(),
            reason: "only letters, digits, '_', '.', ':' and '-' are allowed".into(),
        });
    }

    Ok(())
}
