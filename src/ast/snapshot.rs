//! Pipeline Snapshot - read-only view of an editing session
//!
//! ```yaml
//! name: lab3
//! stages:
//!   - id: compile
//!     kind: Compile
//!   - id: test
//!     kind: StdioTest
//!     label: public cases
//!     dependsOn: [compile]
//! ```
//!
//! Stage configs are carried as opaque values; this is not the persisted
//! pipeline config format.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::dag::validate_pipeline;
use crate::editor::PipelineEditor;
use crate::error::{Result, StageGraphError};

use super::stage::{validate_stage_id, Stage, StageKind};

/// One stage plus the stages it depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEntry {
    pub id: String,
    pub kind: StageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl StageEntry {
    fn to_stage(&self) -> Stage {
        Stage {
            id: self.id.clone(),
            kind: self.kind,
            label: self.label.clone(),
            config: self.config.clone(),
        }
    }
}

/// Snapshot of a pipeline editing session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub stages: Vec<StageEntry>,
}

impl PipelineSnapshot {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a snapshot file (YAML, which also covers JSON)
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StageGraphError::SnapshotNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| StageGraphError::SerializeError {
            details: e.to_string(),
        })
    }

    /// Build an editing session, validating IDs and the whole graph.
    pub fn into_editor(self) -> Result<PipelineEditor> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for entry in &self.stages {
            validate_stage_id(&entry.id)?;
            if !seen.insert(entry.id.as_str()) {
                return Err(StageGraphError::DuplicateStage {
                    id: entry.id.clone(),
                });
            }
        }

        let mut editor = PipelineEditor::new();
        for entry in &self.stages {
            editor.add_stage(entry.to_stage())?;
        }

        // Loaded graphs arrive whole, so they are validated whole rather
        // than edge by edge.
        let mut graph = editor.graph().clone();
        for entry in &self.stages {
            for dep in &entry.depends_on {
                graph.add_dependency(&entry.id, dep);
            }
        }
        validate_pipeline(&graph, &seen)?;
        editor.replace_graph(graph);

        tracing::debug!(
            name = self.name.as_deref().unwrap_or("(unnamed)"),
            stages = editor.len(),
            "snapshot loaded"
        );

        Ok(editor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAB: &str = r#"
name: lab3
stages:
  - id: diff
    kind: DiffWithSkeleton
  - id: compile
    kind: Compile
    config:
      input: ["*.cpp"]
  - id: test
    kind: StdioTest
    dependsOn: [compile]
  - id: score
    kind: Score
    dependsOn: [diff, test]
"#;

    #[test]
    fn test_parse_snapshot() {
        let snapshot = PipelineSnapshot::from_yaml(LAB).unwrap();
        assert_eq!(snapshot.name.as_deref(), Some("lab3"));
        assert_eq!(snapshot.stages.len(), 4);
        assert_eq!(snapshot.stages[3].depends_on, vec!["diff", "test"]);
    }

    #[test]
    fn test_into_editor_builds_graph() {
        let editor = PipelineSnapshot::from_yaml(LAB).unwrap().into_editor().unwrap();
        let deps: Vec<&str> = editor
            .graph()
            .dependencies("score")
            .iter()
            .map(AsRef::as_ref)
            .collect();
        assert_eq!(deps, vec!["diff", "test"]);
        assert_eq!(editor.len(), 4);
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let yaml = "stages:\n  - {id: a, kind: Compile}\n  - {id: a, kind: Score}\n";
        let err = PipelineSnapshot::from_yaml(yaml).unwrap().into_editor().unwrap_err();
        assert!(matches!(err, StageGraphError::DuplicateStage { .. }));
    }

    #[test]
    fn test_missing_dependency_rejected() {
        let yaml = "stages:\n  - {id: a, kind: Score, dependsOn: [ghost]}\n";
        let err = PipelineSnapshot::from_yaml(yaml).unwrap().into_editor().unwrap_err();
        assert!(matches!(err, StageGraphError::MissingDependency { .. }));
    }

    #[test]
    fn test_branched_snapshot_rejected() {
        let yaml = r#"
stages:
  - {id: compile, kind: Compile}
  - {id: test, kind: StdioTest, dependsOn: [compile]}
  - {id: leak, kind: Valgrind, dependsOn: [compile]}
"#;
        let err = PipelineSnapshot::from_yaml(yaml).unwrap().into_editor().unwrap_err();
        assert!(matches!(err, StageGraphError::BranchedPipeline { .. }));
    }

    #[test]
    fn test_invalid_id_rejected() {
        let yaml = "stages:\n  - {id: 'a->b', kind: Compile}\n";
        let err = PipelineSnapshot::from_yaml(yaml).unwrap().into_editor().unwrap_err();
        assert!(matches!(err, StageGraphError::InvalidStageId { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = PipelineSnapshot::from_yaml("stages: [ {id: a").unwrap_err();
        assert!(err.to_string().contains("SG-001"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineSnapshot::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, StageGraphError::SnapshotNotFound { .. }));
    }

    #[test]
    fn test_editor_snapshot_roundtrip() {
        let editor = PipelineSnapshot::from_yaml(LAB).unwrap().into_editor().unwrap();
        let snapshot = editor.to_snapshot();
        let again = PipelineSnapshot::from_yaml(&snapshot.to_yaml().unwrap()).unwrap();
        assert_eq!(snapshot, again);
        assert_eq!(again.stages[1].config["input"][0], "*.cpp");
    }
}
