// src/system/manifest.rs

use crate::core::command::TaskSink;
use crate::models::Task;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Could not serialize task manifest: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Could not write task manifest to '{path}'")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Serialize)]
struct Manifest<'a> {
    slice_count: usize,
    tasks: &'a [Task],
}

/// Sink that serializes the collected tasks to a pretty-printed JSON
/// manifest for the external executor.
#[derive(Debug, Default)]
pub struct ManifestWriter {
    slice_count: usize,
    tasks: Vec<Task>,
}

impl ManifestWriter {
    pub fn new(slice_count: usize) -> Self {
        Self {
            slice_count,
            tasks: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, ManifestError> {
        let manifest = Manifest {
            slice_count: self.slice_count,
            tasks: &self.tasks,
        };
        Ok(serde_json::to_string_pretty(&manifest)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| ManifestError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
        log::info!(
            "Wrote manifest with {} task(s) to '{}'.",
            self.tasks.len(),
            path.display()
        );
        Ok(())
    }
}

impl TaskSink for ManifestWriter {
    fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn manifest_serializes_sorted_dependency_sets() {
        let mut writer = ManifestWriter::new(2);
        let mut task = Task {
            tokens: vec!["pre-merge".into()],
            ..Task::default()
        };
        task.inputs.insert(PathBuf::from("ws/0001.mha"));
        task.inputs.insert(PathBuf::from("ws/0000.mha"));
        task.settings.insert("threeD".into());
        writer.add(task);

        let json = writer.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["slice_count"], 2);
        assert_eq!(parsed["tasks"][0]["inputs"][0], "ws/0000.mha");
        assert_eq!(parsed["tasks"][0]["inputs"][1], "ws/0001.mha");
        assert_eq!(parsed["tasks"][0]["settings"][0], "threeD");
    }

    #[test]
    fn write_to_produces_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let mut writer = ManifestWriter::new(1);
        writer.add(Task::default());
        writer.write_to(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"tasks\""));
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let writer = ManifestWriter::new(0);
        let err = writer
            .write_to(Path::new("no/such/dir/manifest.json"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::Write { .. }));
    }
}
