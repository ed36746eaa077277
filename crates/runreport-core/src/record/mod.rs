//! Parsed run records and the loader that discovers them.
//!
//! A run directory holds two JSON documents written by the experiment
//! framework:
//! - `config.json`: the configuration the run was launched with
//! - `run.json`: status, command, experiment metadata and the `result` payload

pub mod loader;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::LoadError;
use crate::field::{resolve, resolve_str, FieldPath};

pub use loader::{Discovery, LoadFailure, LoadOutcome, RunRecordLoader};

/// File name of the configuration document inside a run directory.
pub const CONFIG_FILE: &str = "config.json";
/// File name of the result/status document inside a run directory.
pub const RUN_FILE: &str = "run.json";

/// Run status value that marks a failed run.
pub const FAILED_STATUS: &str = "FAILED";

/// Dotted locations of the fields the report reads.
pub mod paths {
    /// `run.json`
    pub const STATUS: &str = "status";
    /// `run.json`
    pub const COMMAND: &str = "command";
    /// `run.json`
    pub const RUN_NAME: &str = "experiment.name";
    /// `run.json`
    pub const EXPERT_STATS: &str = "result.expert_stats";
    /// `run.json`
    pub const IMIT_STATS: &str = "result.imit_stats";
    /// `config.json`
    pub const ENV_NAME: &str = "env_name";
    /// `config.json`
    pub const ALGORITHM: &str = "algorithm";
    /// `config.json`
    pub const N_EXPERT_DEMOS: &str = "n_expert_demos";
}

/// One run directory's parsed documents.
///
/// # Invariants
///
/// Both documents are JSON objects. Construction through
/// [`RunRecord::from_documents`] rejects anything else, so a record that
/// exists is always navigable.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    dir: PathBuf,
    config: Value,
    run: Value,
}

impl RunRecord {
    /// Pair two already-parsed documents found in `dir`.
    pub fn from_documents(
        dir: impl Into<PathBuf>,
        config: Value,
        run: Value,
    ) -> Result<Self, LoadError> {
        let dir = dir.into();
        if !config.is_object() {
            return Err(LoadError::NotAnObject {
                path: dir.join(CONFIG_FILE),
            });
        }
        if !run.is_object() {
            return Err(LoadError::NotAnObject {
                path: dir.join(RUN_FILE),
            });
        }
        Ok(Self { dir, config, run })
    }

    /// Read and parse both documents from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self, LoadError> {
        let config = read_document(&dir.join(CONFIG_FILE))?;
        let run = read_document(&dir.join(RUN_FILE))?;
        Self::from_documents(dir, config, run)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn run(&self) -> &Value {
        &self.run
    }

    /// Resolve a dotted path in `config.json`.
    pub fn config_field(&self, path: &str) -> Option<&Value> {
        resolve(&self.config, &FieldPath::parse(path))
    }

    /// Resolve a dotted path in `run.json`.
    pub fn run_field(&self, path: &str) -> Option<&Value> {
        resolve(&self.run, &FieldPath::parse(path))
    }

    pub fn status(&self) -> Option<&str> {
        resolve_str(&self.run, &FieldPath::parse(paths::STATUS))
    }

    pub fn run_name(&self) -> Option<&str> {
        resolve_str(&self.run, &FieldPath::parse(paths::RUN_NAME))
    }

    pub fn env_name(&self) -> Option<&str> {
        resolve_str(&self.config, &FieldPath::parse(paths::ENV_NAME))
    }

    /// The command that produced the run, rendered as text.
    ///
    /// Non-string values are rendered as compact JSON so they stay visible.
    pub fn command(&self) -> Option<String> {
        match self.run_field(paths::COMMAND)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn read_document(path: &Path) -> Result<Value, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(config: Value, run: Value) -> RunRecord {
        RunRecord::from_documents("/runs/1", config, run).expect("valid record")
    }

    #[test]
    fn rejects_non_object_config() {
        let err = RunRecord::from_documents("/runs/1", json!([1, 2]), json!({})).unwrap_err();
        match err {
            LoadError::NotAnObject { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected NotAnObject, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_object_run() {
        let err = RunRecord::from_documents("/runs/1", json!({}), json!("done")).unwrap_err();
        assert!(matches!(err, LoadError::NotAnObject { path } if path.ends_with(RUN_FILE)));
    }

    #[test]
    fn accessors_read_expected_documents() {
        let rec = record(
            json!({"env_name": "CartPole-v1"}),
            json!({"status": "COMPLETED", "experiment": {"name": "sweep"}, "command": "train_bc"}),
        );
        assert_eq!(rec.env_name(), Some("CartPole-v1"));
        assert_eq!(rec.status(), Some("COMPLETED"));
        assert_eq!(rec.run_name(), Some("sweep"));
        assert_eq!(rec.command().as_deref(), Some("train_bc"));
    }

    #[test]
    fn missing_fields_are_none() {
        let rec = record(json!({}), json!({}));
        assert_eq!(rec.env_name(), None);
        assert_eq!(rec.status(), None);
        assert_eq!(rec.run_name(), None);
        assert_eq!(rec.command(), None);
    }

    #[test]
    fn non_string_command_is_rendered() {
        let rec = record(json!({}), json!({"command": 42}));
        assert_eq!(rec.command().as_deref(), Some("42"));
    }
}
