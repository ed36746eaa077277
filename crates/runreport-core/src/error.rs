//! Error taxonomy for runreport.
//!
//! Missing fields and unrecognised command kinds are deliberately absent here:
//! they flow through the report as `None` cells or diagnostic strings.

use std::path::PathBuf;

/// Why a run directory could not be turned into a [`RunRecord`](crate::RunRecord).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path:?} is valid JSON but not an object")]
    NotAnObject { path: PathBuf },

    #[error("source root does not exist: {0:?}")]
    MissingRoot(PathBuf),

    #[error("source root is not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("loader task failed: {0}")]
    Task(String),
}

/// A column function hit a document shape it cannot interpret.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColumnError {
    #[error("field {path} has unexpected shape: expected {expected}")]
    UnexpectedShape { path: String, expected: &'static str },

    #[error("field {path} is missing from a present sub-document")]
    MissingStat { path: String },
}

/// Errors raised while constructing a column registry or its tiers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("verbosity tier {tier} names unknown column: {column}")]
    UnknownColumn { tier: usize, column: String },

    #[error("verbosity tier {tier} drops column {column} present in tier {previous}")]
    NonMonotonicTier {
        tier: usize,
        previous: usize,
        column: String,
    },
}

/// Errors from loading a [`ReportConfig`](crate::ReportConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no source directories configured")]
    NoSourceDirs,

    #[error("jobs must be at least 1")]
    ZeroJobs,
}
