//! Report configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. The CLI layers its flags and `RUNREPORT_*` environment variables
//! on top of whatever [`ReportConfig::from_json_file`] returns.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter::RunFilter;

/// Where the experiment framework writes training runs by default.
pub const DEFAULT_SOURCE_DIR: &str = "output/sacred/train";
pub const DEFAULT_TABLE_VERBOSITY: usize = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub source_dirs: Vec<PathBuf>,
    pub run_name: Option<String>,
    pub env_name: Option<String>,
    pub skip_failed_runs: bool,
    /// 0 shows the fewest columns; anything past the last tier shows all.
    pub table_verbosity: usize,
    pub csv_output_path: Option<PathBuf>,
    pub tex_output_path: Option<PathBuf>,
    pub json_output_path: Option<PathBuf>,
    pub print_table: bool,
    /// Directories parsed concurrently. 1 keeps the load sequential.
    pub jobs: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            source_dirs: vec![PathBuf::from(DEFAULT_SOURCE_DIR)],
            run_name: None,
            env_name: None,
            skip_failed_runs: false,
            table_verbosity: DEFAULT_TABLE_VERBOSITY,
            csv_output_path: None,
            tex_output_path: None,
            json_output_path: None,
            print_table: true,
            jobs: 1,
        }
    }
}

impl ReportConfig {
    /// Load a JSON config file; missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_dirs.is_empty() {
            return Err(ConfigError::NoSourceDirs);
        }
        if self.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        Ok(())
    }

    pub fn filter(&self) -> RunFilter {
        RunFilter {
            run_name: self.run_name.clone(),
            env_name: self.env_name.clone(),
            skip_failed_runs: self.skip_failed_runs,
        }
    }
}
