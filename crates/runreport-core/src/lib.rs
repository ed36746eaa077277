//! runreport Core Library
//!
//! Aggregates experiment run directories into a single report table:
//! - [`RunRecordLoader`] discovers and parses run directories
//! - [`RunFilter`] narrows records by run name, environment and status
//! - [`field::resolve`] navigates nested documents without failing
//! - [`summary`] derives algorithm names and return statistics
//! - [`ColumnRegistry`] picks columns for a verbosity tier
//! - [`build_table`] turns records into sorted rows

pub mod columns;
pub mod config;
pub mod error;
pub mod field;
pub mod filter;
pub mod format;
pub mod obs;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod summary;
pub mod table;
pub mod telemetry;

pub use columns::{ColumnRegistry, ColumnSpec, ExtractFn};
pub use config::ReportConfig;
pub use error::{ColumnError, ConfigError, LoadError, RegistryError};
pub use field::{resolve, FieldPath};
pub use filter::RunFilter;
pub use pipeline::{generate_report, generate_report_concurrent, Report};
pub use record::{Discovery, LoadFailure, LoadOutcome, RunRecord, RunRecordLoader};
pub use render::{
    render_csv, render_latex, render_text, write_csv, write_json, write_latex, ReportArtifact,
};
pub use summary::{
    algorithm_name, imit_expert_ratio, return_summaries, return_summary, ReturnSummaries,
    ReturnSummary, StatsKind,
};
pub use table::{build_rows, build_table, CellError, ReportRow, ReportTable};
pub use telemetry::init_tracing;

/// runreport version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
