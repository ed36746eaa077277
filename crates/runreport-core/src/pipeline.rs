//! End-to-end report generation: load → filter → select columns → build.

use crate::columns::ColumnRegistry;
use crate::config::ReportConfig;
use crate::record::{LoadFailure, LoadOutcome, RunRecordLoader};
use crate::table::{build_table, ReportTable};

/// A finished report plus what was left out of it.
#[derive(Debug)]
pub struct Report {
    pub table: ReportTable,
    /// Directories that could not be loaded.
    pub failures: Vec<LoadFailure>,
    /// Records parsed before filtering.
    pub loaded: usize,
}

/// Generate a report, parsing run directories sequentially.
pub fn generate_report(config: &ReportConfig, registry: &ColumnRegistry) -> Report {
    let outcome = RunRecordLoader::new(config.source_dirs.iter().cloned()).load();
    assemble(config, registry, outcome)
}

/// Generate a report, parsing up to `config.jobs` directories at once.
/// The result is identical to [`generate_report`].
pub async fn generate_report_concurrent(
    config: &ReportConfig,
    registry: &ColumnRegistry,
) -> Report {
    let outcome = RunRecordLoader::new(config.source_dirs.iter().cloned())
        .load_concurrent(config.jobs)
        .await;
    assemble(config, registry, outcome)
}

fn assemble(config: &ReportConfig, registry: &ColumnRegistry, outcome: LoadOutcome) -> Report {
    let LoadOutcome { records, failures } = outcome;
    let columns = registry.select(config.table_verbosity);
    let table = build_table(config.filter().apply(&records), &columns);
    Report {
        table,
        failures,
        loaded: records.len(),
    }
}
