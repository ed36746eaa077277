//! Structured observability hooks for the scan and report lifecycle.
//!
//! Events are emitted through `tracing`; the subscriber installed by
//! [`init_tracing`](crate::init_tracing) decides format and filtering.

use std::path::Path;

use tracing::{debug, info, warn};

/// Scan-scoped span, not yet entered.
///
/// Async loads attach it with `tracing::Instrument` so no guard is held
/// across an await point.
pub fn scan_span(root_count: usize) -> tracing::Span {
    tracing::info_span!("runreport.scan", roots = root_count)
}

/// RAII guard that enters [`scan_span`] for the duration of a blocking load.
pub struct ScanSpan {
    _span: tracing::span::EnteredSpan,
}

impl ScanSpan {
    pub fn enter(root_count: usize) -> Self {
        Self {
            _span: scan_span(root_count).entered(),
        }
    }
}

/// Emit event: scan started over `roots`.
pub fn emit_scan_started(roots: &[std::path::PathBuf]) {
    info!(event = "scan.started", roots = ?roots);
}

/// Emit event: a candidate directory was skipped (warning level).
pub fn emit_record_skipped(dir: &Path, reason: &dyn std::fmt::Display) {
    warn!(event = "scan.record_skipped", dir = %dir.display(), reason = %reason);
}

/// Emit event: scan finished.
pub fn emit_scan_finished(discovered: usize, loaded: usize, skipped: usize) {
    info!(
        event = "scan.finished",
        discovered = discovered,
        loaded = loaded,
        skipped = skipped,
    );
}

/// Emit event: records narrowed by the run filter.
pub fn emit_filter_applied(before: usize, after: usize) {
    debug!(event = "filter.applied", before = before, after = after);
}

/// Emit event: report table assembled.
pub fn emit_report_built(rows: usize, columns: usize, cell_errors: usize) {
    info!(
        event = "report.built",
        rows = rows,
        columns = columns,
        cell_errors = cell_errors,
    );
}
