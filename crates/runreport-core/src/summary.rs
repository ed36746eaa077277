//! Derived per-run summaries: algorithm identity and return statistics.
//!
//! Everything here is a pure function of a [`RunRecord`]. Absent inputs
//! produce `None`; only a present sub-document with the wrong shape produces
//! a [`ColumnError`].

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::ColumnError;
use crate::field::{resolve_present, FieldPath};
use crate::format::{format_general, format_number};
use crate::record::{paths, RunRecord};

pub const ADVERSARIAL_COMMAND: &str = "train_adversarial";
pub const BC_COMMAND: &str = "train_bc";
pub const DAGGER_COMMAND: &str = "train_dagger";

/// Significant digits used in return summaries.
const SUMMARY_PRECISION: usize = 3;

/// Name the imitation algorithm that produced `record`.
///
/// Unknown commands are not an error: they come back as
/// `??exp_command=<kind>` so they stay visible in the report.
pub fn algorithm_name(record: &RunRecord) -> Result<Option<String>, ColumnError> {
    let command = record.command();
    match command.as_deref() {
        Some(ADVERSARIAL_COMMAND) => match record.config_field(paths::ALGORITHM) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(algo)) => Ok(Some(algo.to_uppercase())),
            Some(_) => Err(ColumnError::UnexpectedShape {
                path: format!("config.{}", paths::ALGORITHM),
                expected: "string",
            }),
        },
        Some(BC_COMMAND) => Ok(Some("BC".to_string())),
        Some(DAGGER_COMMAND) => Ok(Some("DAgger".to_string())),
        Some(other) => Ok(Some(format!("??exp_command={other}"))),
        None => Ok(Some("??exp_command=None".to_string())),
    }
}

/// Which policy a stats sub-document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsKind {
    Expert,
    Imitation,
}

impl StatsKind {
    /// Location of the sub-document in `run.json`.
    pub fn path(self) -> &'static str {
        match self {
            Self::Expert => paths::EXPERT_STATS,
            Self::Imitation => paths::IMIT_STATS,
        }
    }

    /// Imitation returns are measured through a monitor wrapper, so their
    /// keys carry a `monitor_` prefix.
    fn mean_key(self) -> &'static str {
        match self {
            Self::Expert => "return_mean",
            Self::Imitation => "monitor_return_mean",
        }
    }

    fn std_key(self) -> &'static str {
        match self {
            Self::Expert => "return_std",
            Self::Imitation => "monitor_return_std",
        }
    }

    fn count_key(self) -> &'static str {
        "n_traj"
    }
}

/// Mean, standard deviation and sample count of episode returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSummary {
    pub mean: f64,
    pub std: f64,
    /// Kept as the original JSON number so integers render without a fraction.
    pub count: Value,
}

impl fmt::Display for ReturnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ± {} (n={})",
            format_general(self.mean, SUMMARY_PRECISION),
            format_general(self.std, SUMMARY_PRECISION),
            format_number(&self.count).unwrap_or_else(|| self.count.to_string()),
        )
    }
}

/// The raw stats sub-document, if present and not `null`.
pub fn stats_document(record: &RunRecord, kind: StatsKind) -> Option<&Value> {
    resolve_present(record.run(), &FieldPath::parse(kind.path()))
}

fn stat_value<'a>(doc: &'a Value, kind: StatsKind, key: &str) -> Result<&'a Value, ColumnError> {
    let path = || format!("{}.{}", kind.path(), key);
    let map = doc.as_object().ok_or_else(|| ColumnError::UnexpectedShape {
        path: kind.path().to_string(),
        expected: "object",
    })?;
    let value = map
        .get(key)
        .ok_or_else(|| ColumnError::MissingStat { path: path() })?;
    if value.is_number() {
        Ok(value)
    } else {
        Err(ColumnError::UnexpectedShape {
            path: path(),
            expected: "number",
        })
    }
}

fn stat_f64(doc: &Value, kind: StatsKind, key: &str) -> Result<f64, ColumnError> {
    // `is_number` was checked, and every JSON number converts to f64.
    Ok(stat_value(doc, kind, key)?.as_f64().unwrap_or(f64::NAN))
}

/// Parse the summary for `kind`, or `None` when its sub-document is absent.
pub fn return_summary(
    record: &RunRecord,
    kind: StatsKind,
) -> Result<Option<ReturnSummary>, ColumnError> {
    let Some(doc) = stats_document(record, kind) else {
        return Ok(None);
    };
    Ok(Some(ReturnSummary {
        mean: stat_f64(doc, kind, kind.mean_key())?,
        std: stat_f64(doc, kind, kind.std_key())?,
        count: stat_value(doc, kind, kind.count_key())?.clone(),
    }))
}

/// Imitation mean return divided by expert mean return.
///
/// `None` unless both sub-documents are present. A zero expert mean also
/// yields `None` rather than an infinite or NaN ratio.
pub fn imit_expert_ratio(record: &RunRecord) -> Result<Option<f64>, ColumnError> {
    let (Some(expert), Some(imit)) = (
        stats_document(record, StatsKind::Expert),
        stats_document(record, StatsKind::Imitation),
    ) else {
        return Ok(None);
    };
    let expert_mean = stat_f64(expert, StatsKind::Expert, StatsKind::Expert.mean_key())?;
    let imit_mean = stat_f64(imit, StatsKind::Imitation, StatsKind::Imitation.mean_key())?;
    if expert_mean == 0.0 {
        tracing::debug!(dir = %record.dir().display(), "expert mean return is zero, ratio omitted");
        return Ok(None);
    }
    Ok(Some(imit_mean / expert_mean))
}

/// Every return-derived value for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSummaries {
    pub expert_stats: Option<Value>,
    pub imit_stats: Option<Value>,
    pub expert_return_summary: Option<String>,
    pub imit_return_summary: Option<String>,
    pub imit_expert_ratio: Option<f64>,
}

/// Compute all return summaries for `record`. Repeated calls on the same
/// record return equal values.
pub fn return_summaries(record: &RunRecord) -> Result<ReturnSummaries, ColumnError> {
    Ok(ReturnSummaries {
        expert_stats: stats_document(record, StatsKind::Expert).cloned(),
        imit_stats: stats_document(record, StatsKind::Imitation).cloned(),
        expert_return_summary: return_summary(record, StatsKind::Expert)?
            .map(|s| s.to_string()),
        imit_return_summary: return_summary(record, StatsKind::Imitation)?
            .map(|s| s.to_string()),
        imit_expert_ratio: imit_expert_ratio(record)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(config: Value, run: Value) -> RunRecord {
        RunRecord::from_documents("/runs/7", config, run).unwrap()
    }

    fn with_result(result: Value) -> RunRecord {
        record(json!({}), json!({ "result": result }))
    }

    #[test]
    fn adversarial_algorithm_is_upper_cased() {
        let rec = record(
            json!({"algorithm": "gail"}),
            json!({"command": "train_adversarial"}),
        );
        assert_eq!(algorithm_name(&rec).unwrap().as_deref(), Some("GAIL"));
    }

    #[test]
    fn adversarial_without_algorithm_is_none() {
        let rec = record(json!({}), json!({"command": "train_adversarial"}));
        assert_eq!(algorithm_name(&rec).unwrap(), None);
        let rec = record(json!({"algorithm": null}), json!({"command": "train_adversarial"}));
        assert_eq!(algorithm_name(&rec).unwrap(), None);
    }

    #[test]
    fn bc_ignores_config() {
        let rec = record(json!({"algorithm": "airl"}), json!({"command": "train_bc"}));
        assert_eq!(algorithm_name(&rec).unwrap().as_deref(), Some("BC"));
    }

    #[test]
    fn dagger_constant() {
        let rec = record(json!({}), json!({"command": "train_dagger"}));
        assert_eq!(algorithm_name(&rec).unwrap().as_deref(), Some("DAgger"));
    }

    #[test]
    fn unknown_command_is_visible() {
        let rec = record(json!({}), json!({"command": "foo"}));
        let name = algorithm_name(&rec).unwrap().unwrap();
        assert!(name.contains("foo"));
        assert_eq!(name, "??exp_command=foo");
    }

    #[test]
    fn missing_command_is_visible() {
        let rec = record(json!({}), json!({}));
        assert_eq!(
            algorithm_name(&rec).unwrap().as_deref(),
            Some("??exp_command=None")
        );
    }

    #[test]
    fn non_string_algorithm_is_shape_error() {
        let rec = record(json!({"algorithm": 3}), json!({"command": "train_adversarial"}));
        assert!(matches!(
            algorithm_name(&rec),
            Err(ColumnError::UnexpectedShape { expected: "string", .. })
        ));
    }

    #[test]
    fn summary_string_uses_three_significant_digits() {
        let rec = with_result(json!({
            "expert_stats": {"return_mean": 5.123456, "return_std": 0.987654, "n_traj": 10}
        }));
        let summary = return_summary(&rec, StatsKind::Expert).unwrap().unwrap();
        assert_eq!(summary.to_string(), "5.12 ± 0.988 (n=10)");
    }

    #[test]
    fn integral_float_count_prints_as_integer() {
        let rec = with_result(json!({
            "expert_stats": {"return_mean": 1.0, "return_std": 0.5, "n_traj": 10.0}
        }));
        let summary = return_summary(&rec, StatsKind::Expert).unwrap().unwrap();
        assert_eq!(summary.to_string(), "1 ± 0.5 (n=10)");
    }

    #[test]
    fn imitation_summary_reads_monitor_keys() {
        let rec = with_result(json!({
            "imit_stats": {"monitor_return_mean": 7.0, "monitor_return_std": 1.5, "n_traj": 4}
        }));
        let summary = return_summary(&rec, StatsKind::Imitation).unwrap().unwrap();
        assert_eq!(summary.to_string(), "7 ± 1.5 (n=4)");
    }

    #[test]
    fn ratio_requires_both_stats() {
        let only_expert = with_result(json!({
            "expert_stats": {"return_mean": 10.0, "return_std": 1.0, "n_traj": 5}
        }));
        let summaries = return_summaries(&only_expert).unwrap();
        assert_eq!(summaries.imit_expert_ratio, None);
        assert!(summaries.expert_return_summary.is_some());
        assert_eq!(summaries.imit_return_summary, None);
        assert_eq!(summaries.imit_stats, None);

        let only_imit = with_result(json!({
            "imit_stats": {"monitor_return_mean": 7.0, "monitor_return_std": 1.0, "n_traj": 5}
        }));
        assert_eq!(return_summaries(&only_imit).unwrap().imit_expert_ratio, None);
    }

    #[test]
    fn ratio_of_means() {
        let rec = with_result(json!({
            "expert_stats": {"return_mean": 10.0, "return_std": 1.0, "n_traj": 5},
            "imit_stats": {"monitor_return_mean": 7.0, "monitor_return_std": 2.0, "n_traj": 5}
        }));
        let ratio = imit_expert_ratio(&rec).unwrap().unwrap();
        assert!((ratio - 0.7).abs() < 1e-12);
    }

    #[test]
    fn zero_expert_mean_gives_no_ratio() {
        let rec = with_result(json!({
            "expert_stats": {"return_mean": 0.0, "return_std": 1.0, "n_traj": 5},
            "imit_stats": {"monitor_return_mean": 7.0, "monitor_return_std": 2.0, "n_traj": 5}
        }));
        assert_eq!(imit_expert_ratio(&rec).unwrap(), None);
    }

    #[test]
    fn malformed_stats_are_errors_not_panics() {
        let rec = with_result(json!({"expert_stats": {"return_mean": "high"}}));
        assert!(matches!(
            return_summary(&rec, StatsKind::Expert),
            Err(ColumnError::UnexpectedShape { expected: "number", .. })
        ));

        let rec = with_result(json!({"expert_stats": {"return_mean": 1.0}}));
        assert!(matches!(
            return_summary(&rec, StatsKind::Expert),
            Err(ColumnError::MissingStat { .. })
        ));

        let rec = with_result(json!({"expert_stats": [1, 2]}));
        assert!(matches!(
            return_summary(&rec, StatsKind::Expert),
            Err(ColumnError::UnexpectedShape { expected: "object", .. })
        ));
    }

    #[test]
    fn null_stats_count_as_absent() {
        let rec = with_result(json!({"expert_stats": null, "imit_stats": null}));
        let summaries = return_summaries(&rec).unwrap();
        assert_eq!(summaries.expert_return_summary, None);
        assert_eq!(summaries.imit_expert_ratio, None);
    }

    #[test]
    fn summaries_are_referentially_transparent() {
        let rec = with_result(json!({
            "expert_stats": {"return_mean": 3.0, "return_std": 0.5, "n_traj": 2},
            "imit_stats": {"monitor_return_mean": 1.5, "monitor_return_std": 0.1, "n_traj": 2}
        }));
        assert_eq!(return_summaries(&rec).unwrap(), return_summaries(&rec).unwrap());
    }
}
