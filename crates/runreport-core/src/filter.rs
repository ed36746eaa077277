//! Record selection by run name, environment name and failure status.

use serde::{Deserialize, Serialize};

use crate::obs::emit_filter_applied;
use crate::record::{RunRecord, FAILED_STATUS};

/// Three independent predicates combined with AND. `None`/`false` disables
/// an axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFilter {
    /// Keep only runs whose `run.json` `experiment.name` equals this.
    pub run_name: Option<String>,
    /// Keep only runs whose `config.json` `env_name` equals this.
    pub env_name: Option<String>,
    /// Drop runs whose status is `FAILED`.
    pub skip_failed_runs: bool,
}

impl RunFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run_name(mut self, name: impl Into<String>) -> Self {
        self.run_name = Some(name.into());
        self
    }

    pub fn with_env_name(mut self, name: impl Into<String>) -> Self {
        self.env_name = Some(name.into());
        self
    }

    pub fn skip_failed(mut self, skip: bool) -> Self {
        self.skip_failed_runs = skip;
        self
    }

    /// Whether `record` passes every enabled predicate.
    ///
    /// A missing or non-string name never equals the wanted name. A missing
    /// status is not `FAILED`, so it survives `skip_failed_runs`.
    pub fn matches(&self, record: &RunRecord) -> bool {
        if let Some(wanted) = &self.run_name {
            if record.run_name() != Some(wanted.as_str()) {
                return false;
            }
        }
        if let Some(wanted) = &self.env_name {
            if record.env_name() != Some(wanted.as_str()) {
                return false;
            }
        }
        !(self.skip_failed_runs && record.status() == Some(FAILED_STATUS))
    }

    /// Keep matching records, preserving their relative order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a RunRecord>
    where
        I: IntoIterator<Item = &'a RunRecord>,
    {
        let mut before = 0;
        let kept: Vec<&RunRecord> = records
            .into_iter()
            .inspect(|_| before += 1)
            .filter(|r| self.matches(r))
            .collect();
        emit_filter_applied(before, kept.len());
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn rec(dir: &str, config: Value, run: Value) -> RunRecord {
        RunRecord::from_documents(dir, config, run).unwrap()
    }

    fn sample() -> Vec<RunRecord> {
        vec![
            rec(
                "/r/0",
                json!({"env_name": "CartPole-v1"}),
                json!({"status": "COMPLETED", "experiment": {"name": "a"}}),
            ),
            rec(
                "/r/1",
                json!({"env_name": "Hopper-v3"}),
                json!({"status": "FAILED", "experiment": {"name": "a"}}),
            ),
            rec(
                "/r/2",
                json!({"env_name": "CartPole-v1"}),
                json!({"status": "FAILED", "experiment": {"name": "b"}}),
            ),
            rec("/r/3", json!({}), json!({})),
        ]
    }

    fn dirs(records: &[&RunRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.dir().display().to_string())
            .collect()
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let records = sample();
        let kept = RunFilter::new().apply(&records);
        assert_eq!(dirs(&kept), vec!["/r/0", "/r/1", "/r/2", "/r/3"]);
    }

    #[test]
    fn run_name_filter_excludes_missing_names() {
        let records = sample();
        let kept = RunFilter::new().with_run_name("a").apply(&records);
        assert_eq!(dirs(&kept), vec!["/r/0", "/r/1"]);
    }

    #[test]
    fn env_name_filter() {
        let records = sample();
        let kept = RunFilter::new().with_env_name("CartPole-v1").apply(&records);
        assert_eq!(dirs(&kept), vec!["/r/0", "/r/2"]);
    }

    #[test]
    fn skip_failed_keeps_missing_status() {
        let records = sample();
        let kept = RunFilter::new().skip_failed(true).apply(&records);
        assert_eq!(dirs(&kept), vec!["/r/0", "/r/3"]);
    }

    #[test]
    fn predicates_compose_with_and() {
        let records = sample();
        let kept = RunFilter::new()
            .with_run_name("a")
            .with_env_name("CartPole-v1")
            .skip_failed(true)
            .apply(&records);
        assert_eq!(dirs(&kept), vec!["/r/0"]);
    }

    #[test]
    fn output_is_subsequence_by_identity() {
        let records = sample();
        let kept = RunFilter::new().skip_failed(true).apply(&records);
        let mut cursor = 0;
        for r in kept {
            let pos = records[cursor..]
                .iter()
                .position(|candidate| std::ptr::eq(candidate, r))
                .expect("kept record comes from input");
            cursor += pos + 1;
        }
    }
}
