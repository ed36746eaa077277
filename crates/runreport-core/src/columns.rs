//! Ordered report columns and verbosity tiers.
//!
//! A [`ColumnRegistry`] is a fixed list of `(name, extract fn)` pairs whose
//! order is the display order, plus a list of tiers. Tier `k` is a set of
//! column names that contains every name in tier `k - 1`. Selecting a tier
//! projects the registry onto that set without reordering; selecting past the
//! last tier returns every column.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::OnceLock;

use serde_json::{Number, Value};

use crate::error::{ColumnError, RegistryError};
use crate::record::{paths, RunRecord};
use crate::summary::{algorithm_name, imit_expert_ratio, return_summary, StatsKind};

/// Extracts one cell from a record.
pub type ExtractFn = fn(&RunRecord) -> Result<Value, ColumnError>;

pub const STATUS: &str = "status";
pub const EXP_COMMAND: &str = "exp_command";
pub const ALGO: &str = "algo";
pub const ENV_NAME: &str = "env_name";
pub const N_EXPERT_DEMOS: &str = "n_expert_demos";
pub const RUN_NAME: &str = "run_name";
pub const EXPERT_RETURN_SUMMARY: &str = "expert_return_summary";
pub const IMIT_RETURN_SUMMARY: &str = "imit_return_summary";
pub const IMIT_EXPERT_RATIO: &str = "imit_expert_ratio";

/// A named column and the function that fills it.
#[derive(Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub extract: ExtractFn,
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ColumnSpec").field(&self.name).finish()
    }
}

impl ColumnSpec {
    pub const fn new(name: &'static str, extract: ExtractFn) -> Self {
        Self { name, extract }
    }
}

fn opt_string(s: Option<String>) -> Value {
    s.map(Value::String).unwrap_or(Value::Null)
}

fn run_value(record: &RunRecord, path: &str) -> Value {
    record.run_field(path).cloned().unwrap_or(Value::Null)
}

fn config_value(record: &RunRecord, path: &str) -> Value {
    record.config_field(path).cloned().unwrap_or(Value::Null)
}

fn status_cell(record: &RunRecord) -> Result<Value, ColumnError> {
    Ok(run_value(record, paths::STATUS))
}

fn exp_command_cell(record: &RunRecord) -> Result<Value, ColumnError> {
    Ok(opt_string(record.command()))
}

fn algo_cell(record: &RunRecord) -> Result<Value, ColumnError> {
    Ok(opt_string(algorithm_name(record)?))
}

fn env_name_cell(record: &RunRecord) -> Result<Value, ColumnError> {
    Ok(config_value(record, paths::ENV_NAME))
}

fn n_expert_demos_cell(record: &RunRecord) -> Result<Value, ColumnError> {
    Ok(config_value(record, paths::N_EXPERT_DEMOS))
}

fn run_name_cell(record: &RunRecord) -> Result<Value, ColumnError> {
    Ok(run_value(record, paths::RUN_NAME))
}

fn expert_summary_cell(record: &RunRecord) -> Result<Value, ColumnError> {
    Ok(opt_string(
        return_summary(record, StatsKind::Expert)?.map(|s| s.to_string()),
    ))
}

fn imit_summary_cell(record: &RunRecord) -> Result<Value, ColumnError> {
    Ok(opt_string(
        return_summary(record, StatsKind::Imitation)?.map(|s| s.to_string()),
    ))
}

fn ratio_cell(record: &RunRecord) -> Result<Value, ColumnError> {
    Ok(imit_expert_ratio(record)?
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null))
}

const STANDARD_COLUMNS: [ColumnSpec; 9] = [
    ColumnSpec::new(STATUS, status_cell),
    ColumnSpec::new(EXP_COMMAND, exp_command_cell),
    ColumnSpec::new(ALGO, algo_cell),
    ColumnSpec::new(ENV_NAME, env_name_cell),
    ColumnSpec::new(N_EXPERT_DEMOS, n_expert_demos_cell),
    ColumnSpec::new(RUN_NAME, run_name_cell),
    ColumnSpec::new(EXPERT_RETURN_SUMMARY, expert_summary_cell),
    ColumnSpec::new(IMIT_RETURN_SUMMARY, imit_summary_cell),
    ColumnSpec::new(IMIT_EXPERT_RATIO, ratio_cell),
];

/// Additions per tier; each tier is the union of all additions up to it.
const STANDARD_TIER_ADDITIONS: [&[&str]; 3] = [
    &[ALGO, ENV_NAME, EXPERT_RETURN_SUMMARY, IMIT_RETURN_SUMMARY],
    &[N_EXPERT_DEMOS],
    &[STATUS, IMIT_EXPERT_RATIO, EXP_COMMAND, RUN_NAME],
];

/// Ordered column specs plus monotonic verbosity tiers.
#[derive(Debug, Clone)]
pub struct ColumnRegistry {
    columns: Vec<ColumnSpec>,
    tiers: Vec<BTreeSet<&'static str>>,
}

impl ColumnRegistry {
    /// Validate and build a registry.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateColumn`] if two specs share a name.
    /// - [`RegistryError::UnknownColumn`] if a tier names a missing column.
    /// - [`RegistryError::NonMonotonicTier`] if a tier drops a name from the
    ///   tier before it.
    pub fn new(
        columns: Vec<ColumnSpec>,
        tiers: Vec<BTreeSet<&'static str>>,
    ) -> Result<Self, RegistryError> {
        let mut names = HashSet::new();
        for spec in &columns {
            if !names.insert(spec.name) {
                return Err(RegistryError::DuplicateColumn(spec.name.to_string()));
            }
        }
        for (tier, set) in tiers.iter().enumerate() {
            if let Some(unknown) = set.iter().find(|name| !names.contains(*name)) {
                return Err(RegistryError::UnknownColumn {
                    tier,
                    column: unknown.to_string(),
                });
            }
            if tier > 0 {
                if let Some(dropped) = tiers[tier - 1].difference(set).next() {
                    return Err(RegistryError::NonMonotonicTier {
                        tier,
                        previous: tier - 1,
                        column: dropped.to_string(),
                    });
                }
            }
        }
        Ok(Self { columns, tiers })
    }

    /// The built-in registry, constructed once per process.
    pub fn standard() -> &'static ColumnRegistry {
        static STANDARD: OnceLock<ColumnRegistry> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let mut tiers: Vec<BTreeSet<&'static str>> = Vec::new();
            for additions in STANDARD_TIER_ADDITIONS {
                let mut tier = tiers.last().cloned().unwrap_or_default();
                tier.extend(additions.iter().copied());
                tiers.push(tier);
            }
            ColumnRegistry {
                columns: STANDARD_COLUMNS.to_vec(),
                tiers,
            }
        })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Columns shown at verbosity `tier`, in registry order.
    pub fn select(&self, tier: usize) -> Vec<ColumnSpec> {
        match self.tiers.get(tier) {
            None => self.columns.clone(),
            Some(names) => self
                .columns
                .iter()
                .filter(|c| names.contains(c.name))
                .copied()
                .collect(),
        }
    }
}
