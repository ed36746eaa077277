//! Report rows and table assembly.
//!
//! [`build_table`] applies a column selection to every record, in input
//! order, then sorts the rows by algorithm and environment. A column that
//! fails on one record leaves a `null` cell and a [`CellError`]; the rest of
//! the table is unaffected.

use std::cmp::Ordering;
use std::path::PathBuf;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::columns::{ColumnSpec, ALGO, ENV_NAME};
use crate::error::ColumnError;
use crate::obs::emit_report_built;
use crate::record::RunRecord;

/// Columns the canonical row order sorts by, most significant first.
pub const SORT_COLUMNS: [&str; 2] = [ALGO, ENV_NAME];

/// One run's cells, keyed by column name in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub source: PathBuf,
    cells: Vec<(&'static str, Value)>,
}

impl ReportRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| v)
    }

    pub fn cells(&self) -> &[(&'static str, Value)] {
        &self.cells
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(|(_, v)| v)
    }
}

impl Serialize for ReportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A column function that failed on one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellError {
    pub source: PathBuf,
    pub column: &'static str,
    pub reason: String,
}

/// Ordered rows over an ordered column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<ReportRow>,
    pub cell_errors: Vec<CellError>,
}

impl ReportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Stable sort by `algo` then `env_name`.
    ///
    /// Sort columns missing from the selection are skipped; with neither
    /// present the insertion order is kept. Nulls sort last.
    pub fn sort_canonical(&mut self) {
        let keys: Vec<&str> = SORT_COLUMNS
            .iter()
            .copied()
            .filter(|k| self.columns.contains(k))
            .collect();
        if keys.is_empty() {
            return;
        }
        self.rows.sort_by(|a, b| {
            keys.iter().fold(Ordering::Equal, |acc, key| {
                acc.then_with(|| compare_cells(a.get(key), b.get(key)))
            })
        });
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Number(_) => 0,
        Value::String(_) => 1,
        Value::Bool(_) => 2,
        Value::Array(_) | Value::Object(_) => 3,
        Value::Null => 4,
    }
}

/// Total order over cells: numbers, strings, booleans, containers, then nulls.
pub fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ if type_rank(a) != type_rank(b) => type_rank(a).cmp(&type_rank(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn build_row(
    record: &RunRecord,
    columns: &[ColumnSpec],
    errors: &mut Vec<CellError>,
) -> ReportRow {
    let cells = columns
        .iter()
        .map(|spec| {
            let value = (spec.extract)(record).unwrap_or_else(|e: ColumnError| {
                tracing::warn!(
                    dir = %record.dir().display(),
                    column = spec.name,
                    error = %e,
                    "column extraction failed"
                );
                errors.push(CellError {
                    source: record.dir().to_path_buf(),
                    column: spec.name,
                    reason: e.to_string(),
                });
                Value::Null
            });
            (spec.name, value)
        })
        .collect();
    ReportRow {
        source: record.dir().to_path_buf(),
        cells,
    }
}

/// Build one row per record in input order, without sorting.
pub fn build_rows<'a, I>(records: I, columns: &[ColumnSpec]) -> ReportTable
where
    I: IntoIterator<Item = &'a RunRecord>,
{
    let mut cell_errors = Vec::new();
    let rows = records
        .into_iter()
        .map(|record| build_row(record, columns, &mut cell_errors))
        .collect();
    ReportTable {
        columns: columns.iter().map(|c| c.name).collect(),
        rows,
        cell_errors,
    }
}

/// Build rows and apply the canonical sort.
pub fn build_table<'a, I>(records: I, columns: &[ColumnSpec]) -> ReportTable
where
    I: IntoIterator<Item = &'a RunRecord>,
{
    let mut table = build_rows(records, columns);
    table.sort_canonical();
    emit_report_built(table.rows.len(), table.columns.len(), table.cell_errors.len());
    table
}
