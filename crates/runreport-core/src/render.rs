//! Table rendering and export: console text, CSV, LaTeX and a JSON artifact.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::format_number;
use crate::record::LoadFailure;
use crate::table::{CellError, ReportRow, ReportTable};

pub const ARTIFACT_SCHEMA_VERSION: &str = "1.0";

/// Display text for a cell. Nulls render as `None`.
pub fn display_cell(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(_) => format_number(value).unwrap_or_else(|| value.to_string()),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Fixed-width console table: right-aligned columns, single-space gutter,
/// no index column.
pub fn render_text(table: &ReportTable) -> String {
    if table.columns.is_empty() {
        return String::new();
    }
    let body: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.values().map(display_cell).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            body.iter()
                .map(|cells| cells[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<&str> = table.columns.to_vec();
    push_aligned(&mut out, &header, &widths);
    for cells in &body {
        let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
        push_aligned(&mut out, &cells, &widths);
    }
    out
}

fn push_aligned(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", " ".repeat(pad), cell)
        })
        .collect();
    out.push_str(&line.join(" "));
    out.push('\n');
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// RFC 4180 CSV with a header row. Null cells are empty.
pub fn render_csv(table: &ReportTable) -> String {
    let mut out = String::new();
    let header: Vec<String> = table.columns.iter().map(|c| csv_field(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in &table.rows {
        let fields: Vec<String> = row
            .values()
            .map(|v| match v {
                Value::Null => String::new(),
                other => csv_field(&display_cell(other)),
            })
            .collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Escape LaTeX special characters.
pub fn latex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash "),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '~' => out.push_str("\\textasciitilde "),
            '^' => out.push_str("\\textasciicircum "),
            _ => out.push(ch),
        }
    }
    out
}

fn column_alignment(table: &ReportTable, idx: usize) -> char {
    let mut cells = table
        .rows
        .iter()
        .filter_map(|row| row.cells().get(idx).map(|(_, v)| v))
        .filter(|v| !v.is_null())
        .peekable();
    if cells.peek().is_some() && cells.all(Value::is_number) {
        'r'
    } else {
        'l'
    }
}

/// booktabs `tabular` environment. Numeric columns are right-aligned.
pub fn render_latex(table: &ReportTable) -> String {
    let spec: String = (0..table.columns.len())
        .map(|i| column_alignment(table, i))
        .collect();
    let line = |cells: Vec<String>| format!("{} \\\\\n", cells.join(" & "));

    let mut out = format!("\\begin{{tabular}}{{{spec}}}\n\\toprule\n");
    out.push_str(&line(table.columns.iter().map(|c| latex_escape(c)).collect()));
    out.push_str("\\midrule\n");
    for row in &table.rows {
        out.push_str(&line(
            row.values().map(|v| latex_escape(&display_cell(v))).collect(),
        ));
    }
    out.push_str("\\bottomrule\n\\end{tabular}\n");
    out
}

/// A run directory left out of the report, as persisted in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDirArtifact {
    pub dir: PathBuf,
    pub reason: String,
}

impl From<&LoadFailure> for SkippedDirArtifact {
    fn from(failure: &LoadFailure) -> Self {
        Self {
            dir: failure.dir.clone(),
            reason: failure.reason(),
        }
    }
}

/// Machine-readable report written next to (or instead of) the tables.
#[derive(Debug, Clone, Serialize)]
pub struct ReportArtifact<'a> {
    pub schema_version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub columns: &'a [&'static str],
    pub rows: &'a [ReportRow],
    pub cell_errors: &'a [CellError],
    pub skipped: Vec<SkippedDirArtifact>,
}

impl<'a> ReportArtifact<'a> {
    pub fn new(table: &'a ReportTable, failures: &[LoadFailure]) -> Self {
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            generated_at: Utc::now(),
            columns: &table.columns,
            rows: &table.rows,
            cell_errors: &table.cell_errors,
            skipped: failures.iter().map(SkippedDirArtifact::from).collect(),
        }
    }
}

/// Write the table as CSV.
pub fn write_csv(path: &Path, table: &ReportTable) -> Result<()> {
    std::fs::write(path, render_csv(table)).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write the table as a LaTeX `tabular`.
pub fn write_latex(path: &Path, table: &ReportTable) -> Result<()> {
    std::fs::write(path, render_latex(table)).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write the JSON artifact in pretty format.
pub fn write_json(path: &Path, artifact: &ReportArtifact<'_>) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize report artifact")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
