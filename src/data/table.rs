//! Server-backed history table.
//!
//! The `/table` endpoint answers with `{"data": [...]}` where each entry is a
//! row object (or a positional array). Rows are flattened into string cells
//! once on load; sorting and export work on those cells.

use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

/// One loaded copy of the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSnapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct Envelope {
    data: Vec<Value>,
}

impl TableSnapshot {
    /// Parse a `/table` response body.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let envelope: Envelope = serde_json::from_str(body)?;

        let mut columns: Vec<String> = Vec::new();
        for row in &envelope.data {
            match row {
                Value::Object(map) => {
                    for key in map.keys() {
                        if !columns.iter().any(|c| c == key) {
                            columns.push(key.clone());
                        }
                    }
                }
                Value::Array(cells) => {
                    for i in columns.len()..cells.len() {
                        columns.push(format!("#{}", i + 1));
                    }
                }
                _ => {
                    if columns.is_empty() {
                        columns.push("value".to_string());
                    }
                }
            }
        }

        let rows = envelope
            .data
            .iter()
            .map(|row| match row {
                Value::Object(map) => columns
                    .iter()
                    .map(|c| map.get(c).map(cell_text).unwrap_or_default())
                    .collect(),
                Value::Array(cells) => {
                    let mut out: Vec<String> = cells.iter().map(cell_text).collect();
                    out.resize(columns.len(), String::new());
                    out
                }
                other => {
                    let mut out = vec![cell_text(other)];
                    out.resize(columns.len().max(1), String::new());
                    out
                }
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows ordered by `column`. Cells that both parse as numbers compare
    /// numerically, anything else compares as text. An out-of-range column
    /// keeps server order.
    pub fn sorted_rows(&self, column: usize, ascending: bool) -> Vec<&[String]> {
        let mut rows: Vec<&[String]> = self.rows.iter().map(Vec::as_slice).collect();
        if column >= self.columns.len() {
            return rows;
        }
        rows.sort_by(|a, b| {
            let ord = compare_cells(&a[column], &b[column]);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        rows
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.columns)?;
        for row in &self.rows {
            csv.write_record(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Export the table to a CSV file.
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Table UI state that survives restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableUiState {
    pub sort_column: usize,
    pub ascending: bool,
}

impl Default for TableUiState {
    fn default() -> Self {
        Self {
            sort_column: 0,
            ascending: true,
        }
    }
}

impl TableUiState {
    /// Load saved state, falling back to defaults if the file is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::debug!(path = %path.display(), error = %e, "ignoring bad table state");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
