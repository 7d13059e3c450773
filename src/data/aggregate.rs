use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;

use super::model::{CellValue, Table};
use super::schema::{ColumnKind, Schema};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// AggregatedTable – per-group means
// ---------------------------------------------------------------------------

/// One row per distinct grouping-key value, one column per numeric field.
///
/// `NaN` marks a (group, column) pair without any non-missing input value.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTable {
    /// Name of the grouping column.
    pub key_column: String,
    /// Group labels, ascending by key.
    pub groups: Vec<String>,
    /// Numeric column names in header order.
    pub columns: Vec<String>,
    /// Row-major means, `groups.len() * columns.len()` values.
    values: Vec<f64>,
}

impl AggregatedTable {
    pub fn n_rows(&self) -> usize {
        self.groups.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() || self.columns.is_empty()
    }

    /// Mean for (row, col); `NaN` when undefined.
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.columns.len() + col]
    }

    /// Lookup by group label and column name.
    pub fn get(&self, group: &str, column: &str) -> Option<f64> {
        let row = self.groups.iter().position(|g| g == group)?;
        let col = self.columns.iter().position(|c| c == column)?;
        Some(self.value(row, col))
    }

    /// Finite `(min, max)` over all cells, `None` when every cell is `NaN`.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Arrow view of the table: key column first, then one `Float64` column
    /// per numeric field with nulls where the mean is undefined.
    pub fn to_record_batch(&self) -> std::result::Result<RecordBatch, arrow::error::ArrowError> {
        let mut fields = vec![Field::new(&self.key_column, DataType::Utf8, false)];
        let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from(self.groups.clone()))];

        for (col_idx, name) in self.columns.iter().enumerate() {
            fields.push(Field::new(name, DataType::Float64, true));
            let column: Float64Array = (0..self.n_rows())
                .map(|row| Some(self.value(row, col_idx)).filter(|v| !v.is_nan()))
                .collect();
            arrays.push(Arc::new(column));
        }

        RecordBatch::try_new(Arc::new(ArrowSchema::new(fields)), arrays)
    }

    /// Plain-text rendering for logs.
    pub fn pretty(&self) -> String {
        self.to_record_batch()
            .and_then(|batch| arrow::util::pretty::pretty_format_batches(&[batch]))
            .map(|table| table.to_string())
            .unwrap_or_else(|e| format!("<unprintable table: {e}>"))
    }
}

// ---------------------------------------------------------------------------
// Group-by mean
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Group `table` rows by `key` and average each of `numeric_columns`.
///
/// Rows with a missing key are dropped. Keys are compared exactly, so
/// `"asia"` and `"Asia"` are separate groups. Fails with
/// [`PipelineError::Schema`] if `key` or a numeric column is not in the table
/// and with [`PipelineError::EmptyResult`] if no group remains.
pub fn group_means(
    table: &Table,
    schema: &Schema,
    numeric_columns: &[String],
    key: &str,
) -> Result<AggregatedTable> {
    let key_kind = schema.require(key)?;
    let key_idx = table
        .column_index(key)
        .ok_or_else(|| missing_column(table, key))?;
    let col_idx: Vec<usize> = numeric_columns
        .iter()
        .map(|c| table.column_index(c).ok_or_else(|| missing_column(table, c)))
        .collect::<Result<_>>()?;

    let mut groups: BTreeMap<CellValue, Vec<Accumulator>> = BTreeMap::new();
    for row in &table.rows {
        let Some(group_key) = normalize_key(&row[key_idx], key_kind) else {
            continue;
        };
        let accs = groups
            .entry(group_key)
            .or_insert_with(|| vec![Accumulator::default(); col_idx.len()]);
        for (acc, &idx) in accs.iter_mut().zip(&col_idx) {
            if let Some(v) = row[idx].as_f64().filter(|v| !v.is_nan()) {
                acc.push(v);
            }
        }
    }

    if groups.is_empty() {
        return Err(PipelineError::EmptyResult {
            column: key.to_string(),
            reason: format!("no row has a value in '{key}'"),
        });
    }

    let mut labels = Vec::with_capacity(groups.len());
    let mut values = Vec::with_capacity(groups.len() * col_idx.len());
    for (group_key, accs) in &groups {
        log::debug!(
            "group {group_key}: {:?} values",
            accs.iter().map(|a| a.count).collect::<Vec<_>>()
        );
        labels.push(group_key.to_string());
        values.extend(accs.iter().map(Accumulator::mean));
    }

    log::info!(
        "Aggregated {} rows into {} groups by '{key}' over {} numeric columns",
        table.len(),
        labels.len(),
        numeric_columns.len()
    );

    Ok(AggregatedTable {
        key_column: key.to_string(),
        groups: labels,
        columns: numeric_columns.to_vec(),
        values,
    })
}

/// Numeric keys group by value, so `1` and `1.0` fall together.
fn normalize_key(cell: &CellValue, kind: ColumnKind) -> Option<CellValue> {
    match cell {
        CellValue::Null => None,
        CellValue::Integer(_) | CellValue::Float(_) if kind == ColumnKind::Numeric => {
            cell.as_f64().map(CellValue::Float)
        }
        other => Some(other.clone()),
    }
}

fn missing_column(table: &Table, column: &str) -> PipelineError {
    PipelineError::Schema {
        column: column.to_string(),
        available: table.column_names.clone(),
    }
}
