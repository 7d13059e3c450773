use std::fmt;

use super::model::{CellValue, Table};
use crate::error::{PipelineError, Result};

/// Inferred type of a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-missing cell is an integer or a float. Columns holding only
    /// missing cells are numeric too.
    Numeric,
    /// Every non-missing cell is a boolean. Not averaged.
    Boolean,
    /// Anything else.
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Boolean => write!(f, "boolean"),
            ColumnKind::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// Typed view of a [`Table`]'s columns, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Tag every column of `table` with a [`ColumnKind`].
    pub fn infer(table: &Table) -> Self {
        let columns = table
            .column_names
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnSpec {
                name: name.clone(),
                kind: infer_kind(table.column(idx)),
            })
            .collect();
        Schema { columns }
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Fail with [`PipelineError::Schema`] unless `key` is a column.
    pub fn require(&self, key: &str) -> Result<ColumnKind> {
        self.kind_of(key).ok_or_else(|| PipelineError::Schema {
            column: key.to_string(),
            available: self.columns.iter().map(|c| c.name.clone()).collect(),
        })
    }

    /// Names of numeric columns in header order, never including `key`.
    pub fn numeric_columns(&self, key: &str) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric && c.name != key)
            .map(|c| c.name.clone())
            .collect()
    }
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a CellValue>) -> ColumnKind {
    let mut kind = None;
    for cell in cells {
        let cell_kind = match cell {
            CellValue::Null => continue,
            CellValue::Integer(_) | CellValue::Float(_) => ColumnKind::Numeric,
            CellValue::Bool(_) => ColumnKind::Boolean,
            CellValue::Text(_) => return ColumnKind::Text,
        };
        match kind {
            None => kind = Some(cell_kind),
            Some(k) if k != cell_kind => return ColumnKind::Text,
            Some(_) => {}
        }
    }
    kind.unwrap_or(ColumnKind::Numeric)
}
