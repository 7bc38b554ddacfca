//! Tabular data sources the filter engine reads from.
//!
//! The engine only needs row-level read access; anything that can hand out a
//! row of [`CellValue`]s by index can be filtered.

use color_eyre::Result;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::core::types::{CellValue, ColumnKind};

/// Read access to a rectangular dataset.
pub trait TabularSource {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn column_names(&self) -> Vec<String>;

    /// Values of one row in column order. Rows past the end read as empty.
    fn row_values(&self, row: usize) -> Vec<CellValue>;

    /// Columns that offer a filter button, by name.
    fn filterable_columns(&self) -> BTreeMap<String, usize> {
        self.column_names()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (name, idx))
            .collect()
    }

    /// Operator catalogue to offer per column.
    fn column_kinds(&self) -> Vec<ColumnKind> {
        vec![ColumnKind::Text; self.column_count()]
    }

    /// Single cell, `Null` when out of range.
    fn cell(&self, row: usize, column: usize) -> CellValue {
        self.row_values(row).into_iter().nth(column).unwrap_or_default()
    }
}

/// In-memory rows with named columns.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    columns: Vec<String>,
    kinds: Vec<ColumnKind>,
    rows: Vec<Vec<CellValue>>,
    filterable: Option<Vec<usize>>,
}

impl RecordTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let kinds = infer_kinds(columns.len(), &rows);
        Self {
            columns,
            kinds,
            rows,
            filterable: None,
        }
    }

    /// Restrict the filter buttons to the given columns.
    pub fn with_filterable(mut self, columns: Vec<usize>) -> Self {
        self.filterable = Some(columns);
        self
    }

    pub fn with_kinds(mut self, kinds: Vec<ColumnKind>) -> Self {
        self.kinds = kinds;
        self
    }
}

/// A column is numeric when every non-null value in it is a number.
fn infer_kinds(width: usize, rows: &[Vec<CellValue>]) -> Vec<ColumnKind> {
    (0..width)
        .map(|col| {
            let mut values = rows.iter().filter_map(|r| r.get(col)).filter(|v| !v.is_null()).peekable();
            if values.peek().is_some() && values.all(|v| v.numeric().is_some()) {
                ColumnKind::Numeric
            } else {
                ColumnKind::Text
            }
        })
        .collect()
}

impl TabularSource for RecordTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn row_values(&self, row: usize) -> Vec<CellValue> {
        let mut values = self.rows.get(row).cloned().unwrap_or_default();
        values.resize(self.columns.len(), CellValue::Null);
        values
    }

    fn filterable_columns(&self) -> BTreeMap<String, usize> {
        match &self.filterable {
            Some(indices) => indices
                .iter()
                .filter_map(|&idx| self.columns.get(idx).map(|name| (name.clone(), idx)))
                .collect(),
            None => self
                .columns
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.clone(), idx))
                .collect(),
        }
    }

    fn column_kinds(&self) -> Vec<ColumnKind> {
        self.kinds.clone()
    }

    fn cell(&self, row: usize, column: usize) -> CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or_default()
    }
}

/// A polars DataFrame viewed as a tabular source.
#[derive(Debug, Clone)]
pub struct FrameSource {
    df: DataFrame,
}

impl FrameSource {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Read a CSV file with a header row.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10_000))
            .finish()?
            .collect()?;
        debug!("loaded {} rows x {} columns from {}", df.height(), df.width(), path.display());
        Ok(Self { df })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }
}

/// Convert a Polars AnyValue into a cell value
fn anyvalue_to_cell(value: AnyValue) -> CellValue {
    match value {
        AnyValue::Null => CellValue::Null,
        AnyValue::Boolean(b) => CellValue::Bool(b),
        AnyValue::String(s) => CellValue::Text(s.to_string()),
        AnyValue::StringOwned(s) => CellValue::Text(s.to_string()),
        AnyValue::UInt8(n) => CellValue::Integer(n.into()),
        AnyValue::UInt16(n) => CellValue::Integer(n.into()),
        AnyValue::UInt32(n) => CellValue::Integer(n.into()),
        AnyValue::UInt64(n) => i64::try_from(n).map_or(CellValue::Number(n as f64), CellValue::Integer),
        AnyValue::Int8(n) => CellValue::Integer(n.into()),
        AnyValue::Int16(n) => CellValue::Integer(n.into()),
        AnyValue::Int32(n) => CellValue::Integer(n.into()),
        AnyValue::Int64(n) => CellValue::Integer(n),
        AnyValue::Float32(n) => CellValue::Number(n as f64),
        AnyValue::Float64(n) => CellValue::Number(n),
        other => CellValue::Text(format!("{other}")),
    }
}

impl TabularSource for FrameSource {
    fn row_count(&self) -> usize {
        self.df.height()
    }

    fn column_count(&self) -> usize {
        self.df.width()
    }

    fn column_names(&self) -> Vec<String> {
        self.df.get_column_names().iter().map(|n| n.to_string()).collect()
    }

    fn row_values(&self, row: usize) -> Vec<CellValue> {
        self.df
            .get_columns()
            .iter()
            .map(|col| col.get(row).map(anyvalue_to_cell).unwrap_or_default())
            .collect()
    }

    fn column_kinds(&self) -> Vec<ColumnKind> {
        self.df
            .get_columns()
            .iter()
            .map(|col| {
                let is_numeric = matches!(col.dtype(),
                    DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
                    DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
                    DataType::Float32 | DataType::Float64
                );
                if is_numeric { ColumnKind::Numeric } else { ColumnKind::Text }
            })
            .collect()
    }

    fn cell(&self, row: usize, column: usize) -> CellValue {
        self.df
            .get_columns()
            .get(column)
            .and_then(|col| col.get(row).ok())
            .map(anyvalue_to_cell)
            .unwrap_or_default()
    }
}
