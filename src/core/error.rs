//! Error taxonomy for filter specifications and their evaluation.
//!
//! None of these are fatal to a filtering pass: the engine downgrades them to
//! "treat as non-matching" or "treat as unconstrained" and reports them through
//! [`PassDiagnostics`](crate::services::filter_engine::PassDiagnostics).

use thiserror::Error;

/// Errors raised while building, parsing, or evaluating filters.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Malformed predicate or registry (bad operand shape, inverted range, ...).
    #[error("invalid filter configuration: {0}")]
    Configuration(String),

    /// Operator label that is not part of the operator catalogue.
    #[error("unknown filter type >{0}<")]
    UnknownOperator(String),

    /// Combination mode other than AND/OR.
    #[error("unknown filter mode >{0}<")]
    InvalidMode(String),

    /// Operand or cell value cannot be read as the operator's type.
    #[error("cannot read {value:?} as a number for '{operator}'{}", column_suffix(.column))]
    ValueCoercion {
        column: Option<usize>,
        value: String,
        operator: &'static str,
    },

    /// Column index no longer present in the data source.
    #[error("column {column} is out of range (table has {column_count} columns)")]
    OutOfRange { column: usize, column_count: usize },

    /// Filter document that cannot be interpreted at all.
    #[error("malformed filter specification: {0}")]
    Spec(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FilterError {
    /// Attach a column index to a coercion error raised below the column level.
    pub fn in_column(self, idx: usize) -> Self {
        match self {
            FilterError::ValueCoercion { value, operator, .. } => FilterError::ValueCoercion {
                column: Some(idx),
                value,
                operator,
            },
            other => other,
        }
    }
}

fn column_suffix(column: &Option<usize>) -> String {
    column.map(|c| format!(" in column {c}")).unwrap_or_default()
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
