use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::core::error::FilterError;

/// Recoverable anomalies collected over one filtering pass.
///
/// Coercion failures are counted per column rather than logged per row, so a
/// large table with one bad column produces a single warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassDiagnostics {
    /// Column index -> number of predicate evaluations that failed coercion.
    pub coercion_failures: BTreeMap<usize, usize>,
    /// First coercion message seen for each column.
    pub coercion_samples: BTreeMap<usize, String>,
    /// Registry columns skipped because the source does not have them.
    pub ignored_columns: BTreeSet<usize>,
    /// Configuration problems recovered with a default.
    pub warnings: Vec<String>,
}

impl PassDiagnostics {
    pub fn record_coercion(&mut self, column: usize, err: FilterError) {
        *self.coercion_failures.entry(column).or_insert(0) += 1;
        self.coercion_samples
            .entry(column)
            .or_insert_with(|| err.in_column(column).to_string());
    }

    pub fn record_ignored(&mut self, column: usize) {
        self.ignored_columns.insert(column);
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_clean(&self) -> bool {
        self.coercion_failures.is_empty() && self.ignored_columns.is_empty() && self.warnings.is_empty()
    }

    pub fn total_coercion_failures(&self) -> usize {
        self.coercion_failures.values().sum()
    }

    /// Emit one warning per category.
    pub fn log(&self) {
        for message in &self.warnings {
            warn!("{message}");
        }
        if !self.ignored_columns.is_empty() {
            warn!(
                "ignored filters on missing columns: {:?}",
                self.ignored_columns
            );
        }
        for (column, count) in &self.coercion_failures {
            let sample = self.coercion_samples.get(column).map(String::as_str).unwrap_or("");
            warn!("{count} values in column {column} treated as non-matching ({sample})");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_failures_are_aggregated_per_column() {
        let mut diag = PassDiagnostics::default();
        for value in ["a", "b", "c"] {
            diag.record_coercion(
                2,
                FilterError::ValueCoercion {
                    column: None,
                    value: value.to_string(),
                    operator: ">=",
                },
            );
        }
        assert_eq!(diag.coercion_failures.get(&2), Some(&3));
        assert_eq!(diag.total_coercion_failures(), 3);
        assert!(diag.coercion_samples[&2].contains("\"a\""));
        assert!(!diag.is_clean());
    }
}
