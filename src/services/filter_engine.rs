//! Row filtering engine
//!
//! Evaluates a [`FilterRegistry`] against a [`TabularSource`] row by row.
//! A full pass is a pure fold: it returns the accepted rows, the match count
//! and any recovered anomalies as one [`FilterPass`] value.

use std::time::Instant;
use tracing::{debug, info};

use crate::core::registry::EvaluationOrder;
use crate::core::{CombineMode, FilterRegistry, TabularSource};

pub use crate::core::diagnostics::PassDiagnostics;

/// Per-row acceptance test over a borrowed registry and source.
///
/// The evaluation order is resolved once at construction; `accepts` can then
/// be called for any row, in any order, as often as the view needs.
pub struct RowFilter<'a> {
    registry: &'a FilterRegistry,
    source: &'a dyn TabularSource,
    order: EvaluationOrder,
}

impl<'a> RowFilter<'a> {
    pub fn new(registry: &'a FilterRegistry, source: &'a dyn TabularSource) -> Self {
        let order = registry.evaluation_order(source.column_count());
        Self {
            registry,
            source,
            order,
        }
    }

    /// Columns evaluated for each row, in order.
    pub fn columns(&self) -> &[usize] {
        &self.order.columns
    }

    /// Registry columns the source does not have.
    pub fn ignored_columns(&self) -> &[usize] {
        &self.order.out_of_range
    }

    /// True when no column constrains any row.
    pub fn is_unconstrained(&self) -> bool {
        self.order.columns.is_empty()
    }

    /// Decide whether `row` is visible.
    ///
    /// Under AND the first failing column rejects the row without looking at
    /// the remaining ones. Under OR every column is evaluated so coercion
    /// failures are counted for all of them.
    pub fn accepts(&self, row: usize, diagnostics: &mut PassDiagnostics) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        match self.registry.inter_mode {
            CombineMode::And => self.order.columns.iter().all(|&column| self.column_passes(row, column, diagnostics)),
            CombineMode::Or => {
                let mut matched = false;
                for &column in &self.order.columns {
                    matched |= self.column_passes(row, column, diagnostics);
                }
                matched
            }
        }
    }

    fn column_passes(&self, row: usize, column: usize, diagnostics: &mut PassDiagnostics) -> bool {
        match self.registry.column(column) {
            Some(set) => set.evaluate(column, &self.source.cell(row, column), diagnostics),
            None => true,
        }
    }
}

/// Result of one full filtering pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPass {
    /// Accepted row indices, ascending.
    pub accepted: Vec<usize>,
    pub match_count: usize,
    /// False when the pass short-circuited because nothing was filtered.
    pub filtered: bool,
    pub diagnostics: PassDiagnostics,
}

impl FilterPass {
    /// Every row visible, no filtering performed.
    pub fn unfiltered(row_count: usize) -> Self {
        Self {
            accepted: (0..row_count).collect(),
            match_count: row_count,
            filtered: false,
            diagnostics: PassDiagnostics::default(),
        }
    }

    pub fn status_line(&self) -> String {
        if self.filtered {
            format!("{} filter matches found", self.match_count)
        } else {
            format!("{} rows", self.match_count)
        }
    }
}

/// Evaluate `registry` against every row of `source`.
pub fn recompute(registry: &FilterRegistry, source: &dyn TabularSource) -> FilterPass {
    let started = Instant::now();
    let filter = RowFilter::new(registry, source);
    let mut diagnostics = PassDiagnostics::default();
    for &column in filter.ignored_columns() {
        diagnostics.record_ignored(column);
    }
    for &column in registry.column_order.iter().flatten() {
        if !registry.has_filters(column) {
            diagnostics.record_warning(format!("column_order lists column {column}, which has no filters"));
        }
    }

    if filter.is_unconstrained() {
        diagnostics.log();
        return FilterPass {
            diagnostics,
            ..FilterPass::unfiltered(source.row_count())
        };
    }

    let accepted: Vec<usize> = (0..source.row_count())
        .filter(|&row| filter.accepts(row, &mut diagnostics))
        .collect();
    let match_count = accepted.len();

    debug!(
        "filter pass over {} rows and columns {:?} ({} mode) took {:?}",
        source.row_count(),
        filter.columns(),
        registry.inter_mode,
        started.elapsed()
    );
    info!("{match_count} filter matches found");
    diagnostics.log();

    FilterPass {
        accepted,
        match_count,
        filtered: true,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CellValue, ColumnFilterSet, OperatorKind, Predicate, RecordTable};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::collections::BTreeMap;

    fn products() -> RecordTable {
        RecordTable::new(
            vec!["Name".into(), "Score".into()],
            vec![
                vec![CellValue::from("heat, market"), CellValue::Number(1.0)],
                vec![CellValue::from("electricity, market"), CellValue::Number(5.0)],
                vec![CellValue::from("steel"), CellValue::Number(10.0)],
            ],
        )
    }

    fn contains(needle: &str) -> Predicate {
        Predicate::text(OperatorKind::Contains, needle, false).unwrap()
    }

    #[test]
    fn empty_registry_accepts_everything() {
        let pass = recompute(&FilterRegistry::default(), &products());
        assert_eq!(pass.accepted, vec![0, 1, 2]);
        assert_eq!(pass.match_count, 3);
        assert!(!pass.filtered);
    }

    #[test]
    fn and_mode_intersects_columns() {
        let registry = FilterRegistry::new(CombineMode::And)
            .with_column(0, ColumnFilterSet::single(contains("market")))
            .with_column(1, ColumnFilterSet::single(Predicate::numeric(OperatorKind::NumericGte, 2.0).unwrap()));
        let pass = recompute(&registry, &products());
        assert_eq!(pass.accepted, vec![1]);
        assert_eq!(pass.status_line(), "1 filter matches found");
    }

    #[test]
    fn or_mode_unions_columns() {
        let registry = FilterRegistry::new(CombineMode::Or)
            .with_column(0, ColumnFilterSet::single(contains("heat")))
            .with_column(1, ColumnFilterSet::single(Predicate::numeric(OperatorKind::NumericGte, 10.0).unwrap()));
        let pass = recompute(&registry, &products());
        assert_eq!(pass.accepted, vec![0, 2]);
        assert_eq!(pass.match_count, 2);
    }

    /// Counts cell reads per column so short-circuiting can be observed.
    struct CountingSource {
        inner: RecordTable,
        reads: Vec<Cell<usize>>,
    }

    impl TabularSource for CountingSource {
        fn row_count(&self) -> usize {
            self.inner.row_count()
        }
        fn column_count(&self) -> usize {
            self.inner.column_count()
        }
        fn column_names(&self) -> Vec<String> {
            self.inner.column_names()
        }
        fn row_values(&self, row: usize) -> Vec<CellValue> {
            self.inner.row_values(row)
        }
        fn filterable_columns(&self) -> BTreeMap<String, usize> {
            self.inner.filterable_columns()
        }
        fn cell(&self, row: usize, column: usize) -> CellValue {
            self.reads[column].set(self.reads[column].get() + 1);
            self.inner.cell(row, column)
        }
    }

    #[test]
    fn and_mode_short_circuits_in_custom_order() {
        let source = CountingSource {
            inner: products(),
            reads: vec![Cell::new(0), Cell::new(0)],
        };
        let registry = FilterRegistry::new(CombineMode::And)
            .with_column(0, ColumnFilterSet::single(contains("market")))
            .with_column(1, ColumnFilterSet::single(Predicate::numeric(OperatorKind::NumericGte, 100.0).unwrap()))
            .with_column_order(vec![1, 0]);
        let pass = recompute(&registry, &source);
        assert!(pass.accepted.is_empty());
        assert_eq!(source.reads[1].get(), 3);
        assert_eq!(source.reads[0].get(), 0);
    }

    #[test]
    fn out_of_range_columns_are_ignored() {
        let registry = FilterRegistry::new(CombineMode::And)
            .with_column(0, ColumnFilterSet::single(contains("steel")))
            .with_column(7, ColumnFilterSet::single(contains("anything")));
        let pass = recompute(&registry, &products());
        assert_eq!(pass.accepted, vec![2]);
        assert!(pass.diagnostics.ignored_columns.contains(&7));
    }

    #[test]
    fn coercion_errors_do_not_abort_the_pass() {
        let registry = FilterRegistry::new(CombineMode::And)
            .with_column(0, ColumnFilterSet::single(Predicate::numeric(OperatorKind::NumericGte, 0.0).unwrap()));
        let pass = recompute(&registry, &products());
        assert!(pass.accepted.is_empty());
        assert_eq!(pass.diagnostics.coercion_failures.get(&0), Some(&3));
    }

    #[test]
    fn row_filter_can_be_queried_per_row() {
        let source = products();
        let registry = FilterRegistry::default().with_column(0, ColumnFilterSet::single(contains("steel")));
        let filter = RowFilter::new(&registry, &source);
        let mut diag = PassDiagnostics::default();
        assert!(!filter.accepts(0, &mut diag));
        assert!(filter.accepts(2, &mut diag));
    }
}
