use crate::core::diagnostics::PassDiagnostics;
use crate::core::predicate::Predicate;
use crate::core::types::{CellValue, CombineMode};

/// All predicates for one column plus the way they are combined.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnFilterSet {
    pub predicates: Vec<Predicate>,
    /// `None` behaves as AND; only meaningful with more than one predicate.
    pub mode: Option<CombineMode>,
}

impl ColumnFilterSet {
    pub fn new(predicates: Vec<Predicate>, mode: Option<CombineMode>) -> Self {
        Self { predicates, mode }
    }

    pub fn single(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
            mode: None,
        }
    }

    pub fn effective_mode(&self) -> CombineMode {
        self.mode.unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Evaluate every predicate against `value` and combine the results.
    ///
    /// A predicate that fails coercion counts as a non-match and is recorded
    /// against `column` in `diagnostics`.
    pub fn evaluate(&self, column: usize, value: &CellValue, diagnostics: &mut PassDiagnostics) -> bool {
        let results = self.predicates.iter().map(|predicate| {
            predicate.evaluate(value).unwrap_or_else(|err| {
                diagnostics.record_coercion(column, err);
                false
            })
        });
        // Collected so every predicate runs and coercion counts stay exact.
        let results: Vec<bool> = results.collect();
        self.effective_mode().combine(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operator::OperatorKind;

    fn contains(needle: &str) -> Predicate {
        Predicate::text(OperatorKind::Contains, needle, false).unwrap()
    }

    #[test]
    fn empty_set_imposes_no_constraint() {
        let set = ColumnFilterSet::default();
        let mut diag = PassDiagnostics::default();
        assert!(set.evaluate(0, &CellValue::from("anything"), &mut diag));
    }

    #[test]
    fn unset_mode_behaves_as_and() {
        let set = ColumnFilterSet::new(vec![contains("heat"), contains("market")], None);
        let mut diag = PassDiagnostics::default();
        assert!(set.evaluate(0, &CellValue::from("heat, market"), &mut diag));
        assert!(!set.evaluate(0, &CellValue::from("heat"), &mut diag));
    }

    #[test]
    fn or_mode_accepts_any() {
        let set = ColumnFilterSet::new(
            vec![contains("heat"), contains("electricity")],
            Some(CombineMode::Or),
        );
        let mut diag = PassDiagnostics::default();
        assert!(set.evaluate(0, &CellValue::from("electricity, market"), &mut diag));
        assert!(!set.evaluate(0, &CellValue::from("steel"), &mut diag));
    }

    #[test]
    fn coercion_failure_is_non_match_and_recorded() {
        let set = ColumnFilterSet::new(
            vec![
                Predicate::numeric(OperatorKind::NumericGte, 1.0).unwrap(),
                contains("st"),
            ],
            Some(CombineMode::Or),
        );
        let mut diag = PassDiagnostics::default();
        assert!(set.evaluate(4, &CellValue::from("steel"), &mut diag));
        assert_eq!(diag.coercion_failures.get(&4), Some(&1));
    }
}
