//! QuickFilterDraft: state behind the one-predicate popup opened from a
//! column's filter button.

use crate::core::{ColumnKind, FilterError, OperatorKind, Predicate};

#[derive(Debug, Clone, PartialEq)]
pub struct QuickFilterDraft {
    column: usize,
    column_name: String,
    kind: ColumnKind,
    pub operator: OperatorKind,
    pub value: String,
    /// Upper bound, only read by the range operator.
    pub upper: String,
    pub case_sensitive: bool,
}

impl QuickFilterDraft {
    /// Start a draft for `column`, preselecting `preset` when the header menu
    /// offered one.
    pub fn new(
        column: usize,
        column_name: impl Into<String>,
        kind: ColumnKind,
        preset: Option<OperatorKind>,
        case_sensitive: bool,
    ) -> Self {
        let operators = OperatorKind::for_column(kind);
        let operator = preset
            .filter(|op| operators.contains(op))
            .or_else(|| operators.first().copied())
            .unwrap_or(OperatorKind::Contains);
        Self {
            column,
            column_name: column_name.into(),
            kind,
            operator,
            value: String::new(),
            upper: String::new(),
            case_sensitive,
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Operators offered for this column.
    pub fn operators(&self) -> Vec<OperatorKind> {
        OperatorKind::for_column(self.kind)
    }

    pub fn next_operator(&mut self) {
        let cycle = self.operators();
        let idx = cycle.iter().position(|op| *op == self.operator).unwrap_or(0);
        self.operator = cycle[(idx + 1) % cycle.len()];
    }

    pub fn prev_operator(&mut self) {
        let cycle = self.operators();
        let idx = cycle.iter().position(|op| *op == self.operator).unwrap_or(0);
        self.operator = if idx == 0 { cycle[cycle.len() - 1] } else { cycle[idx - 1] };
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_range(mut self, low: impl Into<String>, high: impl Into<String>) -> Self {
        self.value = low.into();
        self.upper = high.into();
        self
    }

    /// Turn the draft into a predicate. Numeric operands are parsed here so a
    /// typo is reported before anything touches the registry.
    pub fn build(&self) -> Result<Predicate, FilterError> {
        if self.value.trim().is_empty() {
            return Err(FilterError::Configuration(format!(
                "a value is required for '{}'",
                self.operator.label()
            )));
        }
        if self.operator.is_range() {
            let low = self.parse_number(&self.value)?;
            let high = self.parse_number(&self.upper)?;
            Predicate::between(low, high)
        } else if self.operator.is_numeric() {
            Predicate::numeric(self.operator, self.parse_number(&self.value)?)
        } else {
            Predicate::text(self.operator, self.value.clone(), self.case_sensitive)
        }
    }

    fn parse_number(&self, raw: &str) -> Result<f64, FilterError> {
        raw.trim().parse::<f64>().map_err(|_| FilterError::ValueCoercion {
            column: Some(self.column),
            value: raw.to_string(),
            operator: self.operator.label(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CellValue, Operand};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_preset_must_fit_the_column() {
        let draft = QuickFilterDraft::new(0, "Name", ColumnKind::Text, Some(OperatorKind::NumericGte), false);
        assert_eq!(draft.operator, OperatorKind::Contains);

        let draft = QuickFilterDraft::new(1, "Score", ColumnKind::Numeric, Some(OperatorKind::NumericBetween), false);
        assert_eq!(draft.operator, OperatorKind::NumericBetween);
    }

    #[test]
    fn test_operator_cycle_wraps() {
        let mut draft = QuickFilterDraft::new(1, "Score", ColumnKind::Numeric, None, false);
        let first = draft.operator;
        draft.prev_operator();
        assert_eq!(draft.operator, OperatorKind::NumericBetween);
        draft.next_operator();
        assert_eq!(draft.operator, first);
    }

    #[test]
    fn test_build_text_predicate() {
        let predicate = QuickFilterDraft::new(0, "Name", ColumnKind::Text, None, false)
            .with_value("HEAT")
            .build()
            .unwrap();
        assert_eq!(predicate.operator(), OperatorKind::Contains);
        assert!(predicate.evaluate(&CellValue::from("district heat")).unwrap());
    }

    #[test]
    fn test_build_range_predicate() {
        let predicate = QuickFilterDraft::new(3, "Score", ColumnKind::Numeric, Some(OperatorKind::NumericBetween), false)
            .with_range("2", " 8 ")
            .build()
            .unwrap();
        assert_eq!(
            predicate.operand(),
            &Operand::Range(CellValue::Number(2.0), CellValue::Number(8.0))
        );
    }

    #[test]
    fn test_build_rejects_bad_input() {
        let empty = QuickFilterDraft::new(0, "Name", ColumnKind::Text, None, false);
        assert!(matches!(empty.build(), Err(FilterError::Configuration(_))));

        let typo = QuickFilterDraft::new(2, "Score", ColumnKind::Numeric, Some(OperatorKind::NumericLte), false)
            .with_value("1O");
        assert!(matches!(
            typo.build(),
            Err(FilterError::ValueCoercion { column: Some(2), .. })
        ));
    }
}
