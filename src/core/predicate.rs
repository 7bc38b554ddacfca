//! Single-column predicates and their evaluation.

use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

use crate::core::error::{FilterError, Result};
use crate::core::operator::OperatorKind;
use crate::core::types::CellValue;

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Single(CellValue),
    Range(CellValue, CellValue),
}

impl Operand {
    fn to_wire(&self) -> Value {
        match self {
            Operand::Single(v) => cell_to_json(v),
            Operand::Range(low, high) => Value::Array(vec![cell_to_json(low), cell_to_json(high)]),
        }
    }

    fn summary(&self) -> String {
        match self {
            Operand::Single(v) => v.as_text(),
            Operand::Range(low, high) => format!("{} - {}", low.as_text(), high.as_text()),
        }
    }
}

/// One operator/operand test applied to a column value.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    operator: OperatorKind,
    operand: Operand,
    case_sensitive: bool,
}

impl Predicate {
    /// Build a predicate, checking that the operand shape fits the operator.
    pub fn new(operator: OperatorKind, operand: Operand, case_sensitive: bool) -> Result<Self> {
        match (&operand, operator.is_range()) {
            (Operand::Range(low, high), true) => {
                let (lo, hi) = (
                    low.as_number().map_err(|_| range_bound_error(low))?,
                    high.as_number().map_err(|_| range_bound_error(high))?,
                );
                if lo > hi {
                    return Err(FilterError::Configuration(format!(
                        "range lower bound {lo} exceeds upper bound {hi}"
                    )));
                }
            }
            (Operand::Single(_), true) => {
                return Err(FilterError::Configuration(format!(
                    "'{operator}' needs a (low, high) operand"
                )));
            }
            (Operand::Range(..), false) => {
                return Err(FilterError::Configuration(format!(
                    "'{operator}' takes a single operand, got a range"
                )));
            }
            (Operand::Single(_), false) => {}
        }
        Ok(Self {
            operator,
            operand,
            case_sensitive,
        })
    }

    /// Textual predicate with a single operand.
    pub fn text(operator: OperatorKind, value: impl Into<String>, case_sensitive: bool) -> Result<Self> {
        Self::new(operator, Operand::Single(CellValue::Text(value.into())), case_sensitive)
    }

    /// Numeric predicate with a single operand.
    pub fn numeric(operator: OperatorKind, value: f64) -> Result<Self> {
        Self::new(operator, Operand::Single(CellValue::Number(value)), true)
    }

    /// Inclusive `low <= x <= high` predicate.
    pub fn between(low: f64, high: f64) -> Result<Self> {
        Self::new(
            OperatorKind::NumericBetween,
            Operand::Range(CellValue::Number(low), CellValue::Number(high)),
            true,
        )
    }

    pub fn operator(&self) -> OperatorKind {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Test `value` against this predicate.
    ///
    /// Fails only when a numeric operator meets a value (candidate or operand)
    /// that does not read as a number; callers treat that as a non-match.
    pub fn evaluate(&self, value: &CellValue) -> Result<bool> {
        if self.operator.is_numeric() {
            return self.evaluate_numeric(value);
        }
        let Operand::Single(operand) = &self.operand else {
            return Err(FilterError::Configuration(format!(
                "'{}' takes a single operand",
                self.operator
            )));
        };
        let (needle, hay) = if self.case_sensitive {
            (operand.as_text(), value.as_text())
        } else {
            (operand.as_text().to_lowercase(), value.as_text().to_lowercase())
        };

        let matched = match self.operator {
            OperatorKind::Equals => hay == needle,
            OperatorKind::NotEquals => hay != needle,
            OperatorKind::Contains => hay.contains(&needle),
            OperatorKind::NotContains => !hay.contains(&needle),
            OperatorKind::StartsWith => hay.starts_with(&needle),
            OperatorKind::NotStartsWith => !hay.starts_with(&needle),
            OperatorKind::EndsWith => hay.ends_with(&needle),
            OperatorKind::NotEndsWith => !hay.ends_with(&needle),
            OperatorKind::NumericEq
            | OperatorKind::NumericNeq
            | OperatorKind::NumericGte
            | OperatorKind::NumericLte
            | OperatorKind::NumericBetween => return self.evaluate_numeric(value),
        };
        Ok(matched)
    }

    fn evaluate_numeric(&self, value: &CellValue) -> Result<bool> {
        let x = self.coerce(value)?;
        let matched = match (&self.operand, self.operator) {
            (Operand::Range(low, high), OperatorKind::NumericBetween) => {
                self.coerce(low)? <= x && x <= self.coerce(high)?
            }
            (Operand::Single(operand), op) => {
                let a = self.coerce(operand)?;
                match op {
                    OperatorKind::NumericEq => x == a,
                    OperatorKind::NumericNeq => x != a,
                    OperatorKind::NumericGte => x >= a,
                    OperatorKind::NumericLte => x <= a,
                    _ => {
                        return Err(FilterError::Configuration(format!(
                            "'{op}' needs a (low, high) operand"
                        )));
                    }
                }
            }
            (Operand::Range(..), op) => {
                return Err(FilterError::Configuration(format!(
                    "'{op}' takes a single operand, got a range"
                )));
            }
        };
        Ok(matched)
    }

    fn coerce(&self, value: &CellValue) -> Result<f64> {
        value.as_number().map_err(|_| FilterError::ValueCoercion {
            column: None,
            value: value.as_text(),
            operator: self.operator.label(),
        })
    }

    /// One-line description, e.g. `contains: heat`.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.operator.label(), self.operand.summary())
    }

    /// Wire form: `[label, operand, case_sensitive]`.
    pub fn to_wire(&self) -> Value {
        Value::Array(vec![
            Value::String(self.operator.label().to_string()),
            self.operand.to_wire(),
            Value::Bool(self.case_sensitive),
        ])
    }

    /// Parse the wire form.
    ///
    /// An unknown operator label is recovered as `equals` and reported in the
    /// returned warnings. A missing case flag means case-sensitive.
    pub fn from_wire(raw: &Value) -> Result<(Self, Vec<FilterError>)> {
        let items = raw
            .as_array()
            .ok_or_else(|| FilterError::Spec(format!("predicate must be an array, got {raw}")))?;
        let (label, operand) = match items.as_slice() {
            [label, operand] | [label, operand, _] => (label, operand),
            _ => {
                return Err(FilterError::Spec(format!(
                    "predicate must have 2 or 3 elements, got {}",
                    items.len()
                )));
            }
        };
        let label = label
            .as_str()
            .ok_or_else(|| FilterError::Spec(format!("operator must be a string, got {label}")))?;
        let case_sensitive = match items.get(2) {
            None | Some(Value::Null) => true,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(FilterError::Spec(format!(
                    "case sensitivity must be a boolean, got {other}"
                )));
            }
        };

        let mut warnings = Vec::new();
        let operator = match OperatorKind::from_str(label) {
            Ok(op) => op,
            Err(err) => {
                warn!("{err}, assuming 'EQUALS'");
                warnings.push(err);
                // the fallback compares text, so a compound operand is read as its JSON text
                let operand = match operand {
                    Value::Array(_) | Value::Object(_) => Value::String(operand.to_string()),
                    scalar => scalar.clone(),
                };
                let predicate = Self::new(
                    OperatorKind::Equals,
                    Operand::Single(scalar_operand(&operand)?),
                    case_sensitive,
                )?;
                return Ok((predicate, warnings));
            }
        };

        let operand = match (operator.is_range(), operand) {
            (true, Value::Array(bounds)) if bounds.len() == 2 => {
                Operand::Range(scalar_operand(&bounds[0])?, scalar_operand(&bounds[1])?)
            }
            (true, other) => {
                return Err(FilterError::Configuration(format!(
                    "'{operator}' needs a two-element operand, got {other}"
                )));
            }
            (false, Value::Array(_) | Value::Object(_)) => {
                return Err(FilterError::Configuration(format!(
                    "'{operator}' takes a single operand, got {operand}"
                )));
            }
            (false, scalar) => Operand::Single(scalar_operand(scalar)?),
        };

        Ok((Self::new(operator, operand, case_sensitive)?, warnings))
    }
}

fn scalar_operand(raw: &Value) -> Result<CellValue> {
    match raw {
        Value::Array(_) | Value::Object(_) => Err(FilterError::Configuration(format!(
            "operand must be a string, number, boolean or null, got {raw}"
        ))),
        scalar => Ok(serde_json::from_value(scalar.clone())?),
    }
}

fn range_bound_error(bound: &CellValue) -> FilterError {
    FilterError::Configuration(format!("range bound {:?} is not a number", bound.as_text()))
}

fn cell_to_json(value: &CellValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
