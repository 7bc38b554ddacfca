//! Closed catalogue of predicate operators.
//!
//! Labels are what the editor shows and what a serialized filter spec
//! carries; kebab-case identifiers are accepted as aliases when parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};

use crate::core::error::FilterError;
use crate::core::types::ColumnKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperatorKind {
    Contains,
    NotContains,
    Equals,
    NotEquals,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    NumericEq,
    NumericNeq,
    NumericGte,
    NumericLte,
    NumericBetween,
}

impl OperatorKind {
    /// Label used by the editor and the serialized filter spec.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::NotContains => "does not contain",
            Self::Equals => "equals",
            Self::NotEquals => "does not equal",
            Self::StartsWith => "starts with",
            Self::NotStartsWith => "does not start with",
            Self::EndsWith => "ends with",
            Self::NotEndsWith => "does not end with",
            Self::NumericEq => "=",
            Self::NumericNeq => "!=",
            Self::NumericGte => ">=",
            Self::NumericLte => "<=",
            Self::NumericBetween => "<= x <=",
        }
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::NotContains => "not-contains",
            Self::Equals => "equals",
            Self::NotEquals => "not-equals",
            Self::StartsWith => "starts-with",
            Self::NotStartsWith => "not-starts-with",
            Self::EndsWith => "ends-with",
            Self::NotEndsWith => "not-ends-with",
            Self::NumericEq => "numeric-eq",
            Self::NumericNeq => "numeric-neq",
            Self::NumericGte => "numeric-gte",
            Self::NumericLte => "numeric-lte",
            Self::NumericBetween => "numeric-between",
        }
    }

    /// Long-form description shown as a tooltip next to the label.
    pub fn tooltip(&self) -> &'static str {
        match self {
            Self::Contains => "values in the column contain",
            Self::NotContains => "values in the column do not contain",
            Self::Equals | Self::NumericEq => "values in the column equal",
            Self::NotEquals | Self::NumericNeq => "values in the column do not equal",
            Self::StartsWith => "values in the column start with",
            Self::NotStartsWith => "values in the column do not start with",
            Self::EndsWith => "values in the column end with",
            Self::NotEndsWith => "values in the column do not end with",
            Self::NumericGte => "values in the column are greater than or equal to",
            Self::NumericLte => "values in the column are smaller than or equal to",
            Self::NumericBetween => "values in the column are between",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::NumericEq
                | Self::NumericNeq
                | Self::NumericGte
                | Self::NumericLte
                | Self::NumericBetween
        )
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Self::NumericBetween)
    }

    /// Operators offered for a column of the given kind, in menu order.
    pub fn for_column(kind: ColumnKind) -> Vec<OperatorKind> {
        match kind {
            ColumnKind::Text => vec![
                Self::Contains,
                Self::NotContains,
                Self::Equals,
                Self::NotEquals,
                Self::StartsWith,
                Self::NotStartsWith,
                Self::EndsWith,
                Self::NotEndsWith,
            ],
            ColumnKind::Numeric => Self::iter().filter(|op| op.is_numeric()).collect(),
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for OperatorKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::iter()
            .find(|op| op.label() == needle || op.identifier() == needle)
            .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn labels_and_identifiers_parse_back() {
        for op in OperatorKind::iter() {
            assert_eq!(OperatorKind::from_str(op.label()).unwrap(), op);
            assert_eq!(OperatorKind::from_str(op.identifier()).unwrap(), op);
        }
    }

    #[test]
    fn labels_are_unique() {
        let labels: HashSet<_> = OperatorKind::iter().map(|op| op.label()).collect();
        assert_eq!(labels.len(), OperatorKind::iter().count());
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = OperatorKind::from_str("bogus").unwrap_err();
        assert!(matches!(err, FilterError::UnknownOperator(ref s) if s == "bogus"));
    }

    #[test]
    fn catalogues_split_by_kind() {
        let text = OperatorKind::for_column(ColumnKind::Text);
        let num = OperatorKind::for_column(ColumnKind::Numeric);
        assert_eq!(text.len(), 8);
        assert_eq!(
            num.iter().map(|op| op.label()).collect::<Vec<_>>(),
            vec!["=", "!=", ">=", "<=", "<= x <="]
        );
        assert!(text.iter().all(|op| !op.is_numeric()));
    }
}
