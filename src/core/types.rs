use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::FilterError;

/// A single cell read from a tabular source, or a predicate operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Textual surrogate used by the string operators. Nulls read as `""`.
    ///
    /// Integral floats keep their decimal point (`5.0`), so a float cell reads
    /// the way it was written in the source file.
    pub fn as_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 => format!("{n:.1}"),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Numeric surrogate used by the numeric operators. Nulls read as `0.0`.
    pub fn as_number(&self) -> Result<f64, FilterError> {
        match self {
            Self::Null => Ok(0.0),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::Integer(n) => Ok(*n as f64),
            Self::Number(n) => Ok(*n),
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(0.0);
                }
                trimmed.parse::<f64>().map_err(|_| FilterError::ValueCoercion {
                    column: None,
                    value: s.clone(),
                    operator: "number",
                })
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric payload of an `Integer` or `Number` cell.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// How several results are combined: within one column or across columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombineMode {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl CombineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Fold a sequence of results. An empty sequence is `true` for both modes.
    pub fn combine<I: IntoIterator<Item = bool>>(&self, results: I) -> bool {
        let mut iter = results.into_iter().peekable();
        if iter.peek().is_none() {
            return true;
        }
        match self {
            Self::And => iter.all(|r| r),
            Self::Or => iter.any(|r| r),
        }
    }
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CombineMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(FilterError::InvalidMode(s.to_string())),
        }
    }
}

/// Which operator catalogue a column offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnKind {
    #[default]
    #[serde(rename = "str")]
    Text,
    #[serde(rename = "num")]
    Numeric,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "str",
            Self::Numeric => "num",
        }
    }
}

impl FromStr for ColumnKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" | "text" => Ok(Self::Text),
            "num" | "numeric" => Ok(Self::Numeric),
            _ => Err(FilterError::Configuration(format!("unknown column type: {s}"))),
        }
    }
}
