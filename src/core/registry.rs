//! FilterRegistry: the full cross-column filter specification.
//!
//! The registry is persisted in the document form used by the filter editor:
//!
//! ```json
//! {
//!   "mode": "AND",
//!   "0": { "filters": [["contains", "heat", false], ["contains", "electricity", false]], "mode": "OR" },
//!   "3": { "filters": [["<= x <=", [2.0, 8.0]]] },
//!   "column_order": [3, 0]
//! }
//! ```
//!
//! Column keys are integers written as strings; `column_order` is optional.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::Path;
use tracing::warn;

use crate::core::column_filter::ColumnFilterSet;
use crate::core::error::{FilterError, Result};
use crate::core::predicate::Predicate;
use crate::core::types::CombineMode;

const MODE_KEY: &str = "mode";
const FILTERS_KEY: &str = "filters";
const ORDER_KEY: &str = "column_order";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct FilterRegistry {
    /// How column verdicts are combined.
    pub inter_mode: CombineMode,
    per_column: BTreeMap<usize, ColumnFilterSet>,
    /// Columns to evaluate first, most selective first.
    pub column_order: Option<Vec<usize>>,
}

/// A registry parsed from a document together with the problems that were
/// recovered on the way.
#[derive(Debug)]
pub struct ParsedSpec {
    pub registry: FilterRegistry,
    pub warnings: Vec<FilterError>,
}

/// Columns to evaluate for one pass, and registry columns the source lacks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EvaluationOrder {
    pub columns: Vec<usize>,
    pub out_of_range: Vec<usize>,
}

impl FilterRegistry {
    pub fn new(inter_mode: CombineMode) -> Self {
        Self {
            inter_mode,
            ..Self::default()
        }
    }

    /// Builder-style helper used by the editor and tests.
    pub fn with_column(mut self, column: usize, set: ColumnFilterSet) -> Self {
        self.per_column.insert(column, set);
        self
    }

    pub fn with_column_order(mut self, order: Vec<usize>) -> Self {
        self.column_order = Some(order);
        self
    }

    /// Quick-add a predicate to `column`.
    ///
    /// Appending a second predicate to a column without an explicit mode
    /// switches that column to OR.
    pub fn add_predicate(&mut self, column: usize, predicate: Predicate) {
        match self.per_column.get_mut(&column) {
            Some(set) if !set.is_empty() => {
                set.predicates.push(predicate);
                if set.mode.is_none() && set.len() > 1 {
                    set.mode = Some(CombineMode::Or);
                }
            }
            _ => {
                self.per_column.insert(column, ColumnFilterSet::single(predicate));
            }
        }
    }

    /// Set or overwrite one column's filter set verbatim.
    pub fn set_column(&mut self, column: usize, set: ColumnFilterSet) {
        self.per_column.insert(column, set);
    }

    /// Replace everything with `other`.
    pub fn replace_filters(&mut self, other: FilterRegistry) {
        *self = other;
    }

    pub fn remove_column(&mut self, column: usize) -> Option<ColumnFilterSet> {
        self.per_column.remove(&column)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn column(&self, column: usize) -> Option<&ColumnFilterSet> {
        self.per_column.get(&column)
    }

    pub fn column_mut(&mut self, column: usize) -> Option<&mut ColumnFilterSet> {
        self.per_column.get_mut(&column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (usize, &ColumnFilterSet)> {
        self.per_column.iter().map(|(c, s)| (*c, s))
    }

    /// Columns that currently constrain rows, ascending.
    pub fn active_columns(&self) -> Vec<usize> {
        self.per_column
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(c, _)| *c)
            .collect()
    }

    pub fn has_filters(&self, column: usize) -> bool {
        self.per_column.get(&column).is_some_and(|set| !set.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.per_column.values().all(ColumnFilterSet::is_empty)
    }

    /// Drop columns whose filter set has no predicates left.
    pub fn prune(&mut self) {
        self.per_column.retain(|_, set| !set.is_empty());
    }

    /// Order in which active columns are evaluated against a source with
    /// `column_count` columns.
    ///
    /// `column_order` entries come first, then every other active column in
    /// ascending order. Columns the source does not have are reported
    /// separately and never evaluated.
    pub fn evaluation_order(&self, column_count: usize) -> EvaluationOrder {
        let active = self.active_columns();
        let mut seen = HashSet::new();
        let mut order = EvaluationOrder::default();

        let preferred = self.column_order.iter().flatten().copied();
        for column in preferred.chain(active.iter().copied()) {
            if !self.has_filters(column) || !seen.insert(column) {
                continue;
            }
            if column < column_count {
                order.columns.push(column);
            } else {
                order.out_of_range.push(column);
            }
        }
        order
    }

    /// Document form of this registry.
    pub fn to_spec(&self) -> Value {
        let mut doc = Map::new();
        doc.insert(MODE_KEY.into(), Value::String(self.inter_mode.as_str().into()));
        for (column, set) in &self.per_column {
            let mut entry = Map::new();
            entry.insert(
                FILTERS_KEY.into(),
                Value::Array(set.predicates.iter().map(Predicate::to_wire).collect()),
            );
            if let Some(mode) = set.mode {
                entry.insert(MODE_KEY.into(), Value::String(mode.as_str().into()));
            }
            doc.insert(column.to_string(), Value::Object(entry));
        }
        if let Some(order) = &self.column_order {
            doc.insert(ORDER_KEY.into(), Value::from(order.clone()));
        }
        Value::Object(doc)
    }

    /// Parse the document form, recovering what can be recovered.
    ///
    /// A missing or invalid inter-column mode becomes AND and an unknown
    /// operator becomes `equals`; both are returned as warnings.
    pub fn from_spec(doc: &Value) -> Result<ParsedSpec> {
        let obj = doc
            .as_object()
            .ok_or_else(|| FilterError::Spec(format!("expected an object, got {doc}")))?;
        let mut warnings = Vec::new();

        let inter_mode = match obj.get(MODE_KEY) {
            Some(raw) => parse_mode(raw).unwrap_or_else(|err| {
                warn!("{err}, assuming 'AND'");
                warnings.push(err);
                CombineMode::And
            }),
            None => {
                warn!("missing filter mode, assuming 'AND'");
                warnings.push(FilterError::Configuration(
                    "missing filter mode, assuming 'AND'".to_string(),
                ));
                CombineMode::And
            }
        };

        let column_order = match obj.get(ORDER_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|item| {
                        item.as_u64().map(|c| c as usize).ok_or_else(|| {
                            FilterError::Spec(format!("column_order entries must be indices, got {item}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(other) => {
                return Err(FilterError::Spec(format!("column_order must be an array, got {other}")));
            }
        };

        let mut registry = FilterRegistry {
            inter_mode,
            per_column: BTreeMap::new(),
            column_order,
        };

        for (key, entry) in obj {
            if key == MODE_KEY || key == ORDER_KEY {
                continue;
            }
            let Ok(column) = key.trim().parse::<usize>() else {
                warn!("ignoring unknown filter key '{key}'");
                warnings.push(FilterError::Configuration(format!("ignoring unknown filter key '{key}'")));
                continue;
            };
            let entry = entry
                .as_object()
                .ok_or_else(|| FilterError::Spec(format!("column {column} entry must be an object")))?;
            let raw_filters = match entry.get(FILTERS_KEY) {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(FilterError::Spec(format!(
                        "column {column} entry needs a '{FILTERS_KEY}' array"
                    )));
                }
            };

            let mut predicates = Vec::with_capacity(raw_filters.len());
            for raw in raw_filters {
                match Predicate::from_wire(raw) {
                    Ok((predicate, mut recovered)) => {
                        predicates.push(predicate);
                        warnings.append(&mut recovered);
                    }
                    Err(FilterError::Configuration(msg)) => {
                        warn!("skipping filter {raw} on column {column}: {msg}");
                        warnings.push(FilterError::Configuration(format!("column {column}: {msg}")));
                    }
                    Err(err) => return Err(err),
                }
            }

            let mode = match entry.get(MODE_KEY) {
                None | Some(Value::Null) => None,
                Some(raw) => match parse_mode(raw) {
                    Ok(mode) => Some(mode),
                    Err(err) => {
                        warn!("{err} for column {column}, assuming 'AND'");
                        warnings.push(err);
                        None
                    }
                },
            };
            registry.per_column.insert(column, ColumnFilterSet::new(predicates, mode));
        }

        Ok(ParsedSpec { registry, warnings })
    }

    /// Save the registry to a file as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &self.to_spec())?;
        Ok(())
    }

    /// Load a registry saved with [`FilterRegistry::save_to_file`].
    pub fn load_from_file(path: &Path) -> Result<ParsedSpec> {
        let file = File::open(path)?;
        let doc: Value = serde_json::from_reader(file)?;
        Self::from_spec(&doc)
    }
}

fn parse_mode(raw: &Value) -> Result<CombineMode> {
    match raw {
        Value::String(s) => s.parse(),
        other => Err(FilterError::InvalidMode(other.to_string())),
    }
}

impl TryFrom<Value> for FilterRegistry {
    type Error = FilterError;

    fn try_from(doc: Value) -> Result<Self> {
        Self::from_spec(&doc).map(|parsed| parsed.registry)
    }
}

impl From<FilterRegistry> for Value {
    fn from(registry: FilterRegistry) -> Self {
        registry.to_spec()
    }
}
