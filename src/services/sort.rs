//! Multi-key row ordering over a tabular source.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display};

use crate::core::{CellValue, TabularSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }

    /// Arrow shown next to a sorted column label.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Ascending => "↑",
            Self::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        write!(f, "{}: {}", self.column, dir)
    }
}

fn type_rank(value: &CellValue) -> u8 {
    match value {
        CellValue::Integer(_) | CellValue::Number(_) => 0,
        CellValue::Text(_) => 1,
        CellValue::Bool(_) => 2,
        CellValue::Null => 3,
    }
}

/// Total order over cells: numbers, then text, then booleans, then nulls.
/// NaN sorts after every other number. Text compares case-insensitively,
/// with the exact string breaking ties.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    if let (Some(x), Some(y)) = (a.numeric(), b.numeric()) {
        return match (x.is_nan(), y.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => x.total_cmp(&y),
        };
    }
    match (a, b) {
        (CellValue::Text(x), CellValue::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (CellValue::Bool(x), CellValue::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn sorts_last(value: &CellValue) -> bool {
    match value {
        CellValue::Null => true,
        CellValue::Number(n) => n.is_nan(),
        _ => false,
    }
}

/// Compare under one key. Nulls and NaN stay last whatever the direction.
fn compare_for_key(a: &CellValue, b: &CellValue, direction: SortDirection) -> Ordering {
    match (sorts_last(a), sorts_last(b)) {
        (true, true) => compare_cells(a, b),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => direction.apply(compare_cells(a, b)),
    }
}

/// Stable sort of `rows` (indices into `source`) by `keys`, first key most
/// significant. Rows equal under every key keep their relative order.
pub fn sort_rows(rows: &mut [usize], source: &dyn TabularSource, keys: &[SortKey]) {
    if keys.is_empty() || rows.len() < 2 {
        return;
    }
    let mut keyed: Vec<(usize, Vec<CellValue>)> = rows
        .iter()
        .map(|&row| (row, keys.iter().map(|k| source.cell(row, k.column)).collect()))
        .collect();
    keyed.sort_by(|(_, a), (_, b)| {
        keys.iter()
            .zip(a.iter().zip(b.iter()))
            .map(|(key, (x, y))| compare_for_key(x, y, key.direction))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    for (slot, (row, _)) in rows.iter_mut().zip(keyed) {
        *slot = row;
    }
}

/// Current sort keys as driven by header label clicks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    keys: Vec<SortKey>,
}

impl SortState {
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_sorted(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn direction_of(&self, column: usize) -> Option<SortDirection> {
        self.keys.iter().find(|k| k.column == column).map(|k| k.direction)
    }

    /// Clicking the primary column flips it; any other column becomes the
    /// primary key ascending, keeping the others as tie-breakers.
    pub fn toggle(&mut self, column: usize) {
        if let Some(first) = self.keys.first_mut().filter(|k| k.column == column) {
            first.direction = first.direction.toggled();
            return;
        }
        self.keys.retain(|k| k.column != column);
        self.keys.insert(0, SortKey::ascending(column));
    }

    pub fn set(&mut self, keys: Vec<SortKey>) {
        self.keys = keys;
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
