//! FilterEditor: working copy of the registry behind the "manage filters"
//! dialog. Nothing reaches the view until [`FilterEditor::accept`].

use std::path::Path;
use tracing::warn;

use crate::core::{
    ColumnFilterSet, ColumnKind, CombineMode, FilterError, FilterRegistry, Predicate,
};

/// A column the editor may attach predicates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorColumn {
    pub index: usize,
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone)]
pub struct FilterEditor {
    columns: Vec<EditorColumn>,
    column_count: usize,
    registry: FilterRegistry,
}

impl FilterEditor {
    /// `column_count` is the width of the source; `columns` the filterable
    /// subset of it.
    pub fn new(columns: Vec<EditorColumn>, column_count: usize, registry: FilterRegistry) -> Self {
        Self {
            columns,
            column_count,
            registry,
        }
    }

    pub fn columns(&self) -> &[EditorColumn] {
        &self.columns
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn inter_mode(&self) -> CombineMode {
        self.registry.inter_mode
    }

    pub fn set_inter_mode(&mut self, mode: CombineMode) {
        self.registry.inter_mode = mode;
    }

    fn check_column(&self, column: usize) -> Result<(), FilterError> {
        if self.columns.iter().any(|c| c.index == column) {
            Ok(())
        } else {
            Err(FilterError::OutOfRange {
                column,
                column_count: self.column_count,
            })
        }
    }

    /// Append a predicate without touching the column mode.
    pub fn add_predicate(&mut self, column: usize, predicate: Predicate) -> Result<(), FilterError> {
        self.check_column(column)?;
        match self.registry.column_mut(column) {
            Some(set) => set.predicates.push(predicate),
            None => self.registry.set_column(column, ColumnFilterSet::single(predicate)),
        }
        Ok(())
    }

    /// Replace the predicate at `position` in `column`.
    pub fn replace_predicate(&mut self, column: usize, position: usize, predicate: Predicate) -> Result<(), FilterError> {
        self.check_column(column)?;
        let slot = self
            .registry
            .column_mut(column)
            .and_then(|set| set.predicates.get_mut(position))
            .ok_or_else(|| FilterError::Configuration(format!("column {column} has no filter #{position}")))?;
        *slot = predicate;
        Ok(())
    }

    pub fn remove_predicate(&mut self, column: usize, position: usize) -> Result<Predicate, FilterError> {
        let set = self
            .registry
            .column_mut(column)
            .filter(|set| position < set.len())
            .ok_or_else(|| FilterError::Configuration(format!("column {column} has no filter #{position}")))?;
        Ok(set.predicates.remove(position))
    }

    pub fn set_column_mode(&mut self, column: usize, mode: CombineMode) -> Result<(), FilterError> {
        self.check_column(column)?;
        match self.registry.column_mut(column) {
            Some(set) => set.mode = Some(mode),
            None => self.registry.set_column(column, ColumnFilterSet::new(Vec::new(), Some(mode))),
        }
        Ok(())
    }

    pub fn clear_column(&mut self, column: usize) {
        self.registry.remove_column(column);
    }

    pub fn clear_all(&mut self) {
        let mode = self.registry.inter_mode;
        self.registry.reset();
        self.registry.inter_mode = mode;
    }

    /// `None` restores ascending-index evaluation.
    pub fn set_column_order(&mut self, order: Option<Vec<usize>>) -> Result<(), FilterError> {
        if let Some(order) = &order {
            for &column in order {
                self.check_column(column)?;
            }
        }
        self.registry.column_order = order;
        Ok(())
    }

    /// One line per filtered column, e.g. `Name [OR]: contains: heat; contains: gas`.
    pub fn summary_lines(&self) -> Vec<String> {
        self.registry
            .columns()
            .filter(|(_, set)| !set.is_empty())
            .map(|(column, set)| {
                let name = self
                    .columns
                    .iter()
                    .find(|c| c.index == column)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| format!("#{column}"));
                let filters: Vec<String> = set.predicates.iter().map(Predicate::summary).collect();
                format!("{name} [{}]: {}", set.effective_mode(), filters.join("; "))
            })
            .collect()
    }

    /// Save the working copy as a filter document.
    pub fn save_to_file(&self, path: &Path) -> Result<(), FilterError> {
        self.registry.save_to_file(path)
    }

    /// Replace the working copy with a saved document.
    ///
    /// Columns this table does not offer are dropped; recovered problems are
    /// returned for display.
    pub fn load_from_file(&mut self, path: &Path) -> Result<Vec<FilterError>, FilterError> {
        let parsed = FilterRegistry::load_from_file(path)?;
        let mut warnings = parsed.warnings;
        let mut registry = parsed.registry;
        let unknown: Vec<usize> = registry
            .columns()
            .map(|(column, _)| column)
            .filter(|column| self.check_column(*column).is_err())
            .collect();
        for column in unknown {
            warn!("dropping filters for unknown column {column} from {}", path.display());
            registry.remove_column(column);
            warnings.push(FilterError::OutOfRange {
                column,
                column_count: self.column_count,
            });
        }
        if let Some(order) = registry.column_order.as_mut() {
            order.retain(|column| self.check_column(*column).is_ok());
        }
        self.registry = registry;
        Ok(warnings)
    }

    /// Finish editing. Empty columns are dropped and any column holding
    /// several predicates gets an explicit mode.
    pub fn accept(self) -> FilterRegistry {
        let mut registry = self.registry;
        registry.prune();
        let multi: Vec<usize> = registry
            .columns()
            .filter(|(_, set)| set.len() > 1 && set.mode.is_none())
            .map(|(column, _)| column)
            .collect();
        for column in multi {
            if let Some(set) = registry.column_mut(column) {
                set.mode = Some(CombineMode::And);
            }
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OperatorKind;
    use pretty_assertions::assert_eq;

    fn editor() -> FilterEditor {
        let columns = vec![
            EditorColumn { index: 0, name: "Name".into(), kind: ColumnKind::Text },
            EditorColumn { index: 2, name: "Score".into(), kind: ColumnKind::Numeric },
        ];
        FilterEditor::new(columns, 3, FilterRegistry::default())
    }

    fn contains(needle: &str) -> Predicate {
        Predicate::text(OperatorKind::Contains, needle, false).unwrap()
    }

    #[test]
    fn test_unknown_columns_are_rejected() {
        let mut ed = editor();
        assert!(matches!(
            ed.add_predicate(1, contains("x")),
            Err(FilterError::OutOfRange { column: 1, column_count: 3 })
        ));
        assert!(ed.set_column_order(Some(vec![2, 5])).is_err());
    }

    #[test]
    fn test_accept_makes_modes_explicit_and_prunes() {
        let mut ed = editor();
        ed.add_predicate(0, contains("heat")).unwrap();
        ed.add_predicate(0, contains("market")).unwrap();
        ed.set_column_mode(2, CombineMode::Or).unwrap();
        ed.set_inter_mode(CombineMode::Or);

        let registry = ed.accept();
        assert_eq!(registry.inter_mode, CombineMode::Or);
        assert_eq!(registry.column(0).unwrap().mode, Some(CombineMode::And));
        assert!(registry.column(2).is_none());
    }

    #[test]
    fn test_edit_and_remove() {
        let mut ed = editor();
        ed.add_predicate(0, contains("heat")).unwrap();
        ed.replace_predicate(0, 0, contains("steel")).unwrap();
        assert!(ed.replace_predicate(0, 3, contains("x")).is_err());
        assert_eq!(ed.summary_lines(), vec!["Name [AND]: contains: steel".to_string()]);

        let removed = ed.remove_predicate(0, 0).unwrap();
        assert_eq!(removed, contains("steel"));
        assert!(ed.summary_lines().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");
        let mut ed = editor();
        ed.add_predicate(2, Predicate::between(1.0, 4.0).unwrap()).unwrap();
        ed.save_to_file(&path).unwrap();

        let mut other = editor();
        let warnings = other.load_from_file(&path).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(other.registry(), ed.registry());
    }

    #[test]
    fn test_load_drops_unknown_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");
        std::fs::write(
            &path,
            r#"{"mode": "AND", "0": {"filters": [["equals", "a", true]]}, "7": {"filters": [["equals", "b", true]]}, "column_order": [7, 0]}"#,
        )
        .unwrap();
        let mut ed = editor();
        let warnings = ed.load_from_file(&path).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(ed.registry().active_columns(), vec![0]);
        assert_eq!(ed.registry().column_order, Some(vec![0]));
    }
}
