//! FilterView: the controller tying a data source, its filter registry, the
//! header control and the sort order together.
//!
//! Every mutation of the registry goes through this type, which keeps the
//! header markers and the visible row list in step with it.
//!
//! `FilterView` is not thread-safe. It holds no locks and its boxed busy
//! indicator is not `Send`, so it lives on the thread that created it.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{
    ColumnKind, CombineMode, FilterError, FilterRegistry, OperatorKind, TabularSource,
};
use crate::dialog::filter_editor::{EditorColumn, FilterEditor};
use crate::dialog::quick_filter::QuickFilterDraft;
use crate::services::filter_engine::{self, FilterPass};
use crate::services::sort::{self, SortKey, SortState};
use crate::tui::header::{FilterHeader, HeaderEvent, HeaderInteraction};
use crate::tui::theme::Theme;
use crossterm::event::MouseButton;

/// Rows sampled when fitting column widths.
const WIDTH_SAMPLE_ROWS: usize = 200;

/// Shown while a filtering pass runs.
pub trait BusyIndicator {
    fn begin(&mut self, _message: &str) {}
    fn end(&mut self) {}
}

/// Indicator that shows nothing.
#[derive(Debug, Default)]
pub struct NoBusyIndicator;

impl BusyIndicator for NoBusyIndicator {}

/// Menu offered by a column's filter button.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMenu {
    pub column: usize,
    pub column_name: String,
    /// Operators offered as one-click entries.
    pub presets: Vec<OperatorKind>,
    /// Summaries of the filters already on this column.
    pub active_filters: Vec<String>,
    pub can_remove_column: bool,
    pub can_remove_all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddFilter,
    AddPreset(OperatorKind),
    ManageFilters,
    RemoveColumnFilters,
    RemoveAllFilters,
}

/// What the caller has to do after a menu choice.
#[derive(Debug, Clone)]
pub enum MenuOutcome {
    /// Show the quick filter popup for this draft.
    QuickFilter(QuickFilterDraft),
    /// Show the filter manager for this working copy.
    FilterManager(FilterEditor),
    /// Filters were changed and reapplied.
    Applied,
}

pub struct FilterView<S: TabularSource> {
    source: S,
    column_names: Vec<String>,
    column_kinds: Vec<ColumnKind>,
    filterable: BTreeMap<String, usize>,
    registry: Option<FilterRegistry>,
    header: FilterHeader,
    sort: SortState,
    last_pass: FilterPass,
    visible: Vec<usize>,
    selected_column: Option<usize>,
    default_inter_mode: CombineMode,
    default_column_order: Option<Vec<usize>>,
    quick_filter_case_sensitive: bool,
    kind_overrides: BTreeMap<String, ColumnKind>,
    busy: Box<dyn BusyIndicator>,
}

impl<S: TabularSource> FilterView<S> {
    pub fn new(source: S) -> Self {
        let row_count = source.row_count();
        let mut view = Self {
            source,
            column_names: Vec::new(),
            column_kinds: Vec::new(),
            filterable: BTreeMap::new(),
            registry: None,
            header: FilterHeader::default(),
            sort: SortState::default(),
            last_pass: FilterPass::unfiltered(row_count),
            visible: Vec::new(),
            selected_column: None,
            default_inter_mode: CombineMode::And,
            default_column_order: None,
            quick_filter_case_sensitive: false,
            kind_overrides: BTreeMap::new(),
            busy: Box::new(NoBusyIndicator),
        };
        view.load_columns();
        view.refresh_order();
        view
    }

    /// Apply the `[filter]` and `column_types` sections of the configuration.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.default_inter_mode = config.filter.default_inter_mode;
        self.default_column_order = config.filter.column_order.clone();
        self.quick_filter_case_sensitive = config.filter.quick_filter_case_sensitive;
        self.kind_overrides = config
            .column_types
            .iter()
            .map(|(name, kind)| (name.to_lowercase(), *kind))
            .collect();
        self.load_columns();
        self.refresh_order();
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.header = std::mem::take(&mut self.header).with_theme(theme);
        self
    }

    pub fn with_busy_indicator(mut self, busy: impl BusyIndicator + 'static) -> Self {
        self.busy = Box::new(busy);
        self
    }

    fn load_columns(&mut self) {
        self.column_names = self.source.column_names();
        self.filterable = self.source.filterable_columns();
        let mut kinds = self.source.column_kinds();
        kinds.resize(self.column_names.len(), ColumnKind::Text);
        for (name, kind) in self.column_names.iter().zip(kinds.iter_mut()) {
            if let Some(forced) = self.kind_overrides.get(&name.to_lowercase()) {
                *kind = *forced;
            }
        }
        self.column_kinds = kinds;
        self.header
            .set_columns(self.column_names.clone(), self.filterable.values().copied());
        self.sync_header();
    }

    /// Swap the underlying data. Filters stay; columns the new source lacks
    /// are ignored by subsequent passes.
    pub fn replace_source(&mut self, source: S) {
        self.source = source;
        self.load_columns();
        self.apply_filters();
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn registry(&self) -> Option<&FilterRegistry> {
        self.registry.as_ref()
    }

    pub fn header(&self) -> &FilterHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut FilterHeader {
        &mut self.header
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    pub fn column_kind(&self, column: usize) -> ColumnKind {
        self.column_kinds.get(column).copied().unwrap_or_default()
    }

    pub fn is_filterable(&self, column: usize) -> bool {
        self.filterable.values().any(|&c| c == column)
    }

    pub fn selected_column(&self) -> Option<usize> {
        self.selected_column
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        self.sort.keys()
    }

    pub fn last_pass(&self) -> &FilterPass {
        &self.last_pass
    }

    /// Row indices to display, filtered and sorted.
    pub fn visible_rows(&self) -> &[usize] {
        &self.visible
    }

    pub fn match_count(&self) -> usize {
        self.last_pass.match_count
    }

    pub fn status_line(&self) -> String {
        self.last_pass.status_line()
    }

    fn check_filterable(&self, column: usize) -> Result<(), FilterError> {
        if self.is_filterable(column) {
            Ok(())
        } else {
            Err(FilterError::OutOfRange {
                column,
                column_count: self.column_names.len(),
            })
        }
    }

    fn column_name(&self, column: usize) -> String {
        self.column_names
            .get(column)
            .cloned()
            .unwrap_or_else(|| format!("#{column}"))
    }

    /// React to a click on the header. A left click on a filter button opens
    /// that column's menu; a left click on a label toggles sorting.
    pub fn header_event(&mut self, event: HeaderEvent) -> Option<HeaderMenu> {
        match event.interaction {
            HeaderInteraction::FilterButton(MouseButton::Left) => {
                let menu = self.header_menu(event.column).ok()?;
                self.selected_column = Some(event.column);
                Some(menu)
            }
            HeaderInteraction::Label(MouseButton::Left) => {
                self.toggle_sort(event.column);
                None
            }
            _ => None,
        }
    }

    pub fn header_menu(&self, column: usize) -> Result<HeaderMenu, FilterError> {
        self.check_filterable(column)?;
        let active_filters = self
            .registry
            .as_ref()
            .and_then(|r| r.column(column))
            .map(|set| set.predicates.iter().map(|p| p.summary()).collect())
            .unwrap_or_default();
        Ok(HeaderMenu {
            column,
            column_name: self.column_name(column),
            presets: OperatorKind::for_column(self.column_kind(column)),
            can_remove_column: self.registry.as_ref().is_some_and(|r| r.has_filters(column)),
            can_remove_all: self.registry.as_ref().is_some_and(|r| !r.is_empty()),
            active_filters,
        })
    }

    /// Carry out a choice from the menu of `column`.
    pub fn menu_action(&mut self, column: usize, action: MenuAction) -> Result<MenuOutcome, FilterError> {
        match action {
            MenuAction::AddFilter => self.quick_filter_draft(column, None).map(MenuOutcome::QuickFilter),
            MenuAction::AddPreset(op) => self.quick_filter_draft(column, Some(op)).map(MenuOutcome::QuickFilter),
            MenuAction::ManageFilters => Ok(MenuOutcome::FilterManager(self.filter_manager())),
            MenuAction::RemoveColumnFilters => {
                self.reset_column_filters(column)?;
                Ok(MenuOutcome::Applied)
            }
            MenuAction::RemoveAllFilters => {
                self.reset_filters();
                Ok(MenuOutcome::Applied)
            }
        }
    }

    pub fn quick_filter_draft(&self, column: usize, preset: Option<OperatorKind>) -> Result<QuickFilterDraft, FilterError> {
        self.check_filterable(column)?;
        Ok(QuickFilterDraft::new(
            column,
            self.column_name(column),
            self.column_kind(column),
            preset,
            self.quick_filter_case_sensitive,
        ))
    }

    /// Add the draft's predicate to its column and reapply.
    pub fn apply_quick_filter(&mut self, draft: &QuickFilterDraft) -> Result<&FilterPass, FilterError> {
        let predicate = draft.build()?;
        self.check_filterable(draft.column())?;
        let inter_mode = self.default_inter_mode;
        let column_order = self.default_column_order.clone();
        let registry = self.registry.get_or_insert_with(|| {
            let mut fresh = FilterRegistry::new(inter_mode);
            fresh.column_order = column_order;
            fresh
        });
        registry.add_predicate(draft.column(), predicate);
        debug!("quick filter on column {}", draft.column());
        self.sync_header();
        Ok(self.apply_filters())
    }

    /// Working copy of the registry for the filter manager dialog.
    pub fn filter_manager(&self) -> FilterEditor {
        let columns = self
            .filterable
            .iter()
            .map(|(name, &index)| EditorColumn {
                index,
                name: name.clone(),
                kind: self.column_kind(index),
            })
            .collect();
        let registry = self
            .registry
            .clone()
            .unwrap_or_else(|| FilterRegistry::new(self.default_inter_mode));
        FilterEditor::new(columns, self.column_names.len(), registry)
    }

    /// Take over the result of the filter manager.
    pub fn commit_filter_manager(&mut self, editor: FilterEditor) -> &FilterPass {
        self.replace_filters(editor.accept())
    }

    /// Replace the registry wholesale and reapply.
    pub fn replace_filters(&mut self, registry: FilterRegistry) -> &FilterPass {
        for column in registry.active_columns() {
            if !self.is_filterable(column) {
                warn!("filters on column {column} target a column without a filter button");
            }
        }
        self.registry = if registry.is_empty() && registry.column_order.is_none() {
            None
        } else {
            Some(registry)
        };
        self.sync_header();
        self.apply_filters()
    }

    /// Drop every predicate of one column and reapply.
    pub fn reset_column_filters(&mut self, column: usize) -> Result<&FilterPass, FilterError> {
        self.check_filterable(column)?;
        if let Some(registry) = self.registry.as_mut() {
            registry.remove_column(column);
            if registry.is_empty() {
                self.registry = None;
            }
        }
        self.sync_header();
        Ok(self.apply_filters())
    }

    /// Drop all filters. Every row becomes visible again.
    pub fn reset_filters(&mut self) -> &FilterPass {
        self.registry = None;
        self.header.clear_filters();
        self.apply_filters()
    }

    /// Run a filtering pass and rebuild the visible row list.
    pub fn apply_filters(&mut self) -> &FilterPass {
        self.busy.begin("Filtering...");
        self.last_pass = match &self.registry {
            Some(registry) if !registry.is_empty() => filter_engine::recompute(registry, &self.source),
            _ => FilterPass::unfiltered(self.source.row_count()),
        };
        self.busy.end();
        info!("{}", self.last_pass.status_line());
        self.refresh_order();
        &self.last_pass
    }

    pub fn toggle_sort(&mut self, column: usize) {
        if column >= self.column_names.len() {
            return;
        }
        self.sort.toggle(column);
        self.refresh_order();
    }

    pub fn set_sort(&mut self, keys: Vec<SortKey>) {
        self.sort.set(keys);
        self.refresh_order();
    }

    fn sync_header(&mut self) {
        match &self.registry {
            Some(registry) => self.header.write_filters(registry.active_columns()),
            None => self.header.clear_filters(),
        }
    }

    fn refresh_order(&mut self) {
        let mut rows = self.last_pass.accepted.clone();
        sort::sort_rows(&mut rows, &self.source, self.sort.keys());
        self.visible = rows;
        self.header.set_sort_marks(self.sort.keys());
        self.fit_column_widths();
    }

    fn fit_column_widths(&mut self) {
        let mut widths = vec![0usize; self.column_names.len()];
        for &row in self.visible.iter().take(WIDTH_SAMPLE_ROWS) {
            for (column, width) in widths.iter_mut().enumerate() {
                *width = (*width).max(self.source.cell(row, column).as_text().chars().count());
            }
        }
        self.header.fit_widths(&widths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CellValue, RecordTable};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn source() -> RecordTable {
        RecordTable::new(
            vec!["Name".into(), "Score".into(), "Note".into()],
            vec![
                vec![CellValue::from("heat, market"), CellValue::Number(3.0), CellValue::from("a")],
                vec![CellValue::from("electricity, market"), CellValue::Number(7.0), CellValue::from("b")],
                vec![CellValue::from("steel"), CellValue::Number(1.0), CellValue::from("c")],
            ],
        )
        .with_filterable(vec![0, 1])
    }

    fn draft(view: &FilterView<RecordTable>, column: usize, op: OperatorKind, value: &str) -> QuickFilterDraft {
        view.quick_filter_draft(column, Some(op)).unwrap().with_value(value)
    }

    #[test]
    fn test_quick_filters_or_within_column() {
        let mut view = FilterView::new(source());
        let d = draft(&view, 0, OperatorKind::Contains, "heat");
        view.apply_quick_filter(&d).unwrap();
        assert_eq!(view.visible_rows(), &[0]);

        let d = draft(&view, 0, OperatorKind::Contains, "electricity");
        view.apply_quick_filter(&d).unwrap();
        assert_eq!(view.visible_rows(), &[0, 1]);
        assert_eq!(view.registry().unwrap().column(0).unwrap().mode, Some(CombineMode::Or));
        assert!(view.header().is_filter_active(0));
        assert_eq!(view.status_line(), "2 filter matches found");
    }

    #[test]
    fn test_non_filterable_column_is_rejected() {
        let mut view = FilterView::new(source());
        assert!(matches!(
            view.quick_filter_draft(2, None),
            Err(FilterError::OutOfRange { column: 2, column_count: 3 })
        ));
        assert!(view.reset_column_filters(2).is_err());

        let menu = view.header_event(HeaderEvent {
            column: 2,
            interaction: HeaderInteraction::FilterButton(MouseButton::Left),
        });
        assert!(menu.is_none());
        assert_eq!(view.selected_column(), None);
    }

    #[test]
    fn test_reset_column_and_all() {
        let mut view = FilterView::new(source());
        let d = draft(&view, 0, OperatorKind::Contains, "market");
        view.apply_quick_filter(&d).unwrap();
        let d = draft(&view, 1, OperatorKind::NumericGte, "5");
        view.apply_quick_filter(&d).unwrap();
        assert_eq!(view.match_count(), 1);

        view.reset_column_filters(1).unwrap();
        assert_eq!(view.match_count(), 2);
        assert!(!view.header().is_filter_active(1));

        view.reset_filters();
        assert!(view.registry().is_none());
        assert_eq!(view.match_count(), 3);
        assert_eq!(view.status_line(), "3 rows");
    }

    #[test]
    fn test_header_events() {
        let mut view = FilterView::new(source());
        let menu = view
            .header_event(HeaderEvent {
                column: 1,
                interaction: HeaderInteraction::FilterButton(MouseButton::Left),
            })
            .unwrap();
        assert_eq!(menu.column_name, "Score");
        assert_eq!(menu.presets, OperatorKind::for_column(ColumnKind::Numeric));
        assert!(!menu.can_remove_all);
        assert_eq!(view.selected_column(), Some(1));

        let none = view.header_event(HeaderEvent {
            column: 1,
            interaction: HeaderInteraction::FilterButton(MouseButton::Right),
        });
        assert!(none.is_none());

        view.header_event(HeaderEvent {
            column: 1,
            interaction: HeaderInteraction::Label(MouseButton::Left),
        });
        assert_eq!(view.visible_rows(), &[2, 0, 1]);
    }

    #[test]
    fn test_menu_actions() {
        let mut view = FilterView::new(source());
        let outcome = view.menu_action(1, MenuAction::AddPreset(OperatorKind::NumericLte)).unwrap();
        let MenuOutcome::QuickFilter(d) = outcome else {
            panic!("expected a quick filter draft");
        };
        view.apply_quick_filter(&d.with_value("3")).unwrap();
        assert_eq!(view.visible_rows(), &[0, 2]);

        let MenuOutcome::FilterManager(mut editor) = view.menu_action(1, MenuAction::ManageFilters).unwrap() else {
            panic!("expected the filter manager");
        };
        editor.set_inter_mode(CombineMode::Or);
        editor.clear_column(1);
        view.commit_filter_manager(editor);
        assert!(view.registry().is_none());
        assert_eq!(view.match_count(), 3);
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl BusyIndicator for Recorder {
        fn begin(&mut self, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
        fn end(&mut self) {
            self.0.borrow_mut().push("done".to_string());
        }
    }

    #[test]
    fn test_busy_indicator_wraps_passes() {
        let recorder = Recorder::default();
        let mut view = FilterView::new(source()).with_busy_indicator(recorder.clone());
        view.apply_filters();
        assert_eq!(*recorder.0.borrow(), vec!["Filtering...".to_string(), "done".to_string()]);
    }

    #[test]
    fn test_config_overrides_kinds_and_mode() {
        let mut config = Config::default();
        config.filter.default_inter_mode = CombineMode::Or;
        config.column_types.insert("note".into(), ColumnKind::Numeric);
        let mut view = FilterView::new(source()).with_config(&config);
        assert_eq!(view.column_kind(2), ColumnKind::Numeric);

        let d = draft(&view, 0, OperatorKind::Contains, "steel");
        view.apply_quick_filter(&d).unwrap();
        assert_eq!(view.registry().unwrap().inter_mode, CombineMode::Or);
    }

    #[test]
    fn test_replace_source_keeps_filters() {
        let mut view = FilterView::new(source());
        let d = draft(&view, 1, OperatorKind::NumericGte, "2");
        view.apply_quick_filter(&d).unwrap();
        assert_eq!(view.match_count(), 2);

        view.replace_source(RecordTable::new(vec!["Name".into()], vec![vec![CellValue::from("x")]]));
        assert_eq!(view.match_count(), 1);
        assert!(view.last_pass().diagnostics.ignored_columns.contains(&1));
    }
}
