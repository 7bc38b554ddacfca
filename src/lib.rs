//! gridsift: multi-column row filtering and sorting for tabular data.
//!
//! Filters live in a [`FilterRegistry`]: per column, a list of predicates
//! combined with AND or OR, and across columns a second AND/OR mode. A
//! [`FilterView`] owns a data source and its registry, drives the
//! [`FilterHeader`](tui::FilterHeader) control and keeps the visible row list
//! current after every change.
//!
//! ```
//! use gridsift::core::{CellValue, OperatorKind, RecordTable};
//! use gridsift::FilterView;
//!
//! let table = RecordTable::new(
//!     vec!["Name".into()],
//!     vec![vec![CellValue::from("heat")], vec![CellValue::from("steel")]],
//! );
//! let mut view = FilterView::new(table);
//! let draft = view.quick_filter_draft(0, Some(OperatorKind::Contains)).unwrap().with_value("HEAT");
//! view.apply_quick_filter(&draft).unwrap();
//! assert_eq!(view.visible_rows(), &[0]);
//! assert_eq!(view.status_line(), "1 filter matches found");
//! ```
//!
//! Nothing here is thread-safe; a view and its registry belong to one thread.

pub mod config;
pub mod core;
pub mod dialog;
pub mod logging;
pub mod services;
pub mod tui;

pub use core::{CellValue, ColumnFilterSet, CombineMode, FilterError, FilterRegistry, OperatorKind, Predicate};
pub use services::{FilterPass, FilterView};
