pub mod filter_engine;
pub mod filter_view;
pub mod sort;

pub use filter_engine::{recompute, FilterPass, PassDiagnostics, RowFilter};
pub use filter_view::{BusyIndicator, FilterView, HeaderMenu, MenuAction, MenuOutcome, NoBusyIndicator};
pub use sort::{SortDirection, SortKey, SortState};
