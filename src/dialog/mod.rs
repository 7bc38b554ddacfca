pub mod filter_editor;
pub mod quick_filter;

pub use filter_editor::{EditorColumn, FilterEditor};
pub use quick_filter::QuickFilterDraft;
