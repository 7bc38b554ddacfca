pub mod header;
pub mod table;
pub mod theme;

pub use header::{FilterHeader, HeaderEvent, HeaderInteraction, HeaderSection};
pub use table::{render_to_lines, ResultsTable};
pub use theme::Theme;
