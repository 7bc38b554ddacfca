pub mod column_filter;
pub mod diagnostics;
pub mod error;
pub mod operator;
pub mod predicate;
pub mod registry;
pub mod source;
pub mod types;

pub use column_filter::ColumnFilterSet;
pub use diagnostics::PassDiagnostics;
pub use error::FilterError;
pub use operator::OperatorKind;
pub use predicate::{Operand, Predicate};
pub use registry::{EvaluationOrder, FilterRegistry, ParsedSpec};
pub use source::{FrameSource, RecordTable, TabularSource};
pub use types::*;
