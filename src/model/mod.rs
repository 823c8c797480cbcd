pub mod column;
pub mod table;

pub use column::{Column, ColumnData, Int32Column};
pub use table::Table;

/// A logical column id as referenced by the plan: for a table-scan's own
/// output it is the table-local column index; after a project it is the
/// output position; after a full-join it is the dimension's group-by id,
/// offset into the fact's namespace (§4.3, §6).
pub type ColumnId = usize;
