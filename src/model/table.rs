//! The table: an ordered array of columns, a row count, a selection mask,
//! and the logical-to-physical column index map every operator must keep
//! consistent (§3).

use std::collections::HashMap;

use crate::model::column::Column;
use crate::model::ColumnId;

/// A live, in-memory table flowing between operators.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub row_count: usize,
    /// `true` = row currently live. Every kernel reads and writes through
    /// this mask; no kernel may touch a position where it is `false`.
    pub selection: Vec<bool>,
    /// Logical column id (as referenced by the plan) -> physical slot in
    /// `columns`. Exactly one entry per live column (§3's invariant).
    pub column_indices: HashMap<ColumnId, usize>,
    /// The logical id of this table's grouping column, if a downstream
    /// `Aggregate` groups by one of its columns. Used by the executor to
    /// pick a join direction and by full-join to know what to propagate
    /// (§4.3).
    pub group_by_column: Option<ColumnId>,
}

impl Table {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<Column>,
        column_indices: HashMap<ColumnId, usize>,
        row_count: usize,
    ) -> Self {
        Table {
            name: name.into(),
            columns,
            row_count,
            selection: vec![true; row_count],
            column_indices,
            group_by_column: None,
        }
    }

    pub fn physical_slot(&self, logical: ColumnId) -> Option<usize> {
        self.column_indices.get(&logical).copied()
    }

    pub fn column(&self, logical: ColumnId) -> Option<&Column> {
        self.physical_slot(logical).map(|slot| &self.columns[slot])
    }

    pub fn column_mut(&mut self, logical: ColumnId) -> Option<&mut Column> {
        self.physical_slot(logical)
            .map(move |slot| &mut self.columns[slot])
    }

    pub fn live_row_count(&self) -> usize {
        self.selection.iter().filter(|&&live| live).count()
    }

    /// Number of logical columns currently addressable on this table. Used
    /// by the full-join rewrite to offset the dimension's propagated
    /// logical id past the fact's own namespace (§4.3).
    pub fn logical_column_count(&self) -> usize {
        self.column_indices.len()
    }
}
