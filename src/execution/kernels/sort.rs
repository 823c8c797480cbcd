//! Multi-key sort kernel (§4.4a, supplemented). Permutes every column of a
//! table — live and dead rows alike — into lexicographic order over an
//! ordered key list, then permutes the selection mask alongside so the
//! table's invariants still hold afterwards.

use crate::error::{ExecError, Result};
use crate::model::{ColumnData, Table};
use crate::plan::SortKey;

/// Ordering value a single key column contributes for one row; `Accumulator`
/// columns compare as unsigned 64-bit values rather than reinterpreting
/// their bytes as signed integers.
enum KeyValues<'a> {
    Int32(&'a [i32]),
    Accumulator(&'a [u64]),
}

impl KeyValues<'_> {
    fn compare(&self, a: usize, b: usize) -> std::cmp::Ordering {
        match self {
            KeyValues::Int32(v) => v[a].cmp(&v[b]),
            KeyValues::Accumulator(v) => v[a].cmp(&v[b]),
        }
    }
}

pub fn sort(table: &mut Table, keys: &[SortKey], op_id: usize) -> Result<()> {
    if keys.is_empty() {
        return Err(ExecError::plan(op_id, "sort requires at least one key"));
    }

    let mut resolved = Vec::with_capacity(keys.len());
    for key in keys {
        let slot = table
            .physical_slot(key.column)
            .ok_or_else(|| ExecError::plan(op_id, format!("sort key {} is missing from its input schema", key.column)))?;
        let values = match &table.columns[slot].data {
            ColumnData::Int32(c) => KeyValues::Int32(&c.values),
            ColumnData::Accumulator(v) => KeyValues::Accumulator(v),
        };
        resolved.push((values, key.ascending));
    }

    let mut permutation: Vec<usize> = (0..table.row_count).collect();
    permutation.sort_by(|&a, &b| {
        for (values, ascending) in &resolved {
            let ord = values.compare(a, b);
            if ord != std::cmp::Ordering::Equal {
                return if *ascending { ord } else { ord.reverse() };
            }
        }
        std::cmp::Ordering::Equal
    });

    for column in &mut table.columns {
        apply_permutation(column, &permutation);
    }
    table.selection = permutation.iter().map(|&i| table.selection[i]).collect();
    Ok(())
}

fn apply_permutation(column: &mut crate::model::Column, permutation: &[usize]) {
    match &mut column.data {
        ColumnData::Int32(c) => {
            c.values = permutation.iter().map(|&i| c.values[i]).collect();
        }
        ColumnData::Accumulator(v) => {
            *v = permutation.iter().map(|&i| v[i]).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use std::collections::HashMap;

    fn table_with(values: Vec<i32>) -> Table {
        let mut indices = HashMap::new();
        indices.insert(0, 0);
        let len = values.len();
        Table::new("t", vec![Column::int32(values)], indices, len)
    }

    #[test]
    fn sort_ascending_orders_all_rows_including_dead_ones() {
        let mut table = table_with(vec![3, 1, 2]);
        table.selection = vec![true, false, true];
        sort(&mut table, &[SortKey { column: 0, ascending: true }], 0).unwrap();
        assert_eq!(table.column(0).unwrap().as_int32().unwrap().values, vec![1, 2, 3]);
        assert_eq!(table.selection, vec![false, true, true]);
    }

    #[test]
    fn sort_descending_reverses_order() {
        let mut table = table_with(vec![3, 1, 2]);
        sort(&mut table, &[SortKey { column: 0, ascending: false }], 0).unwrap();
        assert_eq!(table.column(0).unwrap().as_int32().unwrap().values, vec![3, 2, 1]);
    }

    #[test]
    fn sort_compares_accumulator_columns_as_unsigned() {
        let mut indices = HashMap::new();
        indices.insert(0, 0);
        let mut table = Table::new("t", vec![Column::accumulator(vec![5, 1, 3])], indices, 3);
        sort(&mut table, &[SortKey { column: 0, ascending: true }], 0).unwrap();
        assert_eq!(table.column(0).unwrap().as_accumulator().unwrap(), &[1, 3, 5]);
    }
}
