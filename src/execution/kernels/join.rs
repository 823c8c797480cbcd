//! Join kernels (§4.3): equi-joins between the fact table (always
//! `lineorder`, on the probe side) and a dimension table (build side),
//! specialised into a filter-join (dimension data never survives) and a
//! full-join (the dimension's group-by key is rewritten into the fact
//! stream).

use rayon::prelude::*;

use crate::error::{ExecError, Result};
use crate::model::{ColumnId, Int32Column, Table};

/// Dense, direct-addressed `bucket = key - min` hash table. Callers build it
/// once over the (small) dimension side and probe it once per fact row.
fn bucket_of(key: i32, min: i32) -> usize {
    (key - min) as usize
}

/// Filter-join: used when the dimension table is not referenced again after
/// this join. Builds a dense Boolean presence table over the dimension key
/// and ANDs the fact table's selection mask against a probe of it. No
/// dimension data survives.
pub fn filter_join(fact: &mut Table, dimension: &Table, fact_key: ColumnId, dimension_key: ColumnId, op_id: usize) -> Result<()> {
    let dim_col = dimension
        .column(dimension_key)
        .and_then(|c| c.as_int32())
        .ok_or_else(|| ExecError::plan(op_id, format!("dimension join key {dimension_key} is missing or not an integer column")))?;
    let fact_col = fact
        .column(fact_key)
        .and_then(|c| c.as_int32())
        .ok_or_else(|| ExecError::plan(op_id, format!("fact join key {fact_key} is missing or not an integer column")))?
        .values
        .clone();

    let range = dim_col.max - dim_col.min + 1;
    let range = usize::try_from(range).map_err(|_| ExecError::plan(op_id, "dimension join key has an invalid min/max range"))?;
    let mut present = vec![false; range];
    for (i, &key) in dim_col.values.iter().enumerate() {
        if dimension.selection[i] {
            present[bucket_of(key, dim_col.min)] = true;
        }
    }

    let min = dim_col.min;
    let max = dim_col.max;
    fact.selection
        .par_iter_mut()
        .zip(fact_col.par_iter())
        .for_each(|(live, &key)| {
            *live = *live && key >= min && key <= max && present[bucket_of(key, min)];
        });
    Ok(())
}

/// Full-join: used when the dimension table's grouping column must be
/// propagated into the fact stream. Rewrites the fact's foreign-key column
/// in place with the dimension's group-by value and re-addresses it at the
/// dimension's logical id, offset past the fact's own namespace.
///
/// `left_schema_width` is the join's left-schema width as recorded by the
/// plan inspector (§4.5) — the same boundary `Column.input` positions
/// downstream of this join are resolved against, and therefore the offset
/// the rewritten column must be re-addressed at. Deliberately *not* derived
/// from `fact.logical_column_count()`, which only reflects however many
/// columns this fact table actually loaded and would silently disagree with
/// the plan's own numbering whenever that is a strict subset of the
/// catalogue width (§6).
pub fn full_join(
    fact: &mut Table,
    dimension: &Table,
    fact_key: ColumnId,
    dimension_key: ColumnId,
    dimension_group_by: ColumnId,
    left_schema_width: usize,
    op_id: usize,
) -> Result<()> {
    let dim_key_col = dimension
        .column(dimension_key)
        .and_then(|c| c.as_int32())
        .ok_or_else(|| ExecError::plan(op_id, format!("dimension join key {dimension_key} is missing or not an integer column")))?;
    let dim_group_col = dimension
        .column(dimension_group_by)
        .and_then(|c| c.as_int32())
        .ok_or_else(|| {
            ExecError::plan(op_id, format!("dimension group-by column {dimension_group_by} is missing or not an integer column"))
        })?;

    let range = dim_key_col.max - dim_key_col.min + 1;
    let range = usize::try_from(range).map_err(|_| ExecError::plan(op_id, "dimension join key has an invalid min/max range"))?;
    let mut slot_present = vec![false; range];
    let mut slot_value = vec![0i32; range];
    for (i, &key) in dim_key_col.values.iter().enumerate() {
        if dimension.selection[i] {
            let bucket = bucket_of(key, dim_key_col.min);
            slot_present[bucket] = true;
            slot_value[bucket] = dim_group_col.values[i];
        }
    }

    let key_min = dim_key_col.min;
    let key_max = dim_key_col.max;
    let new_min = dim_group_col.min;
    let new_max = dim_group_col.max;

    let fact_slot = fact
        .physical_slot(fact_key)
        .ok_or_else(|| ExecError::plan(op_id, format!("fact join key {fact_key} is missing from the fact table")))?;
    {
        let fact_col = fact.columns[fact_slot]
            .as_int32_mut()
            .ok_or_else(|| ExecError::plan(op_id, format!("fact join key {fact_key} is not an integer column")))?;
        fact.selection
            .par_iter_mut()
            .zip(fact_col.values.par_iter_mut())
            .for_each(|(live, key)| {
                if !*live {
                    return;
                }
                if *key < key_min || *key > key_max {
                    *live = false;
                    return;
                }
                let bucket = bucket_of(*key, key_min);
                if slot_present[bucket] {
                    *key = slot_value[bucket];
                } else {
                    *live = false;
                }
            });
        *fact_col = Int32Column::with_hints(std::mem::take(&mut fact_col.values), new_min, new_max);
    }

    let new_logical_id = left_schema_width + dimension_group_by;
    fact.column_indices.remove(&fact_key);
    fact.column_indices.insert(new_logical_id, fact_slot);
    fact.group_by_column = Some(new_logical_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use std::collections::HashMap;

    fn fact_table() -> Table {
        let columns = vec![Column::int32(vec![100, 101, 102, 999])];
        let mut indices = HashMap::new();
        indices.insert(0, 0);
        Table::new("lineorder", columns, indices, 4)
    }

    fn dimension_table() -> Table {
        // keys 100,101,102 with group-by values 7,8,9
        let columns = vec![Column::int32(vec![100, 101, 102]), Column::int32(vec![7, 8, 9])];
        let mut indices = HashMap::new();
        indices.insert(0, 0);
        indices.insert(1, 1);
        Table::new("ddate", columns, indices, 3)
    }

    /// Testable property #3: filter-join keeps exactly the fact rows whose
    /// key matches a live dimension row.
    #[test]
    fn filter_join_keeps_only_matching_rows() {
        let mut fact = fact_table();
        let dim = dimension_table();
        filter_join(&mut fact, &dim, 0, 0, 0).unwrap();
        assert_eq!(fact.selection, vec![true, true, true, false]);
    }

    /// Testable property #4: full-join rewrites the fact's key column to
    /// the dimension's group-by value and re-addresses it.
    #[test]
    fn full_join_rewrites_key_to_group_value() {
        let mut fact = fact_table();
        let dim = dimension_table();
        full_join(&mut fact, &dim, 0, 0, 1, 17, 0).unwrap();
        assert_eq!(fact.selection, vec![true, true, true, false]);
        let new_id = fact.group_by_column.unwrap();
        assert_eq!(new_id, 18);
        assert_eq!(fact.column(new_id).unwrap().as_int32().unwrap().values, vec![7, 8, 9, 0]);
        assert!(fact.column(0).is_none());
    }
}
