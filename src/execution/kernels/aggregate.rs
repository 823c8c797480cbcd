//! Aggregation kernels (§4.4): scalar SUM with no grouping, and group-by
//! aggregation via a perfect direct-addressing hash over the grouping
//! columns' min/max ranges.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::config::ExecutorConfig;
use crate::error::{ExecError, Result};
use crate::model::{Column, ColumnId, Table};
use crate::plan::Agg;

/// Scalar SUM with no GROUP BY: reduces one column over live rows into a
/// single accumulator and replaces the table with a one-row result,
/// addressable at logical id 0.
pub fn scalar_sum(table: &mut Table, operand: ColumnId, op_id: usize) -> Result<()> {
    let col = table
        .column(operand)
        .and_then(|c| c.as_int32())
        .ok_or_else(|| ExecError::plan(op_id, format!("SUM operand {operand} is missing or not an integer column")))?;

    let total: u64 = col
        .values
        .par_iter()
        .zip(table.selection.par_iter())
        .filter(|(_, &live)| live)
        .map(|(&v, _)| v as i64 as u64)
        .sum();

    let mut indices = HashMap::new();
    indices.insert(0, 0);
    table.columns = vec![Column::accumulator(vec![total])];
    table.column_indices = indices;
    table.row_count = 1;
    table.selection = vec![true];
    table.group_by_column = None;
    Ok(())
}

/// Group-by aggregation: `R = product(max_j - min_j + 1)` buckets, a
/// perfect bijective hash from the grouping grid onto `[0, R)`. Rejects with
/// a resource error rather than allocating unbounded memory if `R` would
/// exceed `config.max_group_by_buckets`.
pub fn group_by(table: &mut Table, group: &[ColumnId], aggs: &[Agg], config: &ExecutorConfig, op_id: usize) -> Result<()> {
    let group_cols: Vec<&crate::model::Int32Column> = group
        .iter()
        .map(|&g| {
            table
                .column(g)
                .and_then(|c| c.as_int32())
                .ok_or_else(|| ExecError::plan(op_id, format!("GROUP BY column {g} is missing or not an integer column")))
        })
        .collect::<Result<_>>()?;

    if aggs.len() != 1 || aggs[0].agg != "SUM" {
        return Err(ExecError::plan(op_id, "only a single SUM aggregate is supported"));
    }
    let agg_col = table
        .column(aggs[0].operands[0])
        .and_then(|c| c.as_int32())
        .ok_or_else(|| ExecError::plan(op_id, "SUM operand is missing or not an integer column"))?;

    let mut strides = Vec::with_capacity(group_cols.len());
    let mut r: usize = 1;
    for col in &group_cols {
        let span = (col.max - col.min + 1) as usize;
        strides.push(r);
        r = r
            .checked_mul(span)
            .ok_or_else(|| ExecError::resource(op_id, "group-by bucket count overflowed"))?;
    }
    if r > config.max_group_by_buckets {
        return Err(ExecError::resource(
            op_id,
            format!("group-by would need {r} buckets, exceeding the configured limit of {}", config.max_group_by_buckets),
        ));
    }

    let mut res_flags = vec![false; r];
    let mut group_buffers: Vec<Vec<i32>> = vec![vec![0i32; r]; group_cols.len()];
    let accumulators: Vec<AtomicU64> = (0..r).map(|_| AtomicU64::new(0)).collect();

    for i in 0..table.row_count {
        if !table.selection[i] {
            continue;
        }
        let mut h = 0usize;
        for (j, col) in group_cols.iter().enumerate() {
            h += (col.values[i] - col.min) as usize * strides[j];
        }
        res_flags[h] = true;
        for (j, col) in group_cols.iter().enumerate() {
            group_buffers[j][h] = col.values[i];
        }
        accumulators[h].fetch_add(agg_col.values[i] as i64 as u64, Ordering::Relaxed);
    }

    // Group columns are re-addressed at their output position (0..g), not
    // their pre-aggregate logical id — the same position-is-the-logical-id
    // convention projection and join rewrites follow (§4.2, §4.3), and the
    // one the plan inspector's schema walk assumes downstream (§4.5).
    let mut columns = Vec::with_capacity(group.len() + 1);
    let mut column_indices = HashMap::with_capacity(group.len() + 1);
    for (pos, buf) in group_buffers.into_iter().enumerate() {
        column_indices.insert(pos, columns.len());
        columns.push(Column::int32(buf));
    }
    let result_id = group.len();
    column_indices.insert(result_id, columns.len());
    let accumulated: Vec<u64> = accumulators.into_iter().map(|a| a.into_inner()).collect();
    columns.push(Column::accumulator(accumulated));

    table.columns = columns;
    table.column_indices = column_indices;
    table.row_count = r;
    table.selection = res_flags;
    table.group_by_column = None;
    Ok(())
}
