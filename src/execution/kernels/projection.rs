//! Projection / element-wise arithmetic kernel (§4.2): builds one new
//! column per output expression, transferring ownership for bare column
//! references and computing fresh buffers for literals and binary
//! arithmetic.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::{ExecError, Result};
use crate::model::{Column, ColumnId, Table};
use crate::plan::Expr;

#[derive(Debug, Clone, Copy)]
enum Arithmetic {
    Add,
    Sub,
    Mul,
    Div,
}

impl Arithmetic {
    fn parse(op: &str, op_id: usize) -> Result<Self> {
        match op {
            "+" => Ok(Arithmetic::Add),
            "-" => Ok(Arithmetic::Sub),
            "*" | "\u{d7}" => Ok(Arithmetic::Mul),
            "/" | "\u{f7}" => Ok(Arithmetic::Div),
            other => Err(ExecError::plan(op_id, format!("unsupported arithmetic operator '{other}'"))),
        }
    }

    #[inline]
    fn apply(self, a: i32, b: i32) -> i32 {
        match self {
            Arithmetic::Add => a.wrapping_add(b),
            Arithmetic::Sub => a.wrapping_sub(b),
            Arithmetic::Mul => a.wrapping_mul(b),
            // Division by zero yields zero rather than panicking (§9): there
            // is no error channel a mid-row arithmetic fault could usefully
            // report through from inside a data-parallel loop.
            Arithmetic::Div => a.checked_div(b).unwrap_or(0),
        }
    }
}

/// Rebuilds `table`'s columns from `exprs`, one output column per
/// expression, replacing `column_indices` with the identity map and
/// relocating `group_by_column` if it survives the projection.
pub fn project(table: &mut Table, exprs: &[Expr], op_id: usize) -> Result<()> {
    let row_count = table.row_count;
    let selection = table.selection.clone();
    let old_group_by = table.group_by_column;
    let old_indices = std::mem::take(&mut table.column_indices);
    let mut source: Vec<Option<Column>> = table.columns.drain(..).map(Some).collect();

    let mut outputs: Vec<Option<Column>> = vec![None; exprs.len()];

    // Pass 1: literal/arithmetic expressions only ever borrow source columns.
    for (pos, expr) in exprs.iter().enumerate() {
        if matches!(expr, Expr::Column { .. }) {
            continue;
        }
        outputs[pos] = Some(eval_borrowed(expr, &old_indices, &source, &selection, row_count, op_id)?);
    }

    // Pass 2: bare column references take ownership; a logical id referenced
    // by two bare passthroughs after its first transfer is a bug, not a plan
    // shape a caller could have produced innocently (§4.2).
    let mut new_group_by = None;
    for (pos, expr) in exprs.iter().enumerate() {
        if let Expr::Column { input } = expr {
            let slot = old_indices
                .get(input)
                .copied()
                .ok_or_else(|| ExecError::plan(op_id, format!("projection references out-of-range column input {input}")))?;
            let column = source[slot].take().ok_or_else(|| {
                ExecError::internal(op_id, format!("column at logical id {input} taken more than once"))
            })?;
            if old_group_by == Some(*input) {
                new_group_by = Some(pos);
            }
            outputs[pos] = Some(column);
        }
    }

    let mut columns = Vec::with_capacity(outputs.len());
    let mut column_indices = HashMap::with_capacity(outputs.len());
    for (pos, column) in outputs.into_iter().enumerate() {
        let column = column
            .ok_or_else(|| ExecError::internal(op_id, "projection produced no column for an output position"))?;
        column_indices.insert(pos, columns.len());
        columns.push(column);
    }

    table.columns = columns;
    table.column_indices = column_indices;
    table.group_by_column = new_group_by;
    Ok(())
}

fn eval_borrowed(
    expr: &Expr,
    indices: &HashMap<ColumnId, usize>,
    source: &[Option<Column>],
    selection: &[bool],
    row_count: usize,
    op_id: usize,
) -> Result<Column> {
    match expr {
        Expr::Column { .. } => unreachable!("bare column references are resolved in pass 2"),
        Expr::Literal { value, .. } => Ok(Column::int32(vec![*value as i32; row_count])),
        Expr::Expr { op, operands } => {
            let [left, right] = operands.as_slice() else {
                return Err(ExecError::plan(op_id, "projection arithmetic expects exactly two operands"));
            };
            let (a_vals, a_min, a_max, a_lit) = resolve_operand(left, indices, source, row_count, op_id)?;
            let (b_vals, b_min, b_max, b_lit) = resolve_operand(right, indices, source, row_count, op_id)?;
            let arith = Arithmetic::parse(op, op_id)?;

            let mut out = vec![0i32; row_count];
            out.par_iter_mut().enumerate().for_each(|(i, o)| {
                if selection[i] {
                    *o = arith.apply(a_vals[i], b_vals[i]);
                }
            });

            let (min, max) = match (a_lit, b_lit) {
                (false, false) => (a_min.min(b_min), a_max.max(b_max)),
                (true, false) => (b_min, b_max),
                (false, true) => (a_min, a_max),
                (true, true) => {
                    let v = out.first().copied().unwrap_or(0);
                    (v, v)
                }
            };
            Ok(Column {
                data: crate::model::ColumnData::Int32(crate::model::Int32Column::with_hints(out, min, max)),
            })
        }
    }
}

/// Resolves a projection arithmetic operand, which per §4.2 is always a bare
/// column or a literal, never a further nested expression. Returns the
/// materialised values alongside the hint pair and whether this operand was
/// a literal (needed to pick the right min/max combination rule).
fn resolve_operand(
    expr: &Expr,
    indices: &HashMap<ColumnId, usize>,
    source: &[Option<Column>],
    row_count: usize,
    op_id: usize,
) -> Result<(Vec<i32>, i32, i32, bool)> {
    match expr {
        Expr::Literal { value, .. } => {
            let v = *value as i32;
            Ok((vec![v; row_count], v, v, true))
        }
        Expr::Column { input } => {
            let slot = indices
                .get(input)
                .copied()
                .ok_or_else(|| ExecError::plan(op_id, format!("projection references out-of-range column input {input}")))?;
            let column = source[slot]
                .as_ref()
                .ok_or_else(|| ExecError::internal(op_id, format!("column at logical id {input} already taken")))?;
            let int32 = column
                .as_int32()
                .ok_or_else(|| ExecError::internal(op_id, "arithmetic operand is an aggregate-result column"))?;
            Ok((int32.values.clone(), int32.min, int32.max, false))
        }
        Expr::Expr { .. } => Err(ExecError::plan(
            op_id,
            "projection arithmetic operands must be a column or a literal, not a nested expression",
        )),
    }
}
