//! Walks a `Filter`'s condition tree and dispatches each leaf predicate to
//! the selection kernel (§4.1), threading the parent logical connective
//! through nested `AND`/`OR` the way the original source's recursive
//! `parse_filter` walk does.

use crate::error::{ExecError, Result};
use crate::execution::kernels::selection::{self, CompOp, LogicalOp, Operand};
use crate::model::Table;
use crate::plan::Expr;

pub fn apply_filter(table: &mut Table, condition: &Expr, op_id: usize) -> Result<()> {
    walk(table, condition, LogicalOp::None, op_id)
}

fn walk(table: &mut Table, expr: &Expr, parent: LogicalOp, op_id: usize) -> Result<()> {
    let Expr::Expr { op, operands } = expr else {
        return Err(ExecError::plan(op_id, "filter condition must be a comparison, SEARCH, AND, or OR expression"));
    };

    match op.as_str() {
        "AND" | "OR" => {
            let connective = LogicalOp::parse(op);
            for (i, operand) in operands.iter().enumerate() {
                let inherited = if i == 0 { parent } else { connective };
                walk(table, operand, inherited, op_id)?;
            }
            Ok(())
        }
        "SEARCH" => {
            let [column_expr, literal_expr] = operands.as_slice() else {
                return Err(ExecError::plan(op_id, "SEARCH expects exactly two operands"));
            };
            let column_values = resolve_column(table, column_expr, op_id)?;
            let Expr::Literal { range_set: Some(ranges), .. } = literal_expr else {
                return Err(ExecError::plan(op_id, "SEARCH's second operand must be a literal range set"));
            };
            let converted: Vec<(i64, Option<i64>)> = ranges.iter().map(|r| (r.lo, r.hi)).collect();
            selection::select_search(&mut table.selection, column_values, &converted, parent, op_id)
        }
        _ => {
            let comp = CompOp::parse(op, op_id)?;
            let [left, right] = operands.as_slice() else {
                return Err(ExecError::plan(op_id, "comparison expects exactly two operands"));
            };
            let left_values = resolve_column(table, left, op_id)?.to_vec();
            match right {
                Expr::Column { .. } => {
                    let right_values = resolve_column(table, right, op_id)?.to_vec();
                    selection::select(&mut table.selection, &left_values, comp, Operand::Column(&right_values), parent);
                }
                Expr::Literal { value, .. } => {
                    selection::select(&mut table.selection, &left_values, comp, Operand::Scalar(*value as i32), parent);
                }
                Expr::Expr { .. } => {
                    return Err(ExecError::plan(op_id, "comparison operand must be a column or a literal"));
                }
            }
            Ok(())
        }
    }
}

fn resolve_column<'a>(table: &'a Table, expr: &Expr, op_id: usize) -> Result<&'a [i32]> {
    let Expr::Column { input } = expr else {
        return Err(ExecError::plan(op_id, "comparison's left operand must be a column"));
    };
    table
        .column(*input)
        .and_then(|c| c.as_int32())
        .map(|c| c.values.as_slice())
        .ok_or_else(|| ExecError::plan(op_id, format!("filter references out-of-range column input {input}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use crate::plan::RangeEntry;
    use std::collections::HashMap;

    fn table() -> Table {
        let columns = vec![Column::int32(vec![1, 2, 3, 4, 5])];
        let mut indices = HashMap::new();
        indices.insert(0, 0);
        Table::new("t", columns, indices, 5)
    }

    fn cmp(op: &str, input: usize, value: i64) -> Expr {
        Expr::Expr { op: op.into(), operands: vec![Expr::Column { input }, Expr::Literal { value, range_set: None }] }
    }

    #[test]
    fn and_of_two_comparisons_intersects() {
        let mut table = table();
        let condition = Expr::Expr { op: "AND".into(), operands: vec![cmp(">=", 0, 2), cmp("<=", 0, 4)] };
        apply_filter(&mut table, &condition, 0).unwrap();
        assert_eq!(table.selection, vec![false, true, true, true, false]);
    }

    #[test]
    fn search_range_desugars_correctly() {
        let mut table = table();
        let condition = Expr::Expr {
            op: "SEARCH".into(),
            operands: vec![
                Expr::Column { input: 0 },
                Expr::Literal {
                    value: 0,
                    range_set: Some(vec![RangeEntry { tag: "range".into(), lo: 2, hi: Some(4) }]),
                },
            ],
        };
        apply_filter(&mut table, &condition, 0).unwrap();
        assert_eq!(table.selection, vec![false, true, true, true, false]);
    }

    /// A nested disjunction as the *second* operand of an AND must still
    /// inherit the conjunction it sits under, rather than re-initialising
    /// the mask with NONE and discarding the first operand's result.
    #[test]
    fn nested_disjunction_as_second_operand_inherits_parent_connective() {
        let mut table = Table::new(
            "t",
            vec![Column::int32(vec![1, 2, 1, 2]), Column::int32(vec![1, -1, -1, 1])],
            HashMap::from([(0, 0), (1, 1)]),
            4,
        );
        let condition = Expr::Expr {
            op: "AND".into(),
            operands: vec![
                cmp(">", 1, 0),
                Expr::Expr { op: "OR".into(), operands: vec![cmp("=", 0, 1), cmp("=", 0, 2)] },
            ],
        };
        apply_filter(&mut table, &condition, 0).unwrap();
        assert_eq!(table.selection, vec![true, false, false, true]);
    }
}
