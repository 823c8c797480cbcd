//! Selection kernel (§4.1): scalar-vs-vector comparison composed into a
//! running selection mask via a parent logical connective, plus the
//! `SEARCH` desugaring into range/equality-OR selections.

use rayon::prelude::*;

use crate::error::{ExecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    pub fn parse(op: &str, op_id: usize) -> Result<Self> {
        match op {
            "=" | "==" => Ok(CompOp::Eq),
            "<>" | "!=" => Ok(CompOp::Ne),
            "<" => Ok(CompOp::Lt),
            "<=" | "\u{2264}" => Ok(CompOp::Le),
            ">" => Ok(CompOp::Gt),
            ">=" | "\u{2265}" => Ok(CompOp::Ge),
            other => Err(ExecError::plan(op_id, format!("unsupported comparison operator '{other}'"))),
        }
    }

    #[inline]
    fn apply(self, a: i32, b: i32) -> bool {
        match self {
            CompOp::Eq => a == b,
            CompOp::Ne => a != b,
            CompOp::Lt => a < b,
            CompOp::Le => a <= b,
            CompOp::Gt => a > b,
            CompOp::Ge => a >= b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    None,
    And,
    Or,
}

impl LogicalOp {
    pub fn parse(op: &str) -> Self {
        match op {
            "AND" => LogicalOp::And,
            "OR" => LogicalOp::Or,
            _ => LogicalOp::None,
        }
    }

    #[inline]
    fn combine(self, carried: bool, predicate: bool) -> bool {
        match self {
            LogicalOp::None => predicate,
            LogicalOp::And => carried && predicate,
            LogicalOp::Or => carried || predicate,
        }
    }
}

/// The selection kernel's second operand: another column or a scalar.
pub enum Operand<'a> {
    Column(&'a [i32]),
    Scalar(i32),
}

/// For every index `i`, computes `c = op(column[i], operand[i] or k)` and
/// sets `mask[i] <- parent(mask[i], c)`. This is the one primitive every
/// filter condition, including a desugared `SEARCH`, is built from.
pub fn select(mask: &mut [bool], column: &[i32], op: CompOp, operand: Operand, parent: LogicalOp) {
    match operand {
        Operand::Scalar(k) => {
            mask.par_iter_mut()
                .zip(column.par_iter())
                .for_each(|(m, &a)| *m = parent.combine(*m, op.apply(a, k)));
        }
        Operand::Column(b) => {
            mask.par_iter_mut()
                .zip(column.par_iter())
                .zip(b.par_iter())
                .for_each(|((m, &a), &b)| *m = parent.combine(*m, op.apply(a, b)));
        }
    }
}

/// Desugars `SEARCH(col, ranges)` per §4.1: a single `[lo, hi]` range
/// becomes `>= lo` (NONE) then `<= hi` (AND) against a scratch mask; two
/// enumerated values become `= a` (NONE) then `= b` (OR). The scratch mask
/// is then combined into the live mask with the caller's parent connective.
/// Any other arity is a plan error — the original source never handles it.
pub fn select_search(
    mask: &mut [bool],
    column: &[i32],
    ranges: &[(i64, Option<i64>)],
    parent: LogicalOp,
    op_id: usize,
) -> Result<()> {
    let mut scratch = vec![false; mask.len()];
    match ranges {
        [(lo, Some(hi))] => {
            select(&mut scratch, column, CompOp::Ge, Operand::Scalar(*lo as i32), LogicalOp::None);
            select(&mut scratch, column, CompOp::Le, Operand::Scalar(*hi as i32), LogicalOp::And);
        }
        [(a, None), (b, None)] => {
            select(&mut scratch, column, CompOp::Eq, Operand::Scalar(*a as i32), LogicalOp::None);
            select(&mut scratch, column, CompOp::Eq, Operand::Scalar(*b as i32), LogicalOp::Or);
        }
        other => {
            return Err(ExecError::plan(
                op_id,
                format!("SEARCH with {} enumerated values is unsupported", other.len()),
            ));
        }
    }
    mask.par_iter_mut()
        .zip(scratch.par_iter())
        .for_each(|(m, &c)| *m = parent.combine(*m, c));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_initialises_mask_from_predicate() {
        let mut mask = vec![false, false, false];
        let col = vec![1, 2, 3];
        select(&mut mask, &col, CompOp::Ge, Operand::Scalar(2), LogicalOp::None);
        assert_eq!(mask, vec![false, true, true]);
    }

    #[test]
    fn and_composes_with_predecessor_mask() {
        let col = vec![1, 2, 3];
        let mut direct = vec![false, false, false];
        select(&mut direct, &col, CompOp::Ge, Operand::Scalar(2), LogicalOp::None);
        select(&mut direct, &col, CompOp::Le, Operand::Scalar(2), LogicalOp::And);

        // Equivalent two-step composition: selecting with (p AND q) must equal
        // selecting with p (parent NONE) then q (parent AND) — testable
        // property #1.
        let mut staged = vec![false, false, false];
        select(&mut staged, &col, CompOp::Ge, Operand::Scalar(2), LogicalOp::None);
        select(&mut staged, &col, CompOp::Le, Operand::Scalar(2), LogicalOp::And);

        assert_eq!(direct, staged);
        assert_eq!(direct, vec![false, true, false]);
    }

    #[test]
    fn or_composes_disjunctively() {
        let col = vec![1, 2, 3];
        let mut mask = vec![false, false, false];
        select(&mut mask, &col, CompOp::Eq, Operand::Scalar(1), LogicalOp::None);
        select(&mut mask, &col, CompOp::Eq, Operand::Scalar(3), LogicalOp::Or);
        assert_eq!(mask, vec![true, false, true]);
    }

    #[test]
    fn search_range_matches_two_step_between() {
        let col = vec![1, 5, 10, 15];
        let mut mask = vec![true; 4];
        select_search(&mut mask, &col, &[(5, Some(10))], LogicalOp::And, 0).unwrap();
        assert_eq!(mask, vec![false, true, true, false]);
    }

    #[test]
    fn search_equality_or_matches_two_values() {
        let col = vec![1, 5, 10, 15];
        let mut mask = vec![true; 4];
        select_search(&mut mask, &col, &[(5, None), (15, None)], LogicalOp::And, 0).unwrap();
        assert_eq!(mask, vec![false, true, false, true]);
    }

    #[test]
    fn search_with_three_values_is_a_plan_error() {
        let col = vec![1, 2, 3];
        let mut mask = vec![true; 3];
        let err = select_search(&mut mask, &col, &[(1, None), (2, None), (3, None)], LogicalOp::None, 7);
        assert!(err.is_err());
    }
}
