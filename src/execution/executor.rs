//! The plan executor (§4.6): walks the scheduled order produced by the
//! plan inspector, dispatching each operator to a kernel and managing
//! table/column lifetimes through a single `HashMap<OperatorId, Table>`.
//! An operator that consumes a table removes it from the map (a real
//! move); an operator that produces one inserts it under its own id. A
//! table with no further consumer is simply never reinserted, which is
//! exactly the "kill at `table_last_used`" rule with no manual bookkeeping.

use std::collections::HashMap;

use tracing::{info, info_span};

use crate::catalog;
use crate::config::ExecutorConfig;
use crate::error::{ExecError, Result};
use crate::execution::filter;
use crate::execution::inspector::{self, PlanInfo};
use crate::execution::kernels::{aggregate, join, projection, sort};
use crate::execution::loader::ColumnLoader;
use crate::model::{Column, ColumnId, Table};
use crate::plan::{Expr, Plan, RelNode};

pub struct Executor<'a, L: ColumnLoader> {
    loader: &'a L,
    config: ExecutorConfig,
}

impl<'a, L: ColumnLoader> Executor<'a, L> {
    pub fn new(loader: &'a L, config: ExecutorConfig) -> Self {
        Executor { loader, config }
    }

    pub fn execute(&self, plan: &Plan) -> Result<Table> {
        // Best-effort: rayon's global pool can only be sized once per
        // process, so a second differently-configured executor in the same
        // process simply keeps running on whatever pool came first.
        if let Some(n) = self.config.rayon_threads {
            let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
        }

        let info = inspector::inspect(plan)?;
        let mut tables: HashMap<usize, Table> = HashMap::with_capacity(plan.rels.len());
        self.run(&plan.rels, &info, &mut tables)?;

        let last = plan.rels.len().checked_sub(1).ok_or_else(|| ExecError::plan(0, "empty plan"))?;
        tables
            .remove(&last)
            .ok_or_else(|| ExecError::internal(last, "final operator produced no table"))
    }

    fn run(&self, rels: &[RelNode], info: &PlanInfo, tables: &mut HashMap<usize, Table>) -> Result<()> {
        for &op_id in &info.dag_order {
            self.dispatch(op_id, &rels[op_id], info, tables)?;
        }
        Ok(())
    }

    fn dispatch(&self, op_id: usize, rel: &RelNode, info: &PlanInfo, tables: &mut HashMap<usize, Table>) -> Result<()> {
        match rel {
            RelNode::TableScan { tables: names } => {
                let span = info_span!("table_scan", op_id, table = names.first().map(String::as_str).unwrap_or(""));
                let _enter = span.enter();
                let table = self.scan(op_id, names, info)?;
                tables.insert(op_id, table);
            }
            RelNode::Filter { condition } => {
                let span = info_span!("filter", op_id);
                let _enter = span.enter();
                let mut table = take_predecessor(tables, op_id)?;
                filter::apply_filter(&mut table, condition, op_id)?;
                tables.insert(op_id, table);
            }
            RelNode::Project { exprs } => {
                let span = info_span!("project", op_id);
                let _enter = span.enter();
                let mut table = take_predecessor(tables, op_id)?;
                projection::project(&mut table, exprs, op_id)?;
                tables.insert(op_id, table);
            }
            RelNode::Aggregate { group, aggs } => {
                let span = info_span!("aggregate", op_id, grouped = !group.is_empty());
                let _enter = span.enter();
                let mut table = take_predecessor(tables, op_id)?;
                if group.is_empty() {
                    let operand = aggs
                        .first()
                        .and_then(|a| a.operands.first())
                        .copied()
                        .ok_or_else(|| ExecError::plan(op_id, "scalar SUM requires one operand"))?;
                    aggregate::scalar_sum(&mut table, operand, op_id)?;
                } else {
                    aggregate::group_by(&mut table, group, aggs, &self.config, op_id)?;
                }
                tables.insert(op_id, table);
            }
            RelNode::Sort { keys } => {
                let span = info_span!("sort", op_id);
                let _enter = span.enter();
                let mut table = take_predecessor(tables, op_id)?;
                sort::sort(&mut table, keys, op_id)?;
                tables.insert(op_id, table);
            }
            RelNode::Join { inputs, condition } => {
                let span = info_span!("join", op_id);
                let _enter = span.enter();
                self.dispatch_join(op_id, *inputs, condition, info, tables)?;
            }
        }
        Ok(())
    }

    fn scan(&self, op_id: usize, names: &[String], info: &PlanInfo) -> Result<Table> {
        let table_name = names.first().ok_or_else(|| ExecError::plan(op_id, "table scan names no table"))?;
        let mut needed: Vec<ColumnId> = info
            .loaded_columns
            .get(table_name)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        needed.sort_unstable();

        let mut columns = Vec::with_capacity(needed.len());
        let mut column_indices = HashMap::with_capacity(needed.len());
        let mut row_count = 0usize;
        for col_id in needed {
            let (values, len) = self.loader.load(table_name, col_id)?;
            row_count = len;
            column_indices.insert(col_id, columns.len());
            columns.push(Column::int32(values));
        }

        let mut table = Table::new(table_name.clone(), columns, column_indices, row_count);
        if let Some(group_cols) = info.group_by_columns.get(table_name) {
            table.group_by_column = group_cols.first().copied();
        }
        Ok(table)
    }

    fn dispatch_join(
        &self,
        op_id: usize,
        inputs: [usize; 2],
        condition: &Expr,
        info: &PlanInfo,
        tables: &mut HashMap<usize, Table>,
    ) -> Result<()> {
        let [left_id, right_id] = inputs;
        let mut left = tables
            .remove(&left_id)
            .ok_or_else(|| ExecError::internal(op_id, format!("join's left input {left_id} was never produced")))?;
        let right = tables
            .remove(&right_id)
            .ok_or_else(|| ExecError::internal(op_id, format!("join's right input {right_id} was never produced")))?;

        if left.name != catalog::FACT_TABLE {
            return Err(ExecError::plan(op_id, format!("join's left side must be '{}', found '{}'", catalog::FACT_TABLE, left.name)));
        }

        let left_count = info
            .join_left_width
            .get(&op_id)
            .copied()
            .ok_or_else(|| ExecError::internal(op_id, "plan inspector recorded no left-schema width for this join"))?;
        let (fact_key, dimension_key) = equi_join_keys(condition, left_count, op_id)?;

        let last_use = info.table_last_used.get(&right.name).copied();
        if last_use == Some(op_id) {
            info!(op_id, dimension = right.name.as_str(), "choosing filter-join");
            join::filter_join(&mut left, &right, fact_key, dimension_key, op_id)?;
        } else {
            info!(op_id, dimension = right.name.as_str(), "choosing full-join");
            let group_by = right
                .group_by_column
                .ok_or_else(|| ExecError::plan(op_id, format!("full-join needs a known group-by column on '{}'", right.name)))?;
            join::full_join(&mut left, &right, fact_key, dimension_key, group_by, left_count, op_id)?;
        }

        tables.insert(op_id, left);
        Ok(())
    }
}

fn take_predecessor(tables: &mut HashMap<usize, Table>, op_id: usize) -> Result<Table> {
    let pred = op_id.checked_sub(1).ok_or_else(|| ExecError::plan(op_id, "unary operator has no predecessor (id 0)"))?;
    tables
        .remove(&pred)
        .ok_or_else(|| ExecError::internal(op_id, format!("predecessor {pred} was never produced")))
}

/// Resolves a `Column = Column` equi-join condition's two sides to a
/// (fact-side, dimension-side) logical id pair. `left_count` (the plan
/// inspector's recorded left-schema width, §4.5) is the boundary a
/// condition's column positions split on: a position under it addresses
/// the left table directly by that id, a position at or above it addresses
/// the right table at `position - left_count` (§6).
fn equi_join_keys(condition: &Expr, left_count: usize, op_id: usize) -> Result<(ColumnId, ColumnId)> {
    let Expr::Expr { op, operands } = condition else {
        return Err(ExecError::plan(op_id, "join condition must be an equality expression"));
    };
    if op != "=" && op != "==" {
        return Err(ExecError::plan(op_id, format!("unsupported join operator '{op}', only equi-joins are supported")));
    }
    let [a, b] = operands.as_slice() else {
        return Err(ExecError::plan(op_id, "join condition expects exactly two operands"));
    };
    let a_input = column_input(a, op_id)?;
    let b_input = column_input(b, op_id)?;

    match (a_input < left_count, b_input < left_count) {
        (true, false) => Ok((a_input, b_input - left_count)),
        (false, true) => Ok((b_input, a_input - left_count)),
        _ => Err(ExecError::plan(op_id, "join condition must reference exactly one column from each side")),
    }
}

fn column_input(expr: &Expr, op_id: usize) -> Result<ColumnId> {
    match expr {
        Expr::Column { input } => Ok(*input),
        _ => Err(ExecError::plan(op_id, "join condition operands must be bare column references")),
    }
}
