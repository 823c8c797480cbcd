//! The plan inspector (§4.5): a pre-pass over the whole plan that computes,
//! for every table, which columns are ever referenced and the last
//! operator id that touches it, and a topological schedule over the
//! operator DAG with the fact table's own scan delayed behind its sibling
//! scans.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::catalog;
use crate::error::{ExecError, Result};
use crate::model::ColumnId;
use crate::plan::{Expr, Plan, RelNode};

/// Everything the executor needs that can be computed without touching any
/// actual data: per-table column demand, per-table last use, per-table
/// grouping columns, and a valid schedule.
#[derive(Debug, Default)]
pub struct PlanInfo {
    pub loaded_columns: HashMap<String, HashSet<ColumnId>>,
    pub table_last_used: HashMap<String, usize>,
    pub group_by_columns: HashMap<String, Vec<ColumnId>>,
    pub dag_order: Vec<usize>,
    /// For each `Join` operator id, the width of its left input's output
    /// schema — the boundary a join condition's column positions split on
    /// (positions below it address the left table, at or above it the
    /// right, offset by this width). Recorded here because the runtime
    /// `Table`'s own logical column count only reflects the columns that
    /// were actually *loaded*, which can be a strict subset of this width
    /// when the left input is a bare scan/filter chain (§4.5, §6).
    pub join_left_width: HashMap<usize, usize>,
}

/// A unary operator's predecessor is always the rel at `id - 1` (§6); this
/// is an internal invariant check, not a user-facing plan shape the caller
/// could have gotten right or wrong on their own.
fn predecessor(op_id: usize) -> Result<usize> {
    op_id
        .checked_sub(1)
        .ok_or_else(|| ExecError::plan(op_id, "unary operator has no predecessor (id 0)"))
}

pub fn inspect(plan: &Plan) -> Result<PlanInfo> {
    let mut info = PlanInfo::default();
    let schemas = compute_schemas_and_demand(plan, &mut info)?;
    let _ = schemas; // only needed to build the demand maps above
    info.dag_order = schedule(plan)?;
    Ok(info)
}

/// One entry of an operator's output schema: which original table a column
/// at this position traces back to, and its table-local column id.
type Schema = Vec<(String, ColumnId)>;

fn compute_schemas_and_demand(plan: &Plan, info: &mut PlanInfo) -> Result<Vec<Schema>> {
    let n = plan.rels.len();
    let mut schemas: Vec<Schema> = vec![Vec::new(); n];

    for (op_id, rel) in plan.rels.iter().enumerate() {
        match rel {
            RelNode::TableScan { tables } => {
                let table = tables
                    .first()
                    .ok_or_else(|| ExecError::plan(op_id, "table scan names no table"))?;
                let count = catalog::column_count(table, op_id)?;
                schemas[op_id] = (0..count).map(|c| (table.clone(), c)).collect();
            }
            RelNode::Filter { condition } => {
                let pred = predecessor(op_id)?;
                walk_expr(condition, &schemas[pred], info, op_id)?;
                schemas[op_id] = schemas[pred].clone();
            }
            RelNode::Project { exprs } => {
                let pred = predecessor(op_id)?;
                let mut out = Schema::with_capacity(exprs.len());
                for (pos, expr) in exprs.iter().enumerate() {
                    walk_expr(expr, &schemas[pred], info, op_id)?;
                    let provenance = match expr {
                        Expr::Column { input } => schemas[pred]
                            .get(*input)
                            .cloned()
                            .ok_or_else(|| out_of_range(op_id, *input))?,
                        _ => (fallback_table(&schemas[pred]), pos),
                    };
                    out.push(provenance);
                }
                schemas[op_id] = out;
            }
            RelNode::Aggregate { group, aggs } => {
                let pred = predecessor(op_id)?;
                let mut out = Schema::with_capacity(group.len() + 1);
                for &g in group {
                    let (table, col) = schemas[pred]
                        .get(g)
                        .cloned()
                        .ok_or_else(|| out_of_range(op_id, g))?;
                    info.loaded_columns.entry(table.clone()).or_default().insert(col);
                    info.table_last_used.insert(table.clone(), op_id);
                    info.group_by_columns.entry(table.clone()).or_default().push(col);
                    out.push((table, col));
                }
                for agg in aggs {
                    for &operand in &agg.operands {
                        let (table, col) = schemas[pred]
                            .get(operand)
                            .cloned()
                            .ok_or_else(|| out_of_range(op_id, operand))?;
                        info.loaded_columns.entry(table.clone()).or_default().insert(col);
                        info.table_last_used.insert(table, op_id);
                    }
                }
                out.push((fallback_table(&schemas[pred]), group.len()));
                schemas[op_id] = out;
            }
            RelNode::Join { inputs, condition } => {
                let [left, right] = *inputs;
                if left >= n || right >= n {
                    return Err(ExecError::plan(op_id, "join references an out-of-range input id"));
                }
                info.join_left_width.insert(op_id, schemas[left].len());
                schemas[op_id] = schemas[left]
                    .iter()
                    .cloned()
                    .chain(schemas[right].iter().cloned())
                    .collect();
                walk_expr(condition, &schemas[op_id], info, op_id)?;
            }
            RelNode::Sort { keys } => {
                let pred = predecessor(op_id)?;
                for key in keys {
                    let (table, col) = schemas[pred]
                        .get(key.column)
                        .cloned()
                        .ok_or_else(|| out_of_range(op_id, key.column))?;
                    info.loaded_columns.entry(table.clone()).or_default().insert(col);
                    info.table_last_used.insert(table, op_id);
                }
                schemas[op_id] = schemas[pred].clone();
            }
        }
    }

    Ok(schemas)
}

fn out_of_range(op_id: usize, input: ColumnId) -> ExecError {
    ExecError::plan(op_id, format!("expression references out-of-range column input {input}"))
}

/// Literal/arithmetic projection outputs and aggregate results have no
/// single originating table column; they are tagged with whatever table
/// the rest of the predecessor's schema came from, purely so every schema
/// entry keeps the `(table, col)` shape the walk below expects.
fn fallback_table(schema: &Schema) -> String {
    schema.first().map(|(t, _)| t.clone()).unwrap_or_default()
}

fn walk_expr(expr: &Expr, schema: &Schema, info: &mut PlanInfo, op_id: usize) -> Result<()> {
    match expr {
        Expr::Column { input } => {
            let (table, col) = schema
                .get(*input)
                .cloned()
                .ok_or_else(|| out_of_range(op_id, *input))?;
            info.loaded_columns.entry(table.clone()).or_default().insert(col);
            info.table_last_used.insert(table, op_id);
            Ok(())
        }
        Expr::Literal { .. } => Ok(()),
        Expr::Expr { operands, .. } => {
            for operand in operands {
                walk_expr(operand, schema, info, op_id)?;
            }
            Ok(())
        }
    }
}

/// Produces a topological order over the operator DAG with one extra rule:
/// the fact table's own table-scan is deferred up to twice among the
/// initially-ready nodes, so dimension tables finish loading and filtering
/// before the fact table is ever touched (§4.5).
fn schedule(plan: &Plan) -> Result<Vec<usize>> {
    let n = plan.rels.len();
    let mut indegree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut is_fact_scan = vec![false; n];

    for (op_id, rel) in plan.rels.iter().enumerate() {
        let deps: Vec<usize> = match rel {
            RelNode::TableScan { tables } => {
                if let Some(t) = tables.first() {
                    is_fact_scan[op_id] = catalog::is_fact_table(t);
                }
                Vec::new()
            }
            RelNode::Filter { .. } | RelNode::Project { .. } | RelNode::Aggregate { .. } | RelNode::Sort { .. } => {
                vec![predecessor(op_id)?]
            }
            RelNode::Join { inputs, .. } => vec![inputs[0], inputs[1]],
        };
        indegree[op_id] = deps.len();
        for dep in deps {
            if dep >= n {
                return Err(ExecError::plan(op_id, "dependency references an out-of-range operator id"));
            }
            dependents[dep].push(op_id);
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut delays_used = 0usize;

    while let Some(candidate) = queue.pop_front() {
        if is_fact_scan[candidate] && delays_used < 2 && !queue.is_empty() {
            delays_used += 1;
            queue.push_back(candidate);
            continue;
        }
        order.push(candidate);
        for &dependent in &dependents[candidate] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() != n {
        return Err(ExecError::plan(0, "plan's operator DAG contains a cycle"));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(table: &str) -> RelNode {
        RelNode::TableScan { tables: vec![table.to_string()] }
    }

    fn join(l: usize, r: usize) -> RelNode {
        RelNode::Join {
            inputs: [l, r],
            condition: Expr::Expr {
                op: "=".into(),
                operands: vec![Expr::Column { input: 0 }, Expr::Column { input: 0 }],
            },
        }
    }

    /// S6: a valid order delays `lineorder`'s scan past its sibling scans.
    #[test]
    fn schedule_delays_fact_table_scan() {
        let plan = Plan {
            rels: vec![scan("lineorder"), scan("ddate"), scan("part"), join(0, 1), join(3, 2)],
        };
        let order = schedule(&plan).unwrap();
        assert_eq!(order, vec![1, 2, 0, 3, 4]);
    }

    /// Testable property #7: every operator appears after all its inputs.
    #[test]
    fn schedule_respects_dependency_order() {
        let plan = Plan {
            rels: vec![scan("lineorder"), scan("ddate"), scan("part"), join(0, 1), join(3, 2)],
        };
        let order = schedule(&plan).unwrap();
        let position: HashMap<usize, usize> = order.iter().enumerate().map(|(p, &id)| (id, p)).collect();
        assert!(position[&0] < position[&3]);
        assert!(position[&1] < position[&3]);
        assert!(position[&3] < position[&4]);
        assert!(position[&2] < position[&4]);
    }

    #[test]
    fn join_records_left_schema_width() {
        let plan = Plan {
            rels: vec![scan("lineorder"), scan("ddate"), join(0, 1)],
        };
        let info = inspect(&plan).unwrap();
        // lineorder's catalogue width (17), not the number of columns the
        // join condition itself happens to touch.
        assert_eq!(info.join_left_width[&2], 17);
    }

    #[test]
    fn filter_records_demand_on_its_table() {
        let plan = Plan {
            rels: vec![
                scan("lineorder"),
                RelNode::Filter {
                    condition: Expr::Expr {
                        op: ">=".into(),
                        operands: vec![Expr::Column { input: 5 }, Expr::Literal { value: 1, range_set: None }],
                    },
                },
            ],
        };
        let info = inspect(&plan).unwrap();
        assert!(info.loaded_columns["lineorder"].contains(&5));
        assert_eq!(info.table_last_used["lineorder"], 1);
    }
}
