//! End-to-end: a full-join propagating `ddate.year` into `lineorder`,
//! followed by a group-by SUM(revenue) keyed on that propagated year
//! (extends S4 with the group-by stage S2 exercises in isolation).

mod support;

use std::collections::HashMap;

use ssb_executor::execution::FileColumnLoader;
use ssb_executor::plan::{Agg, Expr, Plan, RelNode};
use ssb_executor::{Executor, ExecutorConfig};

#[test]
fn full_join_then_group_by_sums_revenue_per_propagated_year() {
    let dir = tempfile::tempdir().unwrap();
    // lineorder: col 5 = orderdate (join key), col 2 = revenue
    support::write_column(dir.path(), "lineorder", 5, &[1, 2, 3, 1]);
    support::write_column(dir.path(), "lineorder", 2, &[10, 20, 30, 40]);
    // ddate: col 0 = datekey (join key), col 4 = year (group-by column)
    support::write_column(dir.path(), "ddate", 0, &[1, 2, 3]);
    support::write_column(dir.path(), "ddate", 4, &[1992, 1993, 1993]);

    // left width = lineorder's full catalogue column count (17); the join
    // condition's right-side operand is offset past it.
    let left_width = 17;
    let plan = Plan {
        rels: vec![
            RelNode::TableScan { tables: vec!["lineorder".into()] },
            RelNode::TableScan { tables: vec!["ddate".into()] },
            RelNode::Join {
                inputs: [0, 1],
                condition: Expr::Expr {
                    op: "=".into(),
                    operands: vec![Expr::Column { input: 5 }, Expr::Column { input: left_width }],
                },
            },
            RelNode::Aggregate {
                group: vec![left_width + 4],
                aggs: vec![Agg { agg: "SUM".into(), operands: vec![2] }],
            },
        ],
    };

    let loader = FileColumnLoader::new(dir.path());
    let executor = Executor::new(&loader, ExecutorConfig::default());
    let result = executor.execute(&plan).unwrap();

    assert_eq!(result.row_count, 2); // bijective over {1992, 1993}
    assert_eq!(result.live_row_count(), 2);

    let mut sums: HashMap<i32, u64> = HashMap::new();
    for row in 0..result.row_count {
        if !result.selection[row] {
            continue;
        }
        let year = result.column(0).unwrap().as_int32().unwrap().values[row];
        let sum = result.column(1).unwrap().as_accumulator().unwrap()[row];
        sums.insert(year, sum);
    }
    assert_eq!(sums.get(&1992), Some(&50));
    assert_eq!(sums.get(&1993), Some(&50));
}
