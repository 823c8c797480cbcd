//! End-to-end S1: scalar filter + arithmetic SUM, run through the full
//! executor against real column files.

mod support;

use ssb_executor::execution::FileColumnLoader;
use ssb_executor::model::ColumnData;
use ssb_executor::plan::{Agg, Expr, Plan, RelNode};
use ssb_executor::{Executor, ExecutorConfig};

fn cmp(op: &str, input: usize, value: i64) -> Expr {
    Expr::Expr { op: op.into(), operands: vec![Expr::Column { input }, Expr::Literal { value, range_set: None }] }
}

#[test]
fn s1_scalar_filter_and_sum() {
    let dir = tempfile::tempdir().unwrap();
    support::write_column(dir.path(), "lineorder", 0, &[19930115, 19940301, 19930601]); // orderdate
    support::write_column(dir.path(), "lineorder", 1, &[10, 30, 5]); // quantity
    support::write_column(dir.path(), "lineorder", 2, &[100, 200, 50]); // extendedprice
    support::write_column(dir.path(), "lineorder", 3, &[2, 2, 3]); // discount

    let plan = Plan {
        rels: vec![
            RelNode::TableScan { tables: vec!["lineorder".into()] },
            RelNode::Filter {
                condition: Expr::Expr {
                    op: "AND".into(),
                    operands: vec![
                        cmp(">=", 0, 19930101),
                        cmp("<=", 0, 19940101),
                        cmp(">=", 3, 1),
                        cmp("<=", 3, 3),
                        cmp("<", 1, 25),
                    ],
                },
            },
            RelNode::Project {
                exprs: vec![Expr::Expr { op: "*".into(), operands: vec![Expr::Column { input: 2 }, Expr::Column { input: 3 }] }],
            },
            RelNode::Aggregate { group: vec![], aggs: vec![Agg { agg: "SUM".into(), operands: vec![0] }] },
        ],
    };

    let loader = FileColumnLoader::new(dir.path());
    let executor = Executor::new(&loader, ExecutorConfig::default());
    let result = executor.execute(&plan).unwrap();

    assert_eq!(result.row_count, 1);
    assert!(result.selection[0]);
    match &result.column(0).unwrap().data {
        ColumnData::Accumulator(v) => assert_eq!(v[0], 350),
        ColumnData::Int32(_) => panic!("expected an aggregate-result column"),
    }
}
