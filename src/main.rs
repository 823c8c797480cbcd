// ssb-executor: runs a single pre-planned query against a directory of
// flat binary columns and prints the result table.

use std::path::PathBuf;
use std::process::ExitCode;

use ssb_executor::execution::FileColumnLoader;
use ssb_executor::model::ColumnData;
use ssb_executor::{ExecutorConfig, Executor, Plan};

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).with_level(true).init();

    let mut args = std::env::args().skip(1);
    let (Some(base_dir), Some(plan_path)) = (args.next(), args.next()) else {
        eprintln!("usage: ssb-run <column-base-dir> <plan.json>");
        return ExitCode::FAILURE;
    };

    match run(&base_dir, &plan_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("query failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(base_dir: &str, plan_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let plan_json = std::fs::read_to_string(plan_path)?;
    let plan: Plan = serde_json::from_str(&plan_json)?;

    let loader = FileColumnLoader::new(PathBuf::from(base_dir));
    let executor = Executor::new(&loader, ExecutorConfig::default());
    let result = executor.execute(&plan)?;

    // Result rows are printed in column-index (logical id) order, not
    // physical storage order (§6).
    let mut logical_ids: Vec<usize> = result.column_indices.keys().copied().collect();
    logical_ids.sort_unstable();

    for row in 0..result.row_count {
        if !result.selection[row] {
            continue;
        }
        let mut fields = Vec::with_capacity(logical_ids.len());
        for &logical_id in &logical_ids {
            let column = result.column(logical_id).expect("logical id came from this table's own index map");
            let field = match &column.data {
                ColumnData::Int32(c) => c.values[row].to_string(),
                ColumnData::Accumulator(v) => v[row].to_string(),
            };
            fields.push(field);
        }
        println!("{}", fields.join(","));
    }
    Ok(())
}
