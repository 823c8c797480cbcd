//! The table catalogue: a static mapping from table name to its total
//! column count (§6). The plan inspector consults it to seed a table-scan's
//! output schema and to validate that a plan never references a column
//! index out of range.

use crate::error::{ExecError, Result};

/// `(table name, column count)` pairs for the Star-Schema Benchmark tables
/// this executor targets.
const TABLES: &[(&str, usize)] = &[
    ("lineorder", 17),
    ("part", 9),
    ("supplier", 7),
    ("customer", 8),
    ("ddate", 17),
];

/// The name of the fact table. Joins always place it on the probe side;
/// the plan inspector also uses it to delay the fact table's own
/// table-scan (§4.5) and the executor uses it to pick a join direction
/// (§4.3).
pub const FACT_TABLE: &str = "lineorder";

/// Looks up the number of columns a table has, or a plan error if the
/// catalogue has never heard of that table name.
pub fn column_count(table: &str, op_id: usize) -> Result<usize> {
    TABLES
        .iter()
        .find(|(name, _)| *name == table)
        .map(|(_, count)| *count)
        .ok_or_else(|| ExecError::plan(op_id, format!("unknown table '{table}'")))
}

pub fn is_fact_table(table: &str) -> bool {
    table == FACT_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tables_resolve() {
        assert_eq!(column_count("lineorder", 0).unwrap(), 17);
        assert_eq!(column_count("part", 0).unwrap(), 9);
        assert_eq!(column_count("supplier", 0).unwrap(), 7);
        assert_eq!(column_count("customer", 0).unwrap(), 8);
        assert_eq!(column_count("ddate", 0).unwrap(), 17);
    }

    #[test]
    fn unknown_table_is_a_plan_error() {
        assert!(column_count("nonexistent", 3).is_err());
    }

    #[test]
    fn fact_table_is_lineorder() {
        assert!(is_fact_table("lineorder"));
        assert!(!is_fact_table("ddate"));
    }
}
