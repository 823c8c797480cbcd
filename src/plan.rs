//! The plan object the core consumes (§6). The SQL→plan translator is an
//! external collaborator; this module only describes the wire shape it
//! hands us, deserialised with `serde_json`.

use serde::Deserialize;

use crate::model::ColumnId;

/// A full plan: `rels[i]`'s operator id is implicitly `i` — ids are never
/// carried as an explicit field.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub rels: Vec<RelNode>,
}

/// A logical operator. `Filter`, `Project`, `Aggregate`, and `Sort` are
/// unary and carry no explicit predecessor id: by the flattened-rel-list
/// convention this representation follows, a unary operator's input is
/// always the rel at `id - 1` (§6). `Join` is the DAG's only branching
/// point and so is the only variant with explicit input ids.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "relOp")]
pub enum RelNode {
    TableScan { tables: Vec<String> },
    Filter { condition: Expr },
    Project { exprs: Vec<Expr> },
    Aggregate { group: Vec<ColumnId>, aggs: Vec<Agg> },
    Join { inputs: [usize; 2], condition: Expr },
    /// Multi-key sort (§4.4a, supplemented from the original kernel
    /// inventory). Not part of the distilled plan grammar but restored
    /// here because SSB-family queries routinely end in an `ORDER BY`.
    Sort { keys: Vec<SortKey> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SortKey {
    pub column: ColumnId,
    pub ascending: bool,
}

/// A scalar expression. `Column.input` indexes into the *predecessor's*
/// output schema as tracked by the plan inspector (§4.5), not a raw table
/// column id.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "exprType")]
pub enum Expr {
    Column {
        input: ColumnId,
    },
    Literal {
        value: i64,
        #[serde(default, rename = "rangeSet")]
        range_set: Option<Vec<RangeEntry>>,
    },
    Expr {
        op: String,
        operands: Vec<Expr>,
    },
}

/// One entry of a `SEARCH` literal's `rangeSet` (§4.1, §6). `tag` is
/// carried through for diagnostics; the desugaring below dispatches purely
/// on how many entries the enclosing list has, matching the original
/// source's `size == 1` / `size == 2` handling.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeEntry {
    pub tag: String,
    pub lo: i64,
    #[serde(default)]
    pub hi: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Agg {
    pub agg: String,
    pub operands: Vec<ColumnId>,
}
