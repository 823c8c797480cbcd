//! The column/table model (§3). A column is a contiguous buffer plus
//! advisory min/max hints; the aggregate-result distinction is a variant of
//! a tagged union, never a reinterpreted buffer (§9, "aggregate-result
//! column").

/// A single column's storage. `Int32` is an ordinary 32-bit integer column
/// with cached min/max hints; `Accumulator` holds one 64-bit unsigned
/// accumulator per logical row and is produced only by the aggregate
/// kernels (§4.4).
#[derive(Debug, Clone)]
pub enum ColumnData {
    Int32(Int32Column),
    Accumulator(Vec<u64>),
}

/// A plain integer column: its buffer and the min/max bounds every live
/// value must satisfy when the hints are consulted (§3's min/max
/// invariant).
#[derive(Debug, Clone)]
pub struct Int32Column {
    pub values: Vec<i32>,
    pub min: i32,
    pub max: i32,
}

impl Int32Column {
    pub fn new(values: Vec<i32>) -> Self {
        let (min, max) = scan_min_max(&values);
        Self { values, min, max }
    }

    /// Builds a column from a buffer whose min/max are already known (e.g.
    /// after a join rewrite that must adopt the dimension's hints rather
    /// than recompute them from the rewritten fact data, §4.3).
    pub fn with_hints(values: Vec<i32>, min: i32, max: i32) -> Self {
        Self { values, min, max }
    }

    pub fn constant(value: i32, len: usize) -> Self {
        Self {
            values: vec![value; len],
            min: value,
            max: value,
        }
    }

    pub fn recompute_hints(&mut self) {
        let (min, max) = scan_min_max(&self.values);
        self.min = min;
        self.max = max;
    }
}

/// Scans a buffer for its min/max. An empty buffer has no values to bound,
/// so `(0, 0)` is returned — SSB tables are never empty in practice, and any
/// kernel that would divide by an empty range (`R = max - min + 1`) treats a
/// zero-width domain as a single bucket, which is the only sound reading of
/// "no values observed".
fn scan_min_max(values: &[i32]) -> (i32, i32) {
    if values.is_empty() {
        return (0, 0);
    }
    let mut min = values[0];
    let mut max = values[0];
    for &v in &values[1..] {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    (min, max)
}

/// A single output column of a table: its storage plus a logical length
/// that must match the owning table's `row_count` (§3's length invariant).
#[derive(Debug, Clone)]
pub struct Column {
    pub data: ColumnData,
}

impl Column {
    pub fn int32(values: Vec<i32>) -> Self {
        Column {
            data: ColumnData::Int32(Int32Column::new(values)),
        }
    }

    pub fn accumulator(values: Vec<u64>) -> Self {
        Column {
            data: ColumnData::Accumulator(values),
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Int32(c) => c.values.len(),
            ColumnData::Accumulator(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_aggregate_result(&self) -> bool {
        matches!(self.data, ColumnData::Accumulator(_))
    }

    pub fn as_int32(&self) -> Option<&Int32Column> {
        match &self.data {
            ColumnData::Int32(c) => Some(c),
            ColumnData::Accumulator(_) => None,
        }
    }

    pub fn as_int32_mut(&mut self) -> Option<&mut Int32Column> {
        match &mut self.data {
            ColumnData::Int32(c) => Some(c),
            ColumnData::Accumulator(_) => None,
        }
    }

    pub fn as_accumulator(&self) -> Option<&[u64]> {
        match &self.data {
            ColumnData::Accumulator(v) => Some(v),
            ColumnData::Int32(_) => None,
        }
    }
}
