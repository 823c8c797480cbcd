//! The column loader boundary (§6): the core never touches a filesystem
//! directly, it only consumes whatever implements `ColumnLoader`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExecError, Result};

/// Supplies one table's one column as a freshly-loaded buffer. Implementors
/// own the actual storage format; the core only needs a 32-bit integer
/// buffer and its length back.
pub trait ColumnLoader {
    fn load(&self, table: &str, col_index: usize) -> Result<(Vec<i32>, usize)>;
}

/// Reference loader: reads `<table>.<col_index>.bin` under a base directory
/// as a flat sequence of little-endian `i32`s. Sufficient for demonstration
/// and tests; raw column storage on disk is explicitly out of scope for the
/// execution core (§1) beyond this minimal reference implementation.
pub struct FileColumnLoader {
    base_dir: PathBuf,
}

impl FileColumnLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn path_for(&self, table: &str, col_index: usize) -> PathBuf {
        self.base_dir.join(format!("{table}.{col_index}.bin"))
    }
}

impl ColumnLoader for FileColumnLoader {
    fn load(&self, table: &str, col_index: usize) -> Result<(Vec<i32>, usize)> {
        let path: &Path = &self.path_for(table, col_index);
        let bytes = fs::read(path).map_err(|e| {
            ExecError::loader(table, col_index, format!("failed to read '{}': {e}", path.display()))
        })?;
        if bytes.len() % 4 != 0 {
            return Err(ExecError::loader(
                table,
                col_index,
                format!("'{}' has {} bytes, not a multiple of 4", path.display(), bytes.len()),
            ));
        }
        let values: Vec<i32> = bytes.chunks_exact(4).map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect();
        let len = values.len();
        Ok((values, len))
    }
}
