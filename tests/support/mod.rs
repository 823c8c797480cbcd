use std::io::Write;
use std::path::Path;

/// Writes one table's column as `<table>.<col_index>.bin`, the flat
/// little-endian `i32` layout `FileColumnLoader` expects.
pub fn write_column(dir: &Path, table: &str, col_index: usize, values: &[i32]) {
    let path = dir.join(format!("{table}.{col_index}.bin"));
    let mut file = std::fs::File::create(path).unwrap();
    for v in values {
        file.write_all(&v.to_le_bytes()).unwrap();
    }
}
