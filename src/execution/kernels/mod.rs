//! The kernel library (§4.1–4.4, §4.4a): pure functions over column
//! buffers. The executor is the only caller; each kernel takes the table(s)
//! it operates on directly rather than going through a trait-object
//! dispatch layer (§9, "dispatch over variants").

pub mod aggregate;
pub mod join;
pub mod projection;
pub mod selection;
pub mod sort;
