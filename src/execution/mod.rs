//! The execution core (§2): the kernel library, the plan inspector, the
//! column-loader boundary, the filter condition-tree walker, and the
//! executor that ties them together.

pub mod executor;
pub mod filter;
pub mod inspector;
pub mod kernels;
pub mod loader;

pub use executor::Executor;
pub use inspector::{inspect, PlanInfo};
pub use loader::{ColumnLoader, FileColumnLoader};
