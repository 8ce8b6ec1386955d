pub mod database;
pub mod runs;

pub use database::{Database, PoolConfig, SharedDatabase};
pub use runs::{DimensionTable, RunStore, RunSummary, RunWriter};
