pub mod builder;
pub mod memory;
pub mod queue;
pub mod table;
pub mod writer;

#[cfg(test)]
mod table_test;

pub use builder::{BuildSummary, BuildTask, InMemCubeBuilder};
pub use memory::MemoryBudget;
pub use queue::{Feeder, RowBatch, input_queue};
pub use table::CuboidTable;
pub use writer::{CollectingWriter, CuboidWriter};
