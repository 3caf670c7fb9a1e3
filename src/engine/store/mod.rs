pub mod local_endpoint;
pub mod partition_store;


pub use local_endpoint::{DEFAULT_ROWS_PER_BLOCK, LocalEndpoint};
pub use partition_store::{MemoryPartitionStore, PartitionWriter};
