pub mod layout;
pub mod planner;
pub mod primes;
pub mod shards;
pub mod size;
pub mod statistics;

#[cfg(test)]
mod shards_test;
#[cfg(test)]
mod statistics_test;

pub use layout::PartitionLayout;
pub use planner::{PartitionPlan, ShardPlanner};
pub use shards::CuboidShards;
pub use size::{cuboid_sizes_mb, estimate_cuboid_size_mb};
pub use statistics::{
    CuboidStatistics, CuboidStatsCollector, DEFAULT_SAMPLING_PERCENTAGE, read_row_count_map,
    read_statistics, row_count_map, write_statistics,
};
