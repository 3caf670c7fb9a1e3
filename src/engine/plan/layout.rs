use serde::{Deserialize, Serialize};

use crate::engine::codec::RowKeyEncoder;
use crate::engine::plan::shards::CuboidShards;

/// How cuboid rows are spread over regions (partitions).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionLayout {
    /// One region per shard; the row key's shard prefix is the region.
    Sharded(CuboidShards),
    /// Rows are keyed with shard 0 and regions hold contiguous cuboid id
    /// ranges. `boundaries[i]` is the first cuboid of region `i + 1`.
    Split { boundaries: Vec<u64> },
}

impl PartitionLayout {
    pub fn region_count(&self) -> usize {
        match self {
            PartitionLayout::Sharded(shards) => shards.region_count() as usize,
            PartitionLayout::Split { boundaries } => boundaries.len() + 1,
        }
    }

    pub fn is_sharded(&self) -> bool {
        matches!(self, PartitionLayout::Sharded(_))
    }

    /// First row key of every region but the first.
    pub fn split_keys(&self) -> Vec<Vec<u8>> {
        match self {
            PartitionLayout::Sharded(shards) => shards.split_keys(),
            PartitionLayout::Split { boundaries } => boundaries
                .iter()
                .map(|&cuboid| RowKeyEncoder::header(0, cuboid))
                .collect(),
        }
    }

    /// Regions that may hold rows of `cuboid`.
    pub fn partitions_of(&self, cuboid: u64) -> Vec<u16> {
        match self {
            PartitionLayout::Sharded(shards) => shards.shards_of(cuboid),
            PartitionLayout::Split { boundaries } => {
                vec![boundaries.partition_point(|&b| b <= cuboid) as u16]
            }
        }
    }

    /// Shard prefix for a row's key and the region storing it.
    pub fn route(&self, cuboid: u64, key_body: &[u8]) -> (u16, u16) {
        match self {
            PartitionLayout::Sharded(shards) => {
                let shard = shards.shard_for_row(cuboid, key_body);
                (shard, shard)
            }
            PartitionLayout::Split { boundaries } => {
                (0, boundaries.partition_point(|&b| b <= cuboid) as u16)
            }
        }
    }

    /// Shard prefix used in row keys stored in `partition`.
    pub fn key_shard(&self, partition: u16) -> u16 {
        match self {
            PartitionLayout::Sharded(_) => partition,
            PartitionLayout::Split { .. } => 0,
        }
    }
}
