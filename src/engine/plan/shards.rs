use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::errors::PlanError;
use crate::shared::hash::stable_hash64;

const LOG_TARGET: &str = "engine::plan::shards";

/// Per-cuboid shard counts over a ring of `region_count` shards. A cuboid's
/// shards are consecutive, starting at a hash of its id and wrapping.
/// Cuboids without an entry occupy a single shard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuboidShards {
    region_count: u16,
    shards: BTreeMap<u64, u16>,
}

impl CuboidShards {
    pub fn new(region_count: u16) -> Self {
        Self {
            region_count: region_count.max(1),
            shards: BTreeMap::new(),
        }
    }

    /// Records `count` shards for `cuboid`, clamped to `[1, region_count]`.
    pub fn insert(&mut self, cuboid: u64, count: u16) {
        self.shards
            .insert(cuboid, count.clamp(1, self.region_count));
    }

    pub fn region_count(&self) -> u16 {
        self.region_count
    }

    pub fn shard_count(&self, cuboid: u64) -> u16 {
        self.shards.get(&cuboid).copied().unwrap_or(1)
    }

    pub fn start_shard(&self, cuboid: u64) -> u16 {
        (stable_hash64(&cuboid) % self.region_count as u64) as u16
    }

    /// Shard ids holding `cuboid`, in ring order from its start shard.
    pub fn shards_of(&self, cuboid: u64) -> Vec<u16> {
        let start = self.start_shard(cuboid) as u32;
        let n = self.region_count as u32;
        (0..self.shard_count(cuboid) as u32)
            .map(|i| ((start + i) % n) as u16)
            .collect()
    }

    /// Shard for one row, chosen by hashing the row key body (the dimension
    /// codes) within the cuboid's shards.
    pub fn shard_for_row(&self, cuboid: u64, key_body: &[u8]) -> u16 {
        let offset = stable_hash64(key_body) % self.shard_count(cuboid) as u64;
        ((self.start_shard(cuboid) as u64 + offset) % self.region_count as u64) as u16
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u16)> + '_ {
        self.shards.iter().map(|(&c, &n)| (c, n))
    }

    /// Region split keys: shard ids `1..region_count` as 2-byte big-endian.
    pub fn split_keys(&self) -> Vec<Vec<u8>> {
        (1..self.region_count)
            .map(|shard| shard.to_be_bytes().to_vec())
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<(), PlanError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.flush()?;
        info!(
            target: LOG_TARGET,
            path = %path.display(),
            regions = self.region_count,
            cuboids = self.shards.len(),
            "Cuboid shards saved"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let file = File::open(path)?;
        let shards: CuboidShards = serde_json::from_reader(BufReader::new(file))?;
        if shards.region_count == 0 {
            return Err(PlanError::Corrupt("cuboid shards with zero regions".into()));
        }
        Ok(shards)
    }
}
