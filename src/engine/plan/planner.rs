use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::errors::PlanError;
use crate::engine::plan::layout::PartitionLayout;
use crate::engine::plan::primes::next_prime;
use crate::engine::plan::shards::CuboidShards;
use crate::engine::plan::size::cuboid_sizes_mb;
use crate::engine::plan::statistics::CuboidStatistics;
use crate::engine::schema::GtInfo;
use crate::shared::config::PlannerConfig;

const LOG_TARGET: &str = "engine::plan::planner";

/// Outcome of sizing a cube segment.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionPlan {
    pub total_size_mb: f64,
    pub region_count: usize,
    pub mb_per_region: f64,
    pub cuboid_sizes_mb: BTreeMap<u64, f64>,
    /// Estimated MB landing in each region, indexed by region.
    pub region_sizes_mb: Vec<f64>,
    pub layout: PartitionLayout,
}

impl PartitionPlan {
    pub fn split_keys(&self) -> Vec<Vec<u8>> {
        self.layout.split_keys()
    }
}

/// Turns cuboid row estimates into a region count and a shard or split
/// layout. Planning is a pure function of its inputs.
pub struct ShardPlanner {
    info: Arc<GtInfo>,
    config: PlannerConfig,
}

impl ShardPlanner {
    pub fn new(info: Arc<GtInfo>, config: PlannerConfig) -> Result<Self, PlanError> {
        validate_config(&config)?;
        Ok(Self { info, config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn plan(&self, stats: &CuboidStatistics) -> Result<PartitionPlan, PlanError> {
        let row_counts = stats.row_counts()?;
        self.plan_from_row_counts(&row_counts)
    }

    pub fn plan_from_row_counts(
        &self,
        row_counts: &BTreeMap<u64, u64>,
    ) -> Result<PartitionPlan, PlanError> {
        if row_counts.is_empty() {
            return Err(PlanError::EmptyStatistics);
        }

        let cuboid_sizes_mb = cuboid_sizes_mb(&self.info, row_counts);
        let total_size_mb: f64 = cuboid_sizes_mb.values().sum();

        let mut region_count = ((total_size_mb / self.config.region_cut_mb).round() as usize)
            .clamp(self.config.min_regions, self.config.max_regions);
        if self.config.sharding_enabled {
            let prime = next_prime(region_count.min(u32::MAX as usize) as u32) as usize;
            region_count = prime
                .min(self.config.max_shard_count)
                .min(u16::MAX as usize);
        }
        let mb_per_region = (total_size_mb / region_count as f64).floor().max(1.0);

        info!(
            target: LOG_TARGET,
            total_size_mb,
            region_count,
            mb_per_region,
            cuboids = cuboid_sizes_mb.len(),
            sharded = self.config.sharding_enabled,
            "Cube size estimated"
        );

        let (layout, region_sizes_mb) = if self.config.sharding_enabled {
            self.shard(&cuboid_sizes_mb, region_count as u16, mb_per_region)
        } else {
            self.split(&cuboid_sizes_mb, mb_per_region)
        };

        for (region, size) in region_sizes_mb.iter().enumerate() {
            debug!(target: LOG_TARGET, region, size_mb = *size, "Region size estimate");
        }

        Ok(PartitionPlan {
            total_size_mb,
            region_count: layout.region_count(),
            mb_per_region,
            cuboid_sizes_mb,
            region_sizes_mb,
            layout,
        })
    }

    fn shard(
        &self,
        sizes: &BTreeMap<u64, f64>,
        region_count: u16,
        mb_per_region: f64,
    ) -> (PartitionLayout, Vec<f64>) {
        let mut shards = CuboidShards::new(region_count);
        let mut region_sizes = vec![0.0; shards.region_count() as usize];

        for (&cuboid, &size) in sizes {
            let wanted = (size * self.config.shard_magic / mb_per_region).ceil();
            let count = wanted.clamp(1.0, region_count as f64) as u16;
            shards.insert(cuboid, count);

            let per_shard = size / shards.shard_count(cuboid) as f64;
            for shard in shards.shards_of(cuboid) {
                region_sizes[shard as usize] += per_shard;
            }
            debug!(
                target: LOG_TARGET,
                cuboid_id = cuboid,
                size_mb = size,
                shards = count,
                start = shards.start_shard(cuboid),
                "Cuboid sharded"
            );
        }

        (PartitionLayout::Sharded(shards), region_sizes)
    }

    /// Walks cuboids by ascending id and opens a new region before a cuboid
    /// once the current one is full or would overshoot its target.
    fn split(&self, sizes: &BTreeMap<u64, f64>, mb_per_region: f64) -> (PartitionLayout, Vec<f64>) {
        let ceiling = mb_per_region * (1.0 + self.config.split_overshoot);
        let mut boundaries = Vec::new();
        let mut region_sizes = vec![0.0];
        let mut current = 0.0;

        for (&cuboid, &size) in sizes {
            if current > 0.0 && (current >= mb_per_region || current + size >= ceiling) {
                boundaries.push(cuboid);
                region_sizes.push(0.0);
                current = 0.0;
            }
            current += size;
            if let Some(last) = region_sizes.last_mut() {
                *last += size;
            }
        }

        (PartitionLayout::Split { boundaries }, region_sizes)
    }
}

fn validate_config(config: &PlannerConfig) -> Result<(), PlanError> {
    if config.min_regions == 0 || config.min_regions > config.max_regions {
        return Err(PlanError::InvalidConfig(format!(
            "region bounds [{}, {}] are empty",
            config.min_regions, config.max_regions
        )));
    }
    if config.region_cut_mb <= 0.0 || config.shard_magic <= 0.0 {
        return Err(PlanError::InvalidConfig(
            "region_cut_mb and shard_magic must be positive".into(),
        ));
    }
    if config.split_overshoot < 0.0 {
        return Err(PlanError::InvalidConfig(
            "split_overshoot must not be negative".into(),
        ));
    }
    if config.max_shard_count == 0 {
        return Err(PlanError::InvalidConfig(
            "max_shard_count must be at least 1".into(),
        ));
    }
    Ok(())
}
