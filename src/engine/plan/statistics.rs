use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::engine::build::CuboidWriter;
use crate::engine::errors::{PlanError, SinkError};
use crate::engine::measure::HllCounter;
use crate::engine::schema::Record;
use crate::shared::byte_cursor::ByteCursor;
use crate::shared::hash::stable_hash64;

const LOG_TARGET: &str = "engine::plan::statistics";

/// Resource key holding the sampling percentage instead of a cuboid counter.
pub const SAMPLING_PERCENTAGE_KEY: u64 = 0;
pub const DEFAULT_SAMPLING_PERCENTAGE: i32 = 25;

/// Per-cuboid distinct-key sketches plus the share of input rows they saw.
#[derive(Clone, Debug, PartialEq)]
pub struct CuboidStatistics {
    pub sampling_percentage: i32,
    pub counters: BTreeMap<u64, HllCounter>,
}

impl CuboidStatistics {
    pub fn new(sampling_percentage: i32) -> Self {
        Self {
            sampling_percentage,
            counters: BTreeMap::new(),
        }
    }

    pub fn row_counts(&self) -> Result<BTreeMap<u64, u64>, PlanError> {
        row_count_map(&self.counters, self.sampling_percentage)
    }
}

pub(crate) fn validate_sampling(sampling_percentage: i32) -> Result<(), PlanError> {
    if sampling_percentage <= 0 || sampling_percentage > 100 {
        return Err(PlanError::InvalidSamplingPercentage(
            sampling_percentage as i64,
        ));
    }
    Ok(())
}

/// Scales each counter's estimate back to the full input.
pub fn row_count_map(
    counters: &BTreeMap<u64, HllCounter>,
    sampling_percentage: i32,
) -> Result<BTreeMap<u64, u64>, PlanError> {
    validate_sampling(sampling_percentage)?;
    Ok(counters
        .iter()
        .map(|(&cuboid, counter)| {
            let rows = counter.count_estimate() * 100 / sampling_percentage as u64;
            (cuboid, rows)
        })
        .collect())
}

/// Writes `(key u64 BE, len u32 LE, bytes)` entries: the sampling percentage
/// under key 0 (i32 BE), then one serialized counter per cuboid.
pub fn write_statistics(path: &Path, stats: &CuboidStatistics) -> Result<(), PlanError> {
    validate_sampling(stats.sampling_percentage)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    write_entry(
        &mut out,
        SAMPLING_PERCENTAGE_KEY,
        &stats.sampling_percentage.to_be_bytes(),
    )?;

    let mut written = 0usize;
    for (&cuboid, counter) in &stats.counters {
        if cuboid == SAMPLING_PERCENTAGE_KEY {
            debug!(target: LOG_TARGET, "Grand total counter not persisted");
            continue;
        }
        write_entry(&mut out, cuboid, &counter.to_bytes())?;
        written += 1;
    }
    out.flush()?;

    info!(
        target: LOG_TARGET,
        path = %path.display(),
        cuboids = written,
        sampling = stats.sampling_percentage,
        "Cuboid statistics written"
    );
    Ok(())
}

fn write_entry<W: Write>(out: &mut W, key: u64, value: &[u8]) -> Result<(), PlanError> {
    out.write_all(&key.to_be_bytes())?;
    out.write_all(&(value.len() as u32).to_le_bytes())?;
    out.write_all(value)?;
    Ok(())
}

pub fn read_statistics(path: &Path) -> Result<CuboidStatistics, PlanError> {
    let bytes = fs::read(path)?;
    let mut cursor = ByteCursor::new(&bytes);
    let mut sampling = None;
    let mut counters = BTreeMap::new();

    while !cursor.is_exhausted() {
        let key = cursor
            .read_u64_be()
            .ok_or_else(|| PlanError::Corrupt("truncated key".into()))?;
        let len = cursor
            .read_u32_le()
            .ok_or_else(|| PlanError::Corrupt(format!("truncated length for key {key}")))?;
        let value = cursor
            .read_bytes(len as usize)
            .ok_or_else(|| PlanError::Corrupt(format!("truncated value for key {key}")))?;

        if key == SAMPLING_PERCENTAGE_KEY {
            let raw: [u8; 4] = value
                .try_into()
                .map_err(|_| PlanError::Corrupt("sampling percentage is not 4 bytes".into()))?;
            sampling = Some(i32::from_be_bytes(raw));
        } else {
            let counter = HllCounter::from_bytes(value)
                .map_err(|e| PlanError::Corrupt(format!("cuboid {key}: {e}")))?;
            counters.insert(key, counter);
        }
    }

    let sampling_percentage = sampling.unwrap_or_else(|| {
        warn!(
            target: LOG_TARGET,
            path = %path.display(),
            default = DEFAULT_SAMPLING_PERCENTAGE,
            "No sampling percentage in statistics, using default"
        );
        DEFAULT_SAMPLING_PERCENTAGE
    });
    validate_sampling(sampling_percentage)?;

    Ok(CuboidStatistics {
        sampling_percentage,
        counters,
    })
}

pub fn read_row_count_map(path: &Path) -> Result<BTreeMap<u64, u64>, PlanError> {
    read_statistics(path)?.row_counts()
}

/// Accumulates one HyperLogLog counter per cuboid.
///
/// Raw base rows go through [`observe`](Self::observe), which keeps a
/// deterministic `sampling_percentage` share of them and projects each kept
/// row onto every tracked cuboid. As a [`CuboidWriter`] it sketches build
/// output directly; that output is complete, so pair it with 100% sampling.
#[derive(Clone, Debug)]
pub struct CuboidStatsCollector {
    cuboids: Vec<u64>,
    precision: u8,
    sampling_percentage: i32,
    counters: BTreeMap<u64, HllCounter>,
    rows_seen: u64,
    rows_sampled: u64,
}

impl CuboidStatsCollector {
    pub fn new<I>(cuboids: I, precision: u8, sampling_percentage: i32) -> Result<Self, PlanError>
    where
        I: IntoIterator<Item = u64>,
    {
        validate_sampling(sampling_percentage)?;
        let cuboids: Vec<u64> = cuboids.into_iter().collect();
        let counters = cuboids
            .iter()
            .map(|&c| (c, HllCounter::new(precision)))
            .collect();
        Ok(Self {
            cuboids,
            precision,
            sampling_percentage,
            counters,
            rows_seen: 0,
            rows_sampled: 0,
        })
    }

    /// Feeds one row's base dimension codes (one code per dimension).
    pub fn observe(&mut self, base_dims: &[u32]) {
        let keep = (self.rows_seen % 100) < self.sampling_percentage as u64;
        self.rows_seen += 1;
        if !keep {
            return;
        }
        self.rows_sampled += 1;

        let mut projected = Vec::with_capacity(base_dims.len());
        for (&cuboid, counter) in self.counters.iter_mut() {
            projected.clear();
            projected.extend(
                base_dims
                    .iter()
                    .enumerate()
                    .filter(|(d, _)| cuboid & (1u64 << d) != 0)
                    .map(|(_, &code)| code),
            );
            counter.add_hash(stable_hash64(projected.as_slice()));
        }
    }

    pub fn observe_record(&mut self, record: &Record) {
        self.observe(&record.dims);
    }

    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    pub fn rows_sampled(&self) -> u64 {
        self.rows_sampled
    }

    pub fn cuboids(&self) -> &[u64] {
        &self.cuboids
    }

    pub fn statistics(&self) -> CuboidStatistics {
        CuboidStatistics {
            sampling_percentage: self.sampling_percentage,
            counters: self.counters.clone(),
        }
    }

    pub fn into_statistics(self) -> CuboidStatistics {
        CuboidStatistics {
            sampling_percentage: self.sampling_percentage,
            counters: self.counters,
        }
    }
}

impl CuboidWriter for CuboidStatsCollector {
    fn write(&mut self, cuboid_id: u64, record: &Record) -> Result<(), SinkError> {
        let precision = self.precision;
        self.counters
            .entry(cuboid_id)
            .or_insert_with(|| HllCounter::new(precision))
            .add_hash(stable_hash64(record.dims.as_slice()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        debug!(
            target: LOG_TARGET,
            cuboids = self.counters.len(),
            "Statistics collector flushed"
        );
        Ok(())
    }
}
