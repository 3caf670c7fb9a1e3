use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::engine::build::CuboidWriter;
use crate::engine::codec::{RowKeyEncoder, encode_record};
use crate::engine::errors::SinkError;
use crate::engine::plan::PartitionLayout;
use crate::engine::schema::{ColumnBlocks, GtInfo, PRIMARY_KEY_BLOCK, Record};

const LOG_TARGET: &str = "engine::store::partition_store";

type Region = BTreeMap<Vec<u8>, Vec<u8>>;

/// Sorted key/value regions laid out by a [`PartitionLayout`]. Keys are full
/// row keys; values hold every measure column of the row.
pub struct MemoryPartitionStore {
    info: Arc<GtInfo>,
    layout: Arc<PartitionLayout>,
    regions: Vec<RwLock<Region>>,
}

impl MemoryPartitionStore {
    pub fn new(info: Arc<GtInfo>, layout: Arc<PartitionLayout>) -> Self {
        let regions = (0..layout.region_count())
            .map(|_| RwLock::new(Region::new()))
            .collect();
        Self {
            info,
            layout,
            regions,
        }
    }

    pub fn info(&self) -> &Arc<GtInfo> {
        &self.info
    }

    pub fn layout(&self) -> &Arc<PartitionLayout> {
        &self.layout
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Column blocks stored in values (every measure, no key columns).
    pub fn value_blocks(&self) -> ColumnBlocks {
        ColumnBlocks::all(self.info.column_block_count()).without(PRIMARY_KEY_BLOCK)
    }

    pub fn row_count(&self, partition: u16) -> usize {
        self.regions
            .get(partition as usize)
            .map(|r| r.read().len())
            .unwrap_or(0)
    }

    pub fn total_rows(&self) -> usize {
        self.regions.iter().map(|r| r.read().len()).sum()
    }

    /// Stores `record` of `cuboid`, replacing a previous row with the same key.
    pub fn put_record(&self, cuboid: u64, record: &Record) -> Result<u16, SinkError> {
        let encoder = RowKeyEncoder::new(&self.info);
        let mut body = Vec::with_capacity(self.info.key_width(cuboid));
        encoder.encode_body(cuboid, &record.dims, &mut body);

        let (shard, partition) = self.layout.route(cuboid, &body);
        let region = self.regions.get(partition as usize).ok_or_else(|| {
            SinkError::Other(format!("partition {partition} outside the layout"))
        })?;

        let mut key = RowKeyEncoder::header(shard, cuboid);
        key.extend_from_slice(&body);
        let mut value = Vec::new();
        encode_record(&self.info, cuboid, record, self.value_blocks(), &mut value);

        region.write().insert(key, value);
        Ok(partition)
    }

    /// Rows of `partition` with `start <= key < end`, in key order.
    pub fn range(
        &self,
        partition: u16,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Option<Vec<(Vec<u8>, Vec<u8>)>> {
        let region = self.regions.get(partition as usize)?.read();
        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        if end.is_some_and(|end| end <= start) {
            return Some(Vec::new());
        }
        Some(
            region
                .range::<[u8], _>((Bound::Included(start), upper))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn clear(&self) {
        for region in &self.regions {
            region.write().clear();
        }
    }
}

/// [`CuboidWriter`] loading build output into a [`MemoryPartitionStore`].
pub struct PartitionWriter {
    store: Arc<MemoryPartitionStore>,
    rows_per_partition: Vec<u64>,
}

impl PartitionWriter {
    pub fn new(store: Arc<MemoryPartitionStore>) -> Self {
        let rows_per_partition = vec![0; store.region_count()];
        Self {
            store,
            rows_per_partition,
        }
    }

    pub fn store(&self) -> &Arc<MemoryPartitionStore> {
        &self.store
    }
}

impl CuboidWriter for PartitionWriter {
    fn write(&mut self, cuboid_id: u64, record: &Record) -> Result<(), SinkError> {
        let partition = self.store.put_record(cuboid_id, record)?;
        if let Some(count) = self.rows_per_partition.get_mut(partition as usize) {
            *count += 1;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        for (partition, rows) in self.rows_per_partition.iter().enumerate() {
            debug!(target: LOG_TARGET, partition, rows = *rows, "Partition rows written");
        }
        info!(
            target: LOG_TARGET,
            rows = self.rows_per_partition.iter().sum::<u64>(),
            stored = self.store.total_rows(),
            "Partition writer flushed"
        );
        self.rows_per_partition.iter_mut().for_each(|c| *c = 0);
        Ok(())
    }
}
