use serde::{Deserialize, Serialize};

use crate::engine::codec::{RowKeyEncoder, row_key::prefix_successor};
use crate::engine::errors::CodecError;
use crate::engine::plan::PartitionLayout;
use crate::engine::schema::{ColumnBlocks, GtInfo, PRIMARY_KEY_BLOCK};

/// Logical scan over one cuboid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GtScanRequest {
    pub cuboid_id: u64,
    /// Lower bound on the leading dimension codes, inclusive.
    pub pk_start: Option<Vec<u32>>,
    /// Upper bound on the leading dimension codes, inclusive.
    pub pk_end: Option<Vec<u32>>,
    pub selected_blocks: ColumnBlocks,
}

impl GtScanRequest {
    /// Full scan of `cuboid_id` returning every column block.
    pub fn new(info: &GtInfo, cuboid_id: u64) -> Self {
        Self {
            cuboid_id,
            pk_start: None,
            pk_end: None,
            selected_blocks: ColumnBlocks::all(info.column_block_count()),
        }
    }

    pub fn with_blocks(mut self, blocks: ColumnBlocks) -> Self {
        self.selected_blocks = blocks;
        self
    }

    pub fn with_range(mut self, start: Option<Vec<u32>>, end: Option<Vec<u32>>) -> Self {
        self.pk_start = start;
        self.pk_end = end;
        self
    }

    /// Selected blocks plus the primary key block, which every scan returns.
    pub fn projection(&self) -> ColumnBlocks {
        self.selected_blocks.with(PRIMARY_KEY_BLOCK)
    }
}

/// Physical scan of one partition's key range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScan {
    pub partition: u16,
    pub start_key: Vec<u8>,
    /// Exclusive; `None` reads to the end of the partition.
    pub end_key: Option<Vec<u8>>,
    pub blocks: ColumnBlocks,
}

/// One [`RawScan`] per partition that may hold rows of the requested cuboid.
pub fn prepare_raw_scans(
    info: &GtInfo,
    layout: &PartitionLayout,
    request: &GtScanRequest,
) -> Result<Vec<RawScan>, CodecError> {
    let cuboid = request.cuboid_id;
    let key_dims = info.dimensions_of(cuboid).count();
    for bound in [&request.pk_start, &request.pk_end].into_iter().flatten() {
        if bound.len() > key_dims {
            return Err(CodecError::ColumnCount {
                expected: key_dims,
                got: bound.len(),
            });
        }
    }

    let encoder = RowKeyEncoder::new(info);
    let blocks = request.projection();

    Ok(layout
        .partitions_of(cuboid)
        .into_iter()
        .map(|partition| {
            let header = RowKeyEncoder::header(layout.key_shard(partition), cuboid);

            let mut start_key = header.clone();
            if let Some(start) = &request.pk_start {
                encoder.encode_body(cuboid, start, &mut start_key);
            }

            let mut end_prefix = header;
            if let Some(end) = &request.pk_end {
                encoder.encode_body(cuboid, end, &mut end_prefix);
            }

            RawScan {
                partition,
                start_key,
                end_key: prefix_successor(&end_prefix),
                blocks,
            }
        })
        .collect())
}
