use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::engine::codec::{CompressionCodec, Lz4Codec, RowKeyEncoder, decode_record, encode_block};
use crate::engine::errors::{CodecError, VisitError};
use crate::engine::scan::{GtScanRequest, RawScan, VisitRequest, VisitResponse, VisitTransport};
use crate::engine::schema::Record;
use crate::engine::store::partition_store::MemoryPartitionStore;
use crate::shared::byte_cursor::ByteCursor;

const LOG_TARGET: &str = "engine::store::local_endpoint";

pub const DEFAULT_ROWS_PER_BLOCK: usize = 1024;

/// Serves RawScans against a [`MemoryPartitionStore`]: range scan, column
/// projection, block encoding and lz4 compression.
pub struct LocalEndpoint {
    store: Arc<MemoryPartitionStore>,
    codec: Lz4Codec,
    rows_per_block: usize,
}

impl LocalEndpoint {
    pub fn new(store: Arc<MemoryPartitionStore>) -> Self {
        Self {
            store,
            codec: Lz4Codec,
            rows_per_block: DEFAULT_ROWS_PER_BLOCK,
        }
    }

    pub fn with_rows_per_block(mut self, rows: usize) -> Self {
        self.rows_per_block = rows.max(1);
        self
    }

    fn execute(
        &self,
        partition: u16,
        scan: &GtScanRequest,
        raw: &RawScan,
    ) -> Result<Vec<VisitResponse>, CodecError> {
        let info = self.store.info();
        let encoder = RowKeyEncoder::new(info);
        let value_blocks = self.store.value_blocks();

        let rows = self
            .store
            .range(partition, &raw.start_key, raw.end_key.as_deref())
            .unwrap_or_default();

        let mut responses = Vec::new();
        let mut block: Vec<Record> = Vec::with_capacity(self.rows_per_block);
        for (key, value) in &rows {
            let (_, cuboid, dims) = encoder.decode(key)?;
            if cuboid != scan.cuboid_id {
                continue;
            }
            let mut cursor = ByteCursor::new(value);
            let measures = decode_record(info, cuboid, value_blocks, &mut cursor)?.measures;
            block.push(Record::new(dims, measures));

            if block.len() == self.rows_per_block {
                let encoded = encode_block(info, cuboid, &block, raw.blocks);
                responses.push(VisitResponse {
                    compressed_rows: self.codec.compress(&encoded)?,
                });
                block.clear();
            }
        }
        if !block.is_empty() {
            let encoded = encode_block(info, scan.cuboid_id, &block, raw.blocks);
            responses.push(VisitResponse {
                compressed_rows: self.codec.compress(&encoded)?,
            });
        }

        debug!(
            target: LOG_TARGET,
            partition,
            rows = rows.len(),
            blocks = responses.len(),
            "RawScan served"
        );
        Ok(responses)
    }
}

#[async_trait]
impl VisitTransport for LocalEndpoint {
    async fn visit(
        &self,
        partition: u16,
        request: VisitRequest,
    ) -> Result<Vec<VisitResponse>, VisitError> {
        if partition as usize >= self.store.region_count() {
            return Err(VisitError::UnknownPartition(partition));
        }
        let (scan, raw) = request
            .decode()
            .map_err(|e| VisitError::Transport(format!("malformed visit request: {e}")))?;
        if raw.partition != partition {
            return Err(VisitError::Remote(format!(
                "RawScan for partition {} sent to partition {partition}",
                raw.partition
            )));
        }
        self.execute(partition, &scan, &raw)
            .map_err(|e| VisitError::Remote(e.to_string()))
    }
}
