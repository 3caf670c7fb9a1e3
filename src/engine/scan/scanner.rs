use std::sync::Arc;

use crate::engine::codec::RecordBlockReader;
use crate::engine::errors::ScanError;
use crate::engine::schema::{ColumnBlocks, GtInfo, Record};

/// Lazily decodes the records of decompressed scan blocks, block after block
/// in partition order. Stops after the first decoding error.
pub struct RecordScanner {
    info: Arc<GtInfo>,
    cuboid: u64,
    blocks: ColumnBlocks,
    block_count: usize,
    pending: std::vec::IntoIter<Vec<u8>>,
    current: Option<RecordBlockReader<Vec<u8>>>,
    failed: bool,
}

impl RecordScanner {
    pub fn new(info: Arc<GtInfo>, cuboid: u64, blocks: ColumnBlocks, data: Vec<Vec<u8>>) -> Self {
        Self {
            info,
            cuboid,
            blocks,
            block_count: data.len(),
            pending: data.into_iter(),
            current: None,
            failed: false,
        }
    }

    pub fn cuboid(&self) -> u64 {
        self.cuboid
    }

    /// Column blocks present in every record, block 0 included.
    pub fn blocks(&self) -> ColumnBlocks {
        self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }
}

impl Iterator for RecordScanner {
    type Item = Result<Record, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(reader) = self.current.as_mut() {
                match reader.next() {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(e)) => {
                        self.failed = true;
                        return Some(Err(ScanError::Decode(e)));
                    }
                    None => self.current = None,
                }
            }
            let block = self.pending.next()?;
            self.current = Some(RecordBlockReader::new(
                Arc::clone(&self.info),
                self.cuboid,
                self.blocks,
                block,
            ));
        }
    }
}
