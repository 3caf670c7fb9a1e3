use std::sync::Arc;

use crate::engine::errors::CodecError;
use crate::engine::measure::MeasureState;
use crate::engine::schema::{ColumnBlocks, GtInfo, PRIMARY_KEY_BLOCK, Record};
use crate::shared::byte_cursor::{ByteCursor, write_uint_be};

/// Appends one record of `cuboid` to a row block. Only the selected column
/// blocks are written; `record.measures` holds every measure of the cube.
pub fn encode_record(
    info: &GtInfo,
    cuboid: u64,
    record: &Record,
    blocks: ColumnBlocks,
    out: &mut Vec<u8>,
) {
    if blocks.contains(PRIMARY_KEY_BLOCK) {
        for (code, dim) in record.dims.iter().zip(info.dimensions_of(cuboid)) {
            write_uint_be(out, *code, info.dimension_width(dim));
        }
    }
    for (idx, state) in record.measures.iter().enumerate() {
        if blocks.contains_measure(idx) {
            state.encode(out);
        }
    }
}

/// Reads one record written by [`encode_record`] with the same projection. The
/// decoded record carries only the selected measures, in measure order.
pub fn decode_record(
    info: &GtInfo,
    cuboid: u64,
    blocks: ColumnBlocks,
    cursor: &mut ByteCursor<'_>,
) -> Result<Record, CodecError> {
    let mut dims = Vec::new();
    if blocks.contains(PRIMARY_KEY_BLOCK) {
        for dim in info.dimensions_of(cuboid) {
            let code = cursor
                .read_uint_be(info.dimension_width(dim))
                .ok_or(CodecError::Truncated("record dimension"))?;
            dims.push(code);
        }
    }
    let mut measures = Vec::new();
    for idx in 0..info.measure_count() {
        if blocks.contains_measure(idx) {
            measures.push(MeasureState::decode(info.measure(idx), cursor)?);
        }
    }
    Ok(Record::new(dims, measures))
}

/// Encodes a row block: a `u32` LE record count followed by the records.
/// The count keeps zero-width records (no dimensions, nothing projected)
/// visible to readers.
pub fn encode_block<'r, I>(info: &GtInfo, cuboid: u64, records: I, blocks: ColumnBlocks) -> Vec<u8>
where
    I: IntoIterator<Item = &'r Record>,
{
    let mut out = vec![0u8; 4];
    let mut count = 0u32;
    for record in records {
        encode_record(info, cuboid, record, blocks, &mut out);
        count += 1;
    }
    out[..4].copy_from_slice(&count.to_le_bytes());
    out
}

/// Iterates the records of one decompressed block written by
/// [`encode_block`]. Yields at most one error, then stops.
pub struct RecordBlockReader<B> {
    info: Arc<GtInfo>,
    cuboid: u64,
    blocks: ColumnBlocks,
    block: B,
    pos: usize,
    remaining: Option<u32>,
    failed: bool,
}

impl<B: AsRef<[u8]>> RecordBlockReader<B> {
    pub fn new(info: Arc<GtInfo>, cuboid: u64, blocks: ColumnBlocks, block: B) -> Self {
        Self {
            info,
            cuboid,
            blocks,
            block,
            pos: 0,
            remaining: None,
            failed: false,
        }
    }

    fn advance(&mut self) -> Result<Option<Record>, CodecError> {
        let bytes = self.block.as_ref().get(self.pos..).unwrap_or_default();
        let mut cursor = ByteCursor::new(bytes);
        let remaining = match self.remaining {
            Some(n) => n,
            None => cursor
                .read_u32_le()
                .ok_or(CodecError::Truncated("block record count"))?,
        };
        if remaining == 0 {
            self.remaining = Some(0);
            self.pos += cursor.position();
            return match cursor.remaining() {
                0 => Ok(None),
                left => Err(CodecError::TrailingBytes(left)),
            };
        }

        let record = decode_record(&self.info, self.cuboid, self.blocks, &mut cursor)?;
        self.pos += cursor.position();
        self.remaining = Some(remaining - 1);
        Ok(Some(record))
    }
}

impl<B: AsRef<[u8]>> Iterator for RecordBlockReader<B> {
    type Item = Result<Record, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.advance() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
