use crate::engine::errors::CodecError;
use crate::engine::schema::GtInfo;
use crate::shared::byte_cursor::{ByteCursor, SIZE_U16, SIZE_U64, write_uint_be};

/// Shard id (2 bytes) followed by cuboid id (8 bytes), both big-endian.
pub const ROWKEY_HEADER_LEN: usize = SIZE_U16 + SIZE_U64;

/// Builds and parses storage row keys. All parts are big-endian so byte order
/// matches (shard, cuboid, dimension codes) order.
pub struct RowKeyEncoder<'a> {
    info: &'a GtInfo,
}

impl<'a> RowKeyEncoder<'a> {
    pub fn new(info: &'a GtInfo) -> Self {
        Self { info }
    }

    pub fn header(shard: u16, cuboid: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(ROWKEY_HEADER_LEN);
        out.extend_from_slice(&shard.to_be_bytes());
        out.extend_from_slice(&cuboid.to_be_bytes());
        out
    }

    /// Encodes the dimension codes of `cuboid`. `dims` may be a prefix of the
    /// cuboid's dimensions, which yields a key prefix usable for range bounds.
    pub fn encode_body(&self, cuboid: u64, dims: &[u32], out: &mut Vec<u8>) {
        for (code, dim) in dims.iter().zip(self.info.dimensions_of(cuboid)) {
            write_uint_be(out, *code, self.info.dimension_width(dim));
        }
    }

    pub fn encode(&self, shard: u16, cuboid: u64, dims: &[u32]) -> Vec<u8> {
        let mut out = Self::header(shard, cuboid);
        out.reserve(self.info.key_width(cuboid));
        self.encode_body(cuboid, dims, &mut out);
        out
    }

    pub fn decode(&self, key: &[u8]) -> Result<(u16, u64, Vec<u32>), CodecError> {
        let mut cursor = ByteCursor::new(key);
        let shard = cursor
            .read_u16_be()
            .ok_or(CodecError::Truncated("row key shard"))?;
        let cuboid = cursor
            .read_u64_be()
            .ok_or(CodecError::Truncated("row key cuboid"))?;
        let dims = self.decode_dims(cuboid, &mut cursor)?;
        Ok((shard, cuboid, dims))
    }

    pub fn decode_dims(
        &self,
        cuboid: u64,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<Vec<u32>, CodecError> {
        self.info
            .dimensions_of(cuboid)
            .map(|dim| {
                cursor
                    .read_uint_be(self.info.dimension_width(dim))
                    .ok_or(CodecError::Truncated("row key dimension"))
            })
            .collect()
    }
}

/// Body of a row key, without the shard/cuboid header.
pub fn key_body(key: &[u8]) -> &[u8] {
    key.get(ROWKEY_HEADER_LEN..).unwrap_or_default()
}

/// Smallest key greater than every key starting with `prefix`; `None` when the
/// prefix is all `0xff` (no upper bound).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut out = prefix.to_vec();
    while let Some(last) = out.pop() {
        if last != 0xff {
            out.push(last + 1);
            return Some(out);
        }
    }
    None
}
