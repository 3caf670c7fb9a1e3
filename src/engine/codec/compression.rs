use crate::engine::errors::CodecError;

use lz4_flex::block::{
    compress_prepend_size as lz4_compress, decompress_size_prepended as lz4_decompress,
};

pub const ALGO_LZ4: u16 = 0x0001;

pub trait CompressionCodec: Send + Sync {
    fn algo_id(&self) -> u16;
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError>;
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// LZ4 block format with the uncompressed length prepended.
pub struct Lz4Codec;

impl CompressionCodec for Lz4Codec {
    fn algo_id(&self) -> u16 {
        ALGO_LZ4
    }
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(lz4_compress(input))
    }
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        if input.len() < 4 {
            return Err(CodecError::Compression(
                "Compressed data too short to contain size header".into(),
            ));
        }
        lz4_decompress(input).map_err(|e| CodecError::Compression(format!("lz4 decompress: {e}")))
    }
}
