pub mod compression;
pub mod decimal;
pub mod dictionary;
pub mod record_codec;
pub mod row_encoder;
pub mod row_key;

#[cfg(test)]
mod dictionary_test;

pub use compression::{CompressionCodec, Lz4Codec};
pub use dictionary::{Dictionary, SortedDictionary};
pub use record_codec::{RecordBlockReader, decode_record, encode_block, encode_record};
pub use row_encoder::FlatRowEncoder;
pub use row_key::{ROWKEY_HEADER_LEN, RowKeyEncoder};
