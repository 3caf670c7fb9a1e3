pub mod byte_cursor;
pub mod config;
pub mod hash;
