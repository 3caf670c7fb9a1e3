pub mod column_blocks;
pub mod cube_desc;
pub mod gt_info;
pub mod record;

#[cfg(test)]
mod gt_info_test;

pub use column_blocks::{ColumnBlocks, PRIMARY_KEY_BLOCK};
pub use cube_desc::{CubeDesc, DimensionDesc, MeasureDesc, MeasureFunction};
pub use gt_info::GtInfo;
pub use record::Record;
