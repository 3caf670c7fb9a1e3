use std::collections::BTreeMap;

use crate::engine::codec::ROWKEY_HEADER_LEN;
use crate::engine::schema::GtInfo;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Sketch measures rarely fill their registers on disk.
const SKETCH_SPACE_RATIO: f64 = 0.75;

/// Estimated stored bytes per row of `cuboid`: row key plus measure columns.
pub fn estimate_row_bytes(info: &GtInfo, cuboid: u64) -> f64 {
    let key = (ROWKEY_HEADER_LEN + info.key_width(cuboid)) as f64;
    let measures: f64 = info
        .measures()
        .iter()
        .enumerate()
        .map(|(idx, function)| {
            let space = info.measure_space_estimate(idx) as f64;
            if function.is_sketch() {
                space * SKETCH_SPACE_RATIO
            } else {
                space
            }
        })
        .sum();
    key + measures
}

pub fn estimate_cuboid_size_mb(info: &GtInfo, cuboid: u64, row_count: u64) -> f64 {
    estimate_row_bytes(info, cuboid) * row_count as f64 / BYTES_PER_MB
}

pub fn cuboid_sizes_mb(info: &GtInfo, row_counts: &BTreeMap<u64, u64>) -> BTreeMap<u64, f64> {
    row_counts
        .iter()
        .map(|(&cuboid, &rows)| (cuboid, estimate_cuboid_size_mb(info, cuboid, rows)))
        .collect()
}
