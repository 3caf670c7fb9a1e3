use super::cube_desc::{CubeDesc, MeasureFunction};
use super::gt_info::GtInfo;

fn desc() -> CubeDesc {
    CubeDesc::with_flat_layout(
        "sales",
        &["year", "country", "category"],
        vec![
            ("gmv", MeasureFunction::Sum { scale: 2 }),
            ("cnt", MeasureFunction::Count),
        ],
    )
}

#[test]
fn key_width_sums_present_dimensions_only() {
    let info = GtInfo::new(&desc(), vec![1, 2, 4]).expect("info");
    assert_eq!(info.key_width(0b111), 7);
    assert_eq!(info.key_width(0b101), 5);
    assert_eq!(info.key_width(0b010), 2);
    assert_eq!(info.key_width(0), 0);
    assert_eq!(info.dimensions_of(0b110).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn column_blocks_are_key_plus_one_per_measure() {
    let info = GtInfo::new(&desc(), vec![1, 1, 1]).expect("info");
    assert_eq!(info.column_block_count(), 3);
    assert_eq!(info.base_cuboid(), 0b111);
    assert_eq!(info.measure(1), &MeasureFunction::Count);
}

#[test]
fn rejects_mismatched_or_invalid_widths() {
    assert!(GtInfo::new(&desc(), vec![1, 1]).is_err());
    assert!(GtInfo::new(&desc(), vec![1, 0, 1]).is_err());
    assert!(GtInfo::new(&desc(), vec![1, 5, 1]).is_err());
}

#[test]
fn column_blocks_track_selected_measures() {
    use super::column_blocks::ColumnBlocks;

    let blocks = ColumnBlocks::of(&[2]);
    assert!(!blocks.contains(0));
    assert!(blocks.contains_measure(1));
    assert!(blocks.with(0).contains(0));
    assert_eq!(ColumnBlocks::all(3).iter().collect::<Vec<_>>(), vec![0, 1, 2]);
}
