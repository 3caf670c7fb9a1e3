use super::table::CuboidTable;
use crate::engine::errors::{BuildError, MeasureError};
use crate::engine::measure::MeasureState;
use crate::engine::schema::Record;

fn rec(dims: &[u32], sum: i64, min: i64, max: i64, count: i64) -> Record {
    Record::new(
        dims.to_vec(),
        vec![
            MeasureState::Sum(sum),
            MeasureState::Min(min),
            MeasureState::Max(max),
            MeasureState::Count(count),
        ],
    )
}

#[test]
fn add_merges_rows_sharing_a_key() {
    let mut table = CuboidTable::new(0b111);
    table.add(rec(&[7, 2010, 1], 1509, 1509, 1509, 1)).unwrap();
    table.add(rec(&[7, 2010, 1], 2034, 2034, 2034, 1)).unwrap();
    table.add(rec(&[7, 2010, 1], 1000, 1000, 1000, 1)).unwrap();
    table.add(rec(&[1, 2010, 1], 1509, 1509, 1509, 1)).unwrap();

    assert_eq!(table.len(), 2);
    let records = table.sorted_records();
    assert_eq!(records[0], rec(&[1, 2010, 1], 1509, 1509, 1509, 1));
    assert_eq!(records[1], rec(&[7, 2010, 1], 4543, 1000, 2034, 3));
}

#[test]
fn rollup_projects_key_and_remerges() {
    let mut base = CuboidTable::new(0b111);
    base.add(rec(&[1, 10, 100], 5, 5, 5, 1)).unwrap();
    base.add(rec(&[1, 20, 100], 7, 7, 7, 1)).unwrap();
    base.add(rec(&[2, 10, 200], 1, 1, 1, 1)).unwrap();

    // drop dimension 1 (middle)
    let child = base.rollup(0b101).unwrap();
    assert_eq!(child.cuboid(), 0b101);
    let records = child.sorted_records();
    assert_eq!(
        records,
        vec![rec(&[1, 100], 12, 5, 7, 2), rec(&[2, 200], 1, 1, 1, 1)]
    );

    let total = child.rollup(0).unwrap();
    assert_eq!(total.sorted_records(), vec![rec(&[], 13, 1, 7, 3)]);
}

#[test]
fn merge_from_equals_single_table() {
    let rows = vec![
        rec(&[1, 1], 1, 1, 1, 1),
        rec(&[1, 2], 2, 2, 2, 1),
        rec(&[1, 1], 3, 3, 3, 1),
        rec(&[2, 2], 4, 4, 4, 1),
    ];

    let mut whole = CuboidTable::new(0b11);
    for r in rows.iter().cloned() {
        whole.add(r).unwrap();
    }

    let mut left = CuboidTable::new(0b11);
    let mut right = CuboidTable::new(0b11);
    for (i, r) in rows.into_iter().enumerate() {
        if i % 2 == 0 {
            left.add(r).unwrap();
        } else {
            right.add(r).unwrap();
        }
    }
    left.merge_from(right).unwrap();

    assert_eq!(left.sorted_records(), whole.sorted_records());
    assert_eq!(left.estimated_bytes(), whole.estimated_bytes());
}

#[test]
fn estimated_bytes_grow_per_group_not_per_row() {
    let mut table = CuboidTable::new(0b1);
    table.add(rec(&[1], 1, 1, 1, 1)).unwrap();
    let one = table.estimated_bytes();
    assert!(one > 0);
    table.add(rec(&[1], 1, 1, 1, 1)).unwrap();
    assert_eq!(table.estimated_bytes(), one);
    table.add(rec(&[2], 1, 1, 1, 1)).unwrap();
    assert_eq!(table.estimated_bytes(), 2 * one);
}

#[test]
fn overflowing_measure_fails_with_the_cuboid() {
    let mut table = CuboidTable::new(0b11);
    table.add(rec(&[1, 1], i64::MAX, 1, 1, 1)).unwrap();
    table.add(rec(&[1, 2], 1, 1, 1, 1)).unwrap();

    let err = table.add(rec(&[1, 1], 1, 1, 1, 1)).unwrap_err();
    assert!(matches!(
        err,
        BuildError::Measure {
            cuboid: 0b11,
            source: MeasureError::Overflow("sum"),
        }
    ));

    let err = table.rollup(0b01).unwrap_err();
    assert!(matches!(err, BuildError::Measure { cuboid: 0b01, .. }));
}
