use super::aggregator::{MeasureState, measure_space_estimate};
use crate::engine::errors::MeasureError;
use crate::engine::schema::MeasureFunction;
use crate::shared::byte_cursor::ByteCursor;

fn sum(v: &str) -> MeasureState {
    MeasureState::from_input(&MeasureFunction::Sum { scale: 2 }, Some(v)).expect("sum")
}

fn min(v: &str) -> MeasureState {
    MeasureState::from_input(&MeasureFunction::Min { scale: 2 }, Some(v)).expect("min")
}

fn max(v: &str) -> MeasureState {
    MeasureState::from_input(&MeasureFunction::Max { scale: 2 }, Some(v)).expect("max")
}

#[test]
fn merge_applies_each_aggregation_law() {
    let inputs = ["15.09", "20.34", "10"];

    let mut s = sum(inputs[0]);
    let mut lo = min(inputs[0]);
    let mut hi = max(inputs[0]);
    let mut count = MeasureState::Count(1);
    for v in &inputs[1..] {
        s.merge(&sum(v)).unwrap();
        lo.merge(&min(v)).unwrap();
        hi.merge(&max(v)).unwrap();
        count.merge(&MeasureState::Count(1)).unwrap();
    }

    assert_eq!(s, MeasureState::Sum(4543));
    assert_eq!(lo, MeasureState::Min(1000));
    assert_eq!(hi, MeasureState::Max(2034));
    assert_eq!(count, MeasureState::Count(3));
}

#[test]
fn sum_and_count_overflow_is_reported_and_state_kept() {
    let mut s = MeasureState::Sum(i64::MAX - 1);
    assert_eq!(
        s.merge(&MeasureState::Sum(2)),
        Err(MeasureError::Overflow("sum"))
    );
    assert_eq!(s, MeasureState::Sum(i64::MAX - 1));

    let mut count = MeasureState::Count(i64::MAX);
    assert_eq!(
        count.merge(&MeasureState::Count(1)),
        Err(MeasureError::Overflow("count"))
    );
    assert_eq!(count, MeasureState::Count(i64::MAX));

    let mut negative = MeasureState::Sum(i64::MIN);
    assert!(negative.merge(&MeasureState::Sum(-1)).is_err());
}

#[test]
fn distinct_merge_unions_sketches() {
    let f = MeasureFunction::CountDistinct { precision: 10 };
    let mut a = MeasureState::from_input(&f, Some("u1")).unwrap();
    a.merge(&MeasureState::from_input(&f, Some("u2")).unwrap())
        .unwrap();
    a.merge(&MeasureState::from_input(&f, Some("u1")).unwrap())
        .unwrap();
    match a {
        MeasureState::Distinct(hll) => assert_eq!(hll.count_estimate(), 2),
        other => panic!("unexpected state {other:?}"),
    }
}

#[test]
fn missing_numeric_input_is_an_error() {
    assert!(MeasureState::from_input(&MeasureFunction::Sum { scale: 0 }, None).is_err());
    assert!(MeasureState::from_input(&MeasureFunction::Min { scale: 2 }, Some("abc")).is_err());
    // Count ignores its input entirely
    assert_eq!(
        MeasureState::from_input(&MeasureFunction::Count, None).unwrap(),
        MeasureState::Count(1)
    );
}

#[test]
fn encode_decode_preserves_state() {
    let f = MeasureFunction::CountDistinct { precision: 6 };
    let states = vec![
        (MeasureFunction::Sum { scale: 2 }, MeasureState::Sum(-42)),
        (MeasureFunction::Count, MeasureState::Count(7)),
        (f.clone(), MeasureState::from_input(&f, Some("x")).unwrap()),
    ];

    let mut buf = Vec::new();
    for (_, s) in &states {
        s.encode(&mut buf);
    }
    let mut cursor = ByteCursor::new(&buf);
    for (function, expected) in &states {
        let decoded = MeasureState::decode(function, &mut cursor).expect("decode");
        assert_eq!(&decoded, expected);
    }
    assert!(cursor.is_exhausted());
}

#[test]
fn space_estimate_reflects_sketch_size() {
    assert_eq!(measure_space_estimate(&MeasureFunction::Count), 8);
    assert_eq!(
        measure_space_estimate(&MeasureFunction::CountDistinct { precision: 14 }),
        16_385
    );
}
