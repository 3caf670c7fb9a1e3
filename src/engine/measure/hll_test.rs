use super::hll::HllCounter;
use crate::shared::hash::stable_hash64;

fn counter_with(range: std::ops::Range<u64>, precision: u8) -> HllCounter {
    let mut hll = HllCounter::new(precision);
    for v in range {
        hll.add_hash(stable_hash64(&v));
    }
    hll
}

#[test]
fn empty_counter_estimates_zero() {
    assert_eq!(HllCounter::new(10).count_estimate(), 0);
}

#[test]
fn estimate_is_close_for_small_cardinality() {
    let hll = counter_with(0..100, 14);
    let est = hll.count_estimate() as i64;
    assert!((est - 100).abs() <= 3, "estimate {est}");
}

#[test]
fn estimate_within_error_bound_for_large_cardinality() {
    let hll = counter_with(0..50_000, 12);
    let est = hll.count_estimate() as f64;
    // 1.04 / sqrt(4096) is about 1.6%; allow a wide margin
    assert!((est - 50_000.0).abs() / 50_000.0 < 0.08, "estimate {est}");
}

#[test]
fn duplicates_do_not_inflate_estimate() {
    let mut hll = counter_with(0..1_000, 12);
    let before = hll.count_estimate();
    for v in 0..1_000u64 {
        hll.add_hash(stable_hash64(&v));
    }
    assert_eq!(hll.count_estimate(), before);
}

#[test]
fn merge_is_commutative_and_matches_union() {
    let a = counter_with(0..600, 12);
    let b = counter_with(400..1_000, 12);

    let mut ab = a.clone();
    ab.merge(&b);
    let mut ba = b.clone();
    ba.merge(&a);
    assert_eq!(ab, ba);

    let union = counter_with(0..1_000, 12);
    assert_eq!(ab, union);
}

#[test]
fn registers_survive_serialization() {
    let hll = counter_with(0..321, 10);
    let bytes = hll.to_bytes();
    assert_eq!(bytes.len(), hll.serialized_len());
    let back = HllCounter::from_bytes(&bytes).expect("decode");
    assert_eq!(back, hll);
}

#[test]
fn truncated_registers_are_rejected() {
    let hll = counter_with(0..10, 8);
    let bytes = hll.to_bytes();
    assert!(HllCounter::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    assert!(HllCounter::from_bytes(&[2u8]).is_err());
}
