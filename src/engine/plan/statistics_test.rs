use std::collections::BTreeMap;
use std::fs;

use tempfile::tempdir;

use super::statistics::{
    CuboidStatistics, CuboidStatsCollector, DEFAULT_SAMPLING_PERCENTAGE, read_row_count_map,
    read_statistics, row_count_map, write_statistics,
};
use crate::engine::build::{CollectingWriter, MemoryBudget, input_queue};
use crate::engine::errors::PlanError;
use crate::engine::measure::HllCounter;
use crate::shared::config::BuildConfig;
use crate::shared::hash::stable_hash64;
use crate::test_helpers::factory::Factory;

fn counter_with(distinct: u64) -> HllCounter {
    let mut counter = HllCounter::new(14);
    for i in 0..distinct {
        counter.add_hash(stable_hash64(&i));
    }
    counter
}

fn within(actual: u64, expected: u64, tolerance: f64) -> bool {
    (actual as f64 - expected as f64).abs() <= expected as f64 * tolerance
}

#[test]
fn row_count_map_scales_by_sampling() {
    let counters = BTreeMap::from([(0b11u64, counter_with(1000)), (0b01u64, counter_with(10))]);

    let full = row_count_map(&counters, 100).unwrap();
    let quarter = row_count_map(&counters, 25).unwrap();

    assert!(within(full[&0b11], 1000, 0.02), "{}", full[&0b11]);
    assert_eq!(quarter[&0b11], full[&0b11] * 4);
    assert_eq!(quarter[&0b01], full[&0b01] * 4);
}

#[test]
fn sampling_outside_range_is_rejected() {
    let counters = BTreeMap::from([(1u64, counter_with(3))]);
    for bad in [0, -5, 101] {
        let err = row_count_map(&counters, bad).unwrap_err();
        assert!(matches!(err, PlanError::InvalidSamplingPercentage(v) if v == bad as i64));
    }
}

#[test]
fn statistics_survive_write_and_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats").join("cuboid_statistics.seq");

    let mut stats = CuboidStatistics::new(40);
    stats.counters.insert(0b111, counter_with(500));
    stats.counters.insert(0b010, counter_with(7));
    stats.counters.insert(0, counter_with(1));

    write_statistics(&path, &stats).unwrap();
    let loaded = read_statistics(&path).unwrap();

    assert_eq!(loaded.sampling_percentage, 40);
    assert_eq!(loaded.counters.len(), 2);
    assert_eq!(loaded.counters[&0b111], stats.counters[&0b111]);
    assert_eq!(loaded.counters[&0b010], stats.counters[&0b010]);

    let rows = read_row_count_map(&path).unwrap();
    assert_eq!(rows[&0b010], stats.counters[&0b010].count_estimate() * 100 / 40);
}

#[test]
fn missing_sampling_entry_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.seq");

    let counter = counter_with(20);
    let value = counter.to_bytes();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&5u64.to_be_bytes());
    bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&value);
    fs::write(&path, bytes).unwrap();

    let loaded = read_statistics(&path).unwrap();
    assert_eq!(loaded.sampling_percentage, DEFAULT_SAMPLING_PERCENTAGE);
    assert_eq!(loaded.counters[&5], counter);
}

#[test]
fn truncated_resource_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.seq");

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0u64.to_be_bytes());
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(&100i32.to_be_bytes());
    bytes.extend_from_slice(&3u64.to_be_bytes());
    bytes.extend_from_slice(&64u32.to_le_bytes());
    bytes.extend_from_slice(&[1, 2, 3]);
    fs::write(&path, bytes).unwrap();

    assert!(matches!(
        read_statistics(&path),
        Err(PlanError::Corrupt(_))
    ));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = read_statistics(&dir.path().join("absent.seq")).unwrap_err();
    assert!(matches!(err, PlanError::Io(_)));
}

#[test]
fn collector_samples_and_projects_rows() {
    let cube = Factory::cube();
    let encoder = cube.encoder();
    let scheduler = cube.scheduler();
    let rows = Factory::rows(&cube).with_seed(5).create_list(400);

    let mut collector =
        CuboidStatsCollector::new(scheduler.build_order().iter().copied(), 14, 50).unwrap();
    for row in &rows {
        collector.observe_record(&encoder.encode_row(row).unwrap());
    }

    assert_eq!(collector.rows_seen(), 400);
    assert_eq!(collector.rows_sampled(), 200);

    let stats = collector.into_statistics();
    assert_eq!(stats.counters.len(), 8);
    assert_eq!(stats.counters[&0].count_estimate(), 1);
    // seller has 4 values, category 2
    assert!(stats.counters[&0b001].count_estimate().abs_diff(4) <= 1);
    assert!(stats.counters[&0b101].count_estimate().abs_diff(8) <= 1);
    assert!(stats.counters[&0b111].count_estimate() <= 24);
}

#[test]
fn collector_as_writer_counts_build_output() {
    let cube = Factory::cube();
    let rows = Factory::rows(&cube).with_seed(9).create_list(300);
    let builder = cube
        .builder(&BuildConfig::default())
        .with_budget(MemoryBudget::unlimited());

    let (feeder, rx) = input_queue(4);
    feeder.send_batch(rows.clone()).unwrap();
    feeder.finish().unwrap();
    let mut collector = CuboidStatsCollector::new(Vec::new(), 14, 100).unwrap();
    builder.build(&rx, &mut collector).unwrap();

    let (feeder, rx) = input_queue(4);
    feeder.send_batch(rows).unwrap();
    feeder.finish().unwrap();
    let mut expected = CollectingWriter::new();
    builder.build(&rx, &mut expected).unwrap();

    let stats = collector.statistics();
    for (cuboid, records) in expected.cuboids() {
        // small cardinalities land in linear counting; a register collision costs one
        let estimate = stats.counters[cuboid].count_estimate();
        assert!(
            estimate.abs_diff(records.len() as u64) <= 1,
            "cuboid {cuboid:#b}: {estimate} vs {}",
            records.len()
        );
    }
}
