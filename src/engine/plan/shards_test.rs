use std::fs;

use tempfile::tempdir;

use super::shards::CuboidShards;
use crate::engine::errors::PlanError;

#[test]
fn unknown_cuboids_take_one_shard() {
    let shards = CuboidShards::new(7);
    assert_eq!(shards.shard_count(42), 1);
    assert_eq!(shards.shards_of(42), vec![shards.start_shard(42)]);
}

#[test]
fn insert_clamps_to_region_count() {
    let mut shards = CuboidShards::new(5);
    shards.insert(1, 0);
    shards.insert(2, 9);
    assert_eq!(shards.shard_count(1), 1);
    assert_eq!(shards.shard_count(2), 5);
}

#[test]
fn shards_are_consecutive_and_wrap() {
    let mut shards = CuboidShards::new(7);
    for cuboid in 0..64u64 {
        shards.insert(cuboid, 3);
        let start = shards.start_shard(cuboid);
        assert!(start < 7);
        let expected: Vec<u16> = (0..3).map(|i| (start + i) % 7).collect();
        assert_eq!(shards.shards_of(cuboid), expected);
    }
}

#[test]
fn rows_land_inside_their_cuboid_shards() {
    let mut shards = CuboidShards::new(11);
    shards.insert(0b1011, 4);
    let owned = shards.shards_of(0b1011);
    for i in 0u32..200 {
        let shard = shards.shard_for_row(0b1011, &i.to_be_bytes());
        assert!(owned.contains(&shard));
    }
    assert_eq!(
        shards.shard_for_row(0b1011, b"abc"),
        shards.shard_for_row(0b1011, b"abc")
    );
}

#[test]
fn split_keys_are_shard_ids() {
    let shards = CuboidShards::new(3);
    assert_eq!(shards.split_keys(), vec![vec![0, 1], vec![0, 2]]);
    assert!(CuboidShards::new(1).split_keys().is_empty());
}

#[test]
fn save_and_load_keep_assignment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("segment").join("cuboid_shards.json");

    let mut shards = CuboidShards::new(13);
    shards.insert(0b111, 13);
    shards.insert(0b101, 2);
    shards.save(&path).unwrap();

    let loaded = CuboidShards::load(&path).unwrap();
    assert_eq!(loaded, shards);
    assert_eq!(loaded.shards_of(0b101), shards.shards_of(0b101));
}

#[test]
fn load_rejects_zero_regions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"region_count":0,"shards":{}}"#).unwrap();
    assert!(matches!(
        CuboidShards::load(&path),
        Err(PlanError::Corrupt(_))
    ));

    fs::write(&path, "not json").unwrap();
    assert!(matches!(CuboidShards::load(&path), Err(PlanError::Json(_))));
}
