use rustc_hash::FxHashMap;

use crate::engine::errors::BuildError;
use crate::engine::measure::MeasureState;
use crate::engine::schema::Record;

const GROUP_OVERHEAD_BYTES: u64 = 48;

/// Grouped records of one cuboid, keyed by dimension codes.
#[derive(Clone, Debug)]
pub struct CuboidTable {
    cuboid: u64,
    groups: FxHashMap<Vec<u32>, Vec<MeasureState>>,
    estimated_bytes: u64,
}

impl CuboidTable {
    pub fn new(cuboid: u64) -> Self {
        Self {
            cuboid,
            groups: FxHashMap::default(),
            estimated_bytes: 0,
        }
    }

    pub fn cuboid(&self) -> u64 {
        self.cuboid
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn estimated_bytes(&self) -> u64 {
        self.estimated_bytes
    }

    /// Merges one record into its group, creating the group on first sight.
    pub fn add(&mut self, record: Record) -> Result<(), BuildError> {
        self.merge_group(record.dims, record.measures)
    }

    fn merge_group(&mut self, key: Vec<u32>, measures: Vec<MeasureState>) -> Result<(), BuildError> {
        match self.groups.get_mut(&key) {
            Some(states) => merge_states(self.cuboid, states, &measures)?,
            None => {
                self.estimated_bytes += group_bytes(&key, &measures);
                self.groups.insert(key, measures);
            }
        }
        Ok(())
    }

    /// Derives `child` by dropping the dimensions it does not keep and
    /// re-merging measures of the groups that collapse together.
    pub fn rollup(&self, child: u64) -> Result<CuboidTable, BuildError> {
        debug_assert_eq!(child & self.cuboid, child);
        let keep: Vec<usize> = (0..64u32)
            .filter(|d| self.cuboid & (1u64 << d) != 0)
            .enumerate()
            .filter(|(_, d)| child & (1u64 << d) != 0)
            .map(|(pos, _)| pos)
            .collect();

        let mut out = CuboidTable::new(child);
        for (key, states) in &self.groups {
            let child_key: Vec<u32> = keep.iter().map(|&pos| key[pos]).collect();
            match out.groups.get_mut(&child_key) {
                Some(existing) => merge_states(child, existing, states)?,
                None => {
                    out.estimated_bytes += group_bytes(&child_key, states);
                    out.groups.insert(child_key, states.clone());
                }
            }
        }
        Ok(out)
    }

    /// Folds another partial table of the same cuboid into this one.
    pub fn merge_from(&mut self, other: CuboidTable) -> Result<(), BuildError> {
        debug_assert_eq!(self.cuboid, other.cuboid);
        for (key, states) in other.groups {
            self.merge_group(key, states)?;
        }
        Ok(())
    }

    /// Records ordered by dimension codes, which is also row-key order.
    pub fn sorted_records(&self) -> Vec<Record> {
        let mut records: Vec<Record> = self
            .groups
            .iter()
            .map(|(k, v)| Record::new(k.clone(), v.clone()))
            .collect();
        records.sort_by(|a, b| a.dims.cmp(&b.dims));
        records
    }
}

fn merge_states(
    cuboid: u64,
    into: &mut [MeasureState],
    from: &[MeasureState],
) -> Result<(), BuildError> {
    for (a, b) in into.iter_mut().zip(from.iter()) {
        a.merge(b)
            .map_err(|source| BuildError::Measure { cuboid, source })?;
    }
    Ok(())
}

fn group_bytes(key: &[u32], measures: &[MeasureState]) -> u64 {
    GROUP_OVERHEAD_BYTES
        + (key.len() * 4) as u64
        + measures.iter().map(|m| m.estimated_bytes() as u64).sum::<u64>()
}
