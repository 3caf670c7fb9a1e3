use std::cmp::Reverse;
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::engine::cuboid::cuboid_id::{is_descendant_of, popcount};
use crate::engine::errors::LatticeError;
use crate::engine::schema::cube_desc::{MAX_DIMENSIONS, base_cuboid_for};

/// Above this many dimensions the full power set is not enumerated.
pub const MAX_ENUMERATED_DIMENSIONS: usize = 24;

const LOG_TARGET: &str = "engine::cuboid::scheduler";

/// Which cuboids of the lattice get materialized. The base cuboid is always
/// included.
#[derive(Clone, Debug)]
pub enum RequiredCuboids {
    All,
    /// Every cuboid containing all dimensions of the mask.
    Mandatory(u64),
    Explicit(Vec<u64>),
}

/// Derivation plan over the required cuboids: each non-base cuboid has one
/// spanning parent that is materialized before it.
#[derive(Clone, Debug)]
pub struct CuboidScheduler {
    dimension_count: usize,
    base: u64,
    required: BTreeSet<u64>,
    parents: FxHashMap<u64, u64>,
    spanning: FxHashMap<u64, Vec<u64>>,
    order: Vec<u64>,
}

impl CuboidScheduler {
    pub fn all(dimension_count: usize) -> Result<Self, LatticeError> {
        Self::new(dimension_count, RequiredCuboids::All)
    }

    pub fn new(dimension_count: usize, rule: RequiredCuboids) -> Result<Self, LatticeError> {
        if dimension_count == 0 || dimension_count > MAX_DIMENSIONS {
            return Err(LatticeError::TooManyDimensions(dimension_count));
        }
        let base = base_cuboid_for(dimension_count);

        let mut required = BTreeSet::new();
        match rule {
            RequiredCuboids::All | RequiredCuboids::Mandatory(_)
                if dimension_count > MAX_ENUMERATED_DIMENSIONS =>
            {
                return Err(LatticeError::TooManyDimensions(dimension_count));
            }
            RequiredCuboids::All => required.extend(0..=base),
            RequiredCuboids::Mandatory(mask) => {
                let mask = mask & base;
                required.extend((0..=base).filter(|c| c & mask == mask));
            }
            RequiredCuboids::Explicit(ids) => {
                for id in ids {
                    if id & base != id {
                        return Err(LatticeError::NotInLattice { cuboid: id, base });
                    }
                    required.insert(id);
                }
            }
        }
        required.insert(base);

        let mut order: Vec<u64> = required.iter().copied().collect();
        order.sort_by_key(|c| (Reverse(popcount(*c)), Reverse(*c)));

        let mut parents = FxHashMap::default();
        let mut spanning: FxHashMap<u64, Vec<u64>> = FxHashMap::default();
        for &cuboid in &order {
            if cuboid == base {
                continue;
            }
            let parent = pick_parent(cuboid, dimension_count, &required);
            parents.insert(cuboid, parent);
            spanning.entry(parent).or_default().push(cuboid);
        }

        debug!(
            target: LOG_TARGET,
            dimensions = dimension_count,
            cuboids = order.len(),
            "Cuboid schedule computed"
        );

        Ok(Self {
            dimension_count,
            base,
            required,
            parents,
            spanning,
            order,
        })
    }

    pub fn dimension_count(&self) -> usize {
        self.dimension_count
    }

    pub fn base_cuboid(&self) -> u64 {
        self.base
    }

    pub fn cuboid_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_required(&self, cuboid: u64) -> bool {
        self.required.contains(&cuboid)
    }

    /// Required cuboids obtained by clearing exactly one set bit.
    pub fn children(&self, cuboid: u64) -> BTreeSet<u64> {
        (0..self.dimension_count)
            .map(|d| 1u64 << d)
            .filter(|bit| cuboid & bit != 0)
            .map(|bit| cuboid & !bit)
            .filter(|child| self.required.contains(child))
            .collect()
    }

    /// Cuboid this one is rolled up from; `None` for the base cuboid.
    pub fn parent_of(&self, cuboid: u64) -> Option<u64> {
        self.parents.get(&cuboid).copied()
    }

    /// Cuboids rolled up directly from this one, in build order.
    pub fn spanning_children(&self, cuboid: u64) -> &[u64] {
        self.spanning
            .get(&cuboid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Parents strictly precede children: descending dimension count, then
    /// descending id.
    pub fn build_order(&self) -> &[u64] {
        &self.order
    }

    /// Build order grouped by dimension count. The first generation is the base
    /// cuboid alone.
    pub fn generations(&self) -> Vec<Vec<u64>> {
        let mut out: Vec<Vec<u64>> = Vec::new();
        let mut current_level = None;
        for &cuboid in &self.order {
            let level = popcount(cuboid);
            if current_level != Some(level) {
                out.push(Vec::new());
                current_level = Some(level);
            }
            if let Some(last) = out.last_mut() {
                last.push(cuboid);
            }
        }
        out
    }
}

/// Prefers a required one-bit parent (smallest id), otherwise the closest
/// required ancestor. The base cuboid always qualifies.
fn pick_parent(cuboid: u64, dimension_count: usize, required: &BTreeSet<u64>) -> u64 {
    let direct = (0..dimension_count)
        .map(|d| 1u64 << d)
        .filter(|bit| cuboid & bit == 0)
        .map(|bit| cuboid | bit)
        .filter(|p| required.contains(p))
        .min();
    if let Some(parent) = direct {
        return parent;
    }
    required
        .iter()
        .copied()
        .filter(|candidate| is_descendant_of(cuboid, *candidate))
        .min_by_key(|candidate| (popcount(*candidate), *candidate))
        .unwrap_or_else(|| base_cuboid_for(dimension_count))
}
