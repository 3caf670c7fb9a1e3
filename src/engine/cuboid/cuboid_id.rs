pub fn popcount(cuboid: u64) -> u32 {
    cuboid.count_ones()
}

/// `child` is `parent` with exactly one bit cleared.
pub fn is_child_of(child: u64, parent: u64) -> bool {
    child & parent == child && popcount(parent ^ child) == 1
}

/// `descendant` keeps a strict subset of `ancestor`'s dimensions.
pub fn is_descendant_of(descendant: u64, ancestor: u64) -> bool {
    descendant & ancestor == descendant && descendant != ancestor
}
