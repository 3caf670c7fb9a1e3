use crate::engine::measure::MeasureState;

/// One grouped row of a cuboid: dictionary codes of the present dimensions
/// (ascending dimension order) and one accumulator per measure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub dims: Vec<u32>,
    pub measures: Vec<MeasureState>,
}

impl Record {
    pub fn new(dims: Vec<u32>, measures: Vec<MeasureState>) -> Self {
        Self { dims, measures }
    }
}
