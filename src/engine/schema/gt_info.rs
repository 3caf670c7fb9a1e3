use crate::engine::errors::CodecError;
use crate::engine::measure::aggregator::measure_space_estimate;
use crate::engine::schema::cube_desc::{CubeDesc, MeasureFunction, base_cuboid_for};

/// Column layout shared by every cuboid of a cube.
///
/// Column block 0 holds the dimension (primary key) columns, block `k` holds
/// measure `k - 1`. A cuboid only carries the dimensions whose bit is set, in
/// ascending dimension order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GtInfo {
    dimension_names: Vec<String>,
    dimension_widths: Vec<usize>,
    measures: Vec<MeasureFunction>,
}

impl GtInfo {
    pub fn new(desc: &CubeDesc, dimension_widths: Vec<usize>) -> Result<Self, CodecError> {
        desc.validate()?;
        if dimension_widths.len() != desc.dimension_count() {
            return Err(CodecError::InvalidDescriptor(format!(
                "{} dimension widths for {} dimensions",
                dimension_widths.len(),
                desc.dimension_count()
            )));
        }
        if let Some(w) = dimension_widths.iter().find(|w| **w == 0 || **w > 4) {
            return Err(CodecError::InvalidDescriptor(format!(
                "dimension code width {w} outside 1..=4"
            )));
        }
        Ok(Self {
            dimension_names: desc.dimensions.iter().map(|d| d.name.clone()).collect(),
            dimension_widths,
            measures: desc.measures.iter().map(|m| m.function.clone()).collect(),
        })
    }

    pub fn dimension_count(&self) -> usize {
        self.dimension_widths.len()
    }

    pub fn dimension_name(&self, dim: usize) -> &str {
        &self.dimension_names[dim]
    }

    pub fn dimension_width(&self, dim: usize) -> usize {
        self.dimension_widths[dim]
    }

    pub fn base_cuboid(&self) -> u64 {
        base_cuboid_for(self.dimension_count())
    }

    /// Dimension indexes present in `cuboid`, ascending.
    pub fn dimensions_of(&self, cuboid: u64) -> impl Iterator<Item = usize> + '_ {
        (0..self.dimension_count()).filter(move |d| cuboid & (1u64 << d) != 0)
    }

    /// Encoded byte width of a cuboid's dimension codes.
    pub fn key_width(&self, cuboid: u64) -> usize {
        self.dimensions_of(cuboid)
            .map(|d| self.dimension_widths[d])
            .sum()
    }

    pub fn measure_count(&self) -> usize {
        self.measures.len()
    }

    pub fn measure(&self, idx: usize) -> &MeasureFunction {
        &self.measures[idx]
    }

    pub fn measures(&self) -> &[MeasureFunction] {
        &self.measures
    }

    pub fn column_block_count(&self) -> usize {
        1 + self.measures.len()
    }

    pub fn measure_space_estimate(&self, idx: usize) -> usize {
        measure_space_estimate(&self.measures[idx])
    }
}
