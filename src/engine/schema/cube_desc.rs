use serde::{Deserialize, Serialize};

use crate::engine::errors::CodecError;

pub const MAX_DIMENSIONS: usize = 63;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureFunction {
    Sum { scale: u32 },
    Min { scale: u32 },
    Max { scale: u32 },
    Count,
    CountDistinct { precision: u8 },
}

impl MeasureFunction {
    pub fn is_sketch(&self) -> bool {
        matches!(self, MeasureFunction::CountDistinct { .. })
    }

    pub fn takes_input(&self) -> bool {
        !matches!(self, MeasureFunction::Count)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionDesc {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureDesc {
    pub name: String,
    pub function: MeasureFunction,
    /// Flat-table column feeding this measure
    pub input: Option<usize>,
}

/// Static description of a cube: dimension order defines cuboid bit positions
/// (bit `i` is dimension `i`) and the flat-table column layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeDesc {
    pub name: String,
    pub dimensions: Vec<DimensionDesc>,
    pub measures: Vec<MeasureDesc>,
}

impl CubeDesc {
    /// Flat layout helper: dimensions occupy columns `0..n`, and each measure that
    /// takes an input reads the next column in declaration order.
    pub fn with_flat_layout(
        name: &str,
        dimensions: &[&str],
        measures: Vec<(&str, MeasureFunction)>,
    ) -> Self {
        let mut next_col = dimensions.len();
        let measures = measures
            .into_iter()
            .map(|(measure_name, function)| {
                let input = if function.takes_input() {
                    next_col += 1;
                    Some(next_col - 1)
                } else {
                    None
                };
                MeasureDesc {
                    name: measure_name.to_string(),
                    function,
                    input,
                }
            })
            .collect();
        Self {
            name: name.to_string(),
            dimensions: dimensions
                .iter()
                .map(|d| DimensionDesc {
                    name: d.to_string(),
                })
                .collect(),
            measures,
        }
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    pub fn base_cuboid_id(&self) -> u64 {
        base_cuboid_for(self.dimensions.len())
    }

    /// Number of columns the feeder must supply per row.
    pub fn flat_column_count(&self) -> usize {
        self.measures
            .iter()
            .filter_map(|m| m.input)
            .map(|c| c + 1)
            .max()
            .unwrap_or(0)
            .max(self.dimensions.len())
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if self.dimensions.is_empty() || self.dimensions.len() > MAX_DIMENSIONS {
            return Err(CodecError::InvalidDescriptor(format!(
                "cube {} has {} dimensions, expected 1..={}",
                self.name,
                self.dimensions.len(),
                MAX_DIMENSIONS
            )));
        }
        for m in &self.measures {
            match (m.function.takes_input(), m.input) {
                (true, None) => {
                    return Err(CodecError::InvalidDescriptor(format!(
                        "measure {} needs an input column",
                        m.name
                    )));
                }
                (_, Some(col)) if col < self.dimensions.len() => {
                    return Err(CodecError::InvalidDescriptor(format!(
                        "measure {} reads dimension column {}",
                        m.name, col
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

pub fn base_cuboid_for(dimension_count: usize) -> u64 {
    if dimension_count >= 64 {
        u64::MAX
    } else {
        (1u64 << dimension_count) - 1
    }
}
