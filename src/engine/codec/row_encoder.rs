use std::sync::Arc;

use crate::engine::codec::dictionary::Dictionary;
use crate::engine::errors::CodecError;
use crate::engine::measure::MeasureState;
use crate::engine::schema::{CubeDesc, GtInfo, Record};

/// Turns feeder rows (flat-table strings) into base cuboid records.
#[derive(Clone)]
pub struct FlatRowEncoder {
    desc: Arc<CubeDesc>,
    dictionaries: Vec<Arc<dyn Dictionary>>,
    flat_columns: usize,
}

impl FlatRowEncoder {
    pub fn new(
        desc: Arc<CubeDesc>,
        dictionaries: Vec<Arc<dyn Dictionary>>,
    ) -> Result<Self, CodecError> {
        desc.validate()?;
        if dictionaries.len() != desc.dimension_count() {
            return Err(CodecError::InvalidDescriptor(format!(
                "{} dictionaries for {} dimensions",
                dictionaries.len(),
                desc.dimension_count()
            )));
        }
        let flat_columns = desc.flat_column_count();
        Ok(Self {
            desc,
            dictionaries,
            flat_columns,
        })
    }

    /// Column layout implied by the dictionaries' code widths.
    pub fn gt_info(&self) -> Result<GtInfo, CodecError> {
        let widths = self.dictionaries.iter().map(|d| d.size_of_id()).collect();
        GtInfo::new(&self.desc, widths)
    }

    pub fn desc(&self) -> &CubeDesc {
        &self.desc
    }

    pub fn dictionary(&self, dim: usize) -> &dyn Dictionary {
        self.dictionaries[dim].as_ref()
    }

    pub fn encode_row(&self, row: &[String]) -> Result<Record, CodecError> {
        if row.len() != self.flat_columns {
            return Err(CodecError::ColumnCount {
                expected: self.flat_columns,
                got: row.len(),
            });
        }

        let mut dims = Vec::with_capacity(self.dictionaries.len());
        for (i, dict) in self.dictionaries.iter().enumerate() {
            let code = dict
                .id_of(&row[i])
                .ok_or_else(|| CodecError::UnknownValue {
                    dimension: self.desc.dimensions[i].name.clone(),
                    value: row[i].clone(),
                })?;
            dims.push(code);
        }

        let mut measures = Vec::with_capacity(self.desc.measures.len());
        for m in &self.desc.measures {
            let raw = m.input.map(|c| row[c].as_str());
            measures.push(MeasureState::from_input(&m.function, raw)?);
        }

        Ok(Record::new(dims, measures))
    }
}
