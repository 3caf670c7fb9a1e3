use std::sync::Arc;

use crate::engine::build::InMemCubeBuilder;
use crate::engine::codec::{Dictionary, FlatRowEncoder, SortedDictionary};
use crate::engine::cuboid::{CuboidScheduler, RequiredCuboids};
use crate::engine::schema::{CubeDesc, GtInfo, MeasureFunction};
use crate::shared::config::BuildConfig;

/// Sales cube by default: seller, year and category dimensions with
/// sum/min/max over a 2-decimal price plus a row count.
pub struct CubeFactory {
    name: String,
    dimensions: Vec<(String, Vec<String>)>,
    measures: Vec<(String, MeasureFunction)>,
    required: RequiredCuboids,
}

impl CubeFactory {
    pub fn new() -> Self {
        Self {
            name: "sales".into(),
            dimensions: vec![
                ("seller".into(), vec!["s1".into(), "s2".into(), "s3".into(), "s4".into()]),
                ("year".into(), vec!["2010".into(), "2011".into(), "2012".into()]),
                ("category".into(), vec!["books".into(), "games".into()]),
            ],
            measures: vec![
                ("gmv_sum".into(), MeasureFunction::Sum { scale: 2 }),
                ("gmv_min".into(), MeasureFunction::Min { scale: 2 }),
                ("gmv_max".into(), MeasureFunction::Max { scale: 2 }),
                ("trans_cnt".into(), MeasureFunction::Count),
            ],
            required: RequiredCuboids::All,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_dimensions(mut self, dimensions: Vec<(&str, Vec<&str>)>) -> Self {
        self.dimensions = dimensions
            .into_iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.into_iter().map(str::to_string).collect(),
                )
            })
            .collect();
        self
    }

    pub fn with_measures(mut self, measures: Vec<(&str, MeasureFunction)>) -> Self {
        self.measures = measures
            .into_iter()
            .map(|(name, f)| (name.to_string(), f))
            .collect();
        self
    }

    pub fn with_required(mut self, required: RequiredCuboids) -> Self {
        self.required = required;
        self
    }

    pub fn dimension_values(&self, dim: usize) -> &[String] {
        &self.dimensions[dim].1
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of flat-table columns read by measures.
    pub fn measure_input_count(&self) -> usize {
        self.measures.iter().filter(|(_, f)| f.takes_input()).count()
    }

    pub fn desc(&self) -> Arc<CubeDesc> {
        let names: Vec<&str> = self.dimensions.iter().map(|(n, _)| n.as_str()).collect();
        let measures = self
            .measures
            .iter()
            .map(|(n, f)| (n.as_str(), f.clone()))
            .collect();
        Arc::new(CubeDesc::with_flat_layout(&self.name, &names, measures))
    }

    pub fn dictionaries(&self) -> Vec<Arc<dyn Dictionary>> {
        self.dimensions
            .iter()
            .map(|(name, values)| {
                let dict = SortedDictionary::from_values(name, values.iter().cloned())
                    .expect("dictionary");
                Arc::new(dict) as Arc<dyn Dictionary>
            })
            .collect()
    }

    pub fn encoder(&self) -> FlatRowEncoder {
        FlatRowEncoder::new(self.desc(), self.dictionaries()).expect("encoder")
    }

    pub fn info(&self) -> GtInfo {
        self.encoder().gt_info().expect("gt info")
    }

    pub fn scheduler(&self) -> Arc<CuboidScheduler> {
        Arc::new(
            CuboidScheduler::new(self.dimensions.len(), self.required.clone())
                .expect("scheduler"),
        )
    }

    pub fn builder(&self, config: &BuildConfig) -> InMemCubeBuilder {
        InMemCubeBuilder::new(self.scheduler(), self.encoder(), config).expect("builder")
    }
}
