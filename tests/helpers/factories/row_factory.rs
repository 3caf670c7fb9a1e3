use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::cube_factory::CubeFactory;

/// Random flat-table rows for a [`CubeFactory`] cube. Every measure input
/// column receives the same price so sum, min and max agree on a row.
pub struct RowFactory {
    rng: StdRng,
    dimension_values: Vec<Vec<String>>,
    measure_inputs: usize,
}

impl RowFactory {
    pub fn new(cube: &CubeFactory) -> Self {
        Self {
            rng: StdRng::seed_from_u64(42),
            dimension_values: (0..cube.dimension_count())
                .map(|d| cube.dimension_values(d).to_vec())
                .collect(),
            measure_inputs: cube.measure_input_count(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// A row with fixed dimension values and price.
    pub fn row(&self, dims: &[&str], price: &str) -> Vec<String> {
        let mut row: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
        row.extend(std::iter::repeat_n(price.to_string(), self.measure_inputs));
        row
    }

    pub fn create(&mut self) -> Vec<String> {
        let mut row: Vec<String> = self
            .dimension_values
            .iter()
            .map(|values| values[self.rng.gen_range(0..values.len())].clone())
            .collect();
        let cents: u32 = self.rng.gen_range(1..100_000);
        let price = format!("{}.{:02}", cents / 100, cents % 100);
        row.extend(std::iter::repeat_n(price, self.measure_inputs));
        row
    }

    pub fn create_list(&mut self, count: usize) -> Vec<Vec<String>> {
        (0..count).map(|_| self.create()).collect()
    }
}
