pub use super::factories::{CubeFactory, RowFactory};

pub struct Factory;

impl Factory {
    pub fn cube() -> CubeFactory {
        CubeFactory::new()
    }

    pub fn rows(cube: &CubeFactory) -> RowFactory {
        RowFactory::new(cube)
    }
}
