pub mod cube_factory;
pub mod row_factory;

pub use cube_factory::CubeFactory;
pub use row_factory::RowFactory;
