pub mod cuboid_id;
pub mod scheduler;


pub use cuboid_id::{is_child_of, popcount};
pub use scheduler::{CuboidScheduler, RequiredCuboids};
