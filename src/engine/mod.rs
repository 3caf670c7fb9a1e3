pub mod build;
pub mod codec;
pub mod cuboid;
pub mod errors;
pub mod measure;
pub mod plan;
pub mod scan;
pub mod schema;
pub mod store;

pub use errors::*;
