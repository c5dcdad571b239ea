// Service exports
pub mod dataset;

pub use dataset::{parse_point_set, DatasetError, DatasetLoader, PointSet};
