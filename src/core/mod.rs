// Core algorithm exports
pub mod cost;
pub mod curve;
pub mod error;
pub mod fitter;
pub mod optimizer;
pub mod spatial_index;
pub mod transform;

pub use cost::CostFunction;
pub use curve::{generate_heart, heart_point, DEFAULT_CURVE_POINTS};
pub use error::FitError;
pub use fitter::{FitReport, FitterConfig, HeartFitter, MatchedPoint, MIN_CURVE_POINTS};
pub use optimizer::{Bounds, OptimizationResult, Optimizer, OptimizerConfig, Termination};
pub use spatial_index::{Nearest, SpatialIndex};
pub use transform::RigidTransform;
