//! Heart Fit - fits a heart-shaped curve onto a set of bicycle-parking nodes
//!
//! This library provides the curve generator, rigid transform, spatial index,
//! cost function and optimizer behind the `/fit-heart` endpoint, plus the
//! dataset loader and HTTP routes that expose them.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{generate_heart, FitReport, FitterConfig, HeartFitter, OptimizerConfig, RigidTransform, SpatialIndex};
pub use models::{FitHeartRequest, FitSummary};
