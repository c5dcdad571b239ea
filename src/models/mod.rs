// Model exports
pub mod requests;
pub mod responses;

pub use requests::{FitHeartRequest, InitialGuess};
pub use responses::{build_feature_collection, ErrorResponse, FitSummary, HealthResponse, TransformParams};
