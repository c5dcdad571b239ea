use thiserror::Error;

/// Errors raised by the fitting core
#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("Point set is empty")]
    EmptyPointSet,

    #[error("Point {index} has a non-finite coordinate")]
    NonFinitePoint { index: usize },

    #[error("Curve needs at least {min} points, got {requested}")]
    TooFewCurvePoints { requested: usize, min: usize },
}
