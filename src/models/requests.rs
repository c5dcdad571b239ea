use crate::core::{FitterConfig, RigidTransform};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Optional overrides accepted by `POST /fit-heart`
///
/// Every field may be omitted. Fields the service does not know about (the
/// web client sends `location` and `drawing`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FitHeartRequest {
    #[validate(range(min = 3, max = 5000))]
    #[serde(default)]
    pub num_points: Option<usize>,

    #[validate(nested)]
    #[serde(default)]
    pub initial_guess: Option<InitialGuess>,

    #[validate(range(min = 1, max = 10000))]
    #[serde(default)]
    pub max_iterations: Option<usize>,
}

/// Starting transform for the optimizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct InitialGuess {
    #[validate(range(min = -1e9, max = 1e9), custom(function = "validate_non_zero"))]
    pub scale: f64,
    #[validate(range(min = -1e9, max = 1e9))]
    pub rotation: f64,
    #[validate(range(min = -1e9, max = 1e9))]
    pub tx: f64,
    #[validate(range(min = -1e9, max = 1e9))]
    pub ty: f64,
}

/// A zero scale collapses the curve onto a single point
fn validate_non_zero(value: f64) -> Result<(), ValidationError> {
    if value == 0.0 {
        return Err(ValidationError::new("non_zero"));
    }
    Ok(())
}

impl From<InitialGuess> for RigidTransform {
    fn from(guess: InitialGuess) -> Self {
        RigidTransform::new(guess.scale, guess.rotation, guess.tx, guess.ty)
    }
}

impl FitHeartRequest {
    /// Interpret an arbitrary JSON body
    ///
    /// Objects are read for overrides; any other JSON value carries none.
    pub fn from_body(body: serde_json::Value) -> Result<Self, serde_json::Error> {
        if body.is_object() {
            serde_json::from_value(body)
        } else {
            Ok(Self::default())
        }
    }

    pub fn has_overrides(&self) -> bool {
        self.num_points.is_some() || self.initial_guess.is_some() || self.max_iterations.is_some()
    }

    /// The service configuration with this request's overrides applied
    pub fn apply_to(&self, base: &FitterConfig) -> FitterConfig {
        let mut config = base.clone();
        if let Some(num_points) = self.num_points {
            config.num_points = num_points;
        }
        if let Some(guess) = self.initial_guess {
            config.optimizer.initial_guess = guess.into();
        }
        if let Some(max_iterations) = self.max_iterations {
            config.optimizer.max_iterations = max_iterations;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_payload_is_ignored() {
        let body = json!({
            "location": { "lat": 48.14, "lng": 11.58 },
            "drawing": [{ "x": 1.0, "y": 2.0 }]
        });
        let req = FitHeartRequest::from_body(body).unwrap();
        assert!(!req.has_overrides());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_non_object_body() {
        let req = FitHeartRequest::from_body(json!([1, 2, 3])).unwrap();
        assert_eq!(req, FitHeartRequest::default());
    }

    #[test]
    fn test_overrides_applied() {
        let body = json!({
            "numPoints": 64,
            "initialGuess": { "scale": 0.2, "rotation": 0.0, "tx": 11.5, "ty": 48.1 },
            "maxIterations": 50
        });
        let req = FitHeartRequest::from_body(body).unwrap();
        assert!(req.validate().is_ok());

        let config = req.apply_to(&FitterConfig::default());
        assert_eq!(config.num_points, 64);
        assert_eq!(config.optimizer.max_iterations, 50);
        assert_eq!(config.optimizer.initial_guess, RigidTransform::new(0.2, 0.0, 11.5, 48.1));
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let req = FitHeartRequest::from_body(json!({ "numPoints": 2 })).unwrap();
        assert!(req.validate().is_err());

        let req = FitHeartRequest::from_body(json!({
            "initialGuess": { "scale": 0.0, "rotation": 0.0, "tx": 0.0, "ty": 0.0 }
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_negative_scale_is_accepted() {
        let req = FitHeartRequest::from_body(json!({
            "initialGuess": { "scale": -0.1, "rotation": 0.0, "tx": 2.5, "ty": 2.5 }
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_wrong_field_type_is_an_error() {
        assert!(FitHeartRequest::from_body(json!({ "numPoints": "many" })).is_err());
    }
}
