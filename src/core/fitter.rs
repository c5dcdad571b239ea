use crate::core::{
    cost::CostFunction,
    curve::{generate_heart, DEFAULT_CURVE_POINTS},
    error::FitError,
    optimizer::{OptimizationResult, Optimizer, OptimizerConfig},
    spatial_index::SpatialIndex,
};
use geo::Point;
use std::time::Instant;

/// Smallest curve the fitter accepts
pub const MIN_CURVE_POINTS: usize = 3;

/// Fitter settings
#[derive(Debug, Clone, PartialEq)]
pub struct FitterConfig {
    /// Samples taken along the heart outline
    pub num_points: usize,
    pub optimizer: OptimizerConfig,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            num_points: DEFAULT_CURVE_POINTS,
            optimizer: OptimizerConfig::default(),
        }
    }
}

/// A dataset point chosen as nearest to one fitted curve point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPoint {
    /// Position of the curve sample this match belongs to
    pub curve_index: usize,
    /// Index of the matched point in the input point set
    pub node_index: usize,
    pub point: Point<f64>,
    /// Distance from the fitted curve point to `point`
    pub distance: f64,
}

/// Outcome of fitting the heart onto a point set
#[derive(Debug, Clone)]
pub struct FitReport {
    /// One entry per curve point, in curve order; nodes may repeat
    pub matches: Vec<MatchedPoint>,
    pub optimization: OptimizationResult,
    /// Root-mean-square distance between fitted curve and matched nodes
    pub rms_distance: f64,
}

/// Fits the heart curve onto a point set
///
/// # Pipeline Stages
/// 1. Build the spatial index over the point set
/// 2. Sample the heart curve
/// 3. Minimise the alignment cost over scale, rotation and translation
/// 4. Look up the nearest node for every fitted curve point
#[derive(Debug, Clone, Default)]
pub struct HeartFitter {
    config: FitterConfig,
}

impl HeartFitter {
    pub fn new(config: FitterConfig) -> Self {
        Self { config }
    }

    pub fn fit(&self, points: &[Point<f64>]) -> Result<FitReport, FitError> {
        if self.config.num_points < MIN_CURVE_POINTS {
            return Err(FitError::TooFewCurvePoints {
                requested: self.config.num_points,
                min: MIN_CURVE_POINTS,
            });
        }

        let started = Instant::now();
        let index = SpatialIndex::new(points)?;
        let curve = generate_heart(self.config.num_points);

        let objective = CostFunction::new(&curve, &index);
        let optimization = Optimizer::new(self.config.optimizer.clone()).minimize(&objective);

        let fitted = optimization.transform.apply(&curve);
        let matches: Vec<MatchedPoint> = index
            .nearest_all(&fitted)
            .into_iter()
            .enumerate()
            .map(|(curve_index, nearest)| MatchedPoint {
                curve_index,
                node_index: nearest.index,
                point: points[nearest.index],
                distance: nearest.distance(),
            })
            .collect();

        let rms_distance = if optimization.cost.is_finite() {
            (optimization.cost / curve.len() as f64).sqrt()
        } else {
            f64::INFINITY
        };

        tracing::debug!(
            "Fitted {} curve points onto {} nodes in {} ms (cost {:.6e}, rms {:.6e})",
            curve.len(),
            points.len(),
            started.elapsed().as_millis(),
            optimization.cost,
            rms_distance
        );

        Ok(FitReport {
            matches,
            optimization,
            rms_distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_tiny_curve() {
        let fitter = HeartFitter::new(FitterConfig {
            num_points: 2,
            ..FitterConfig::default()
        });
        let err = fitter.fit(&[Point::new(0.0, 0.0)]).unwrap_err();
        assert_eq!(err, FitError::TooFewCurvePoints { requested: 2, min: 3 });
    }

    #[test]
    fn test_rejects_empty_point_set() {
        let fitter = HeartFitter::default();
        assert_eq!(fitter.fit(&[]).unwrap_err(), FitError::EmptyPointSet);
    }

    #[test]
    fn test_single_node_gets_every_match() {
        let fitter = HeartFitter::default();
        let report = fitter.fit(&[Point::new(4.0, 4.0)]).unwrap();
        assert_eq!(report.matches.len(), 200);
        assert!(report.matches.iter().all(|m| m.node_index == 0));
        assert!(report
            .matches
            .iter()
            .enumerate()
            .all(|(i, m)| m.curve_index == i));
    }
}
