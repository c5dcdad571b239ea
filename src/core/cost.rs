use crate::core::{spatial_index::SpatialIndex, transform::RigidTransform};
use geo::Point;

/// Least-squares alignment objective of a curve against an indexed point set
///
/// For a transform, the cost is the sum over curve points of the squared
/// distance from the transformed point to its nearest indexed point.
pub struct CostFunction<'a> {
    curve: &'a [Point<f64>],
    index: &'a SpatialIndex,
}

impl<'a> CostFunction<'a> {
    pub fn new(curve: &'a [Point<f64>], index: &'a SpatialIndex) -> Self {
        Self { curve, index }
    }

    pub fn cost(&self, transform: &RigidTransform) -> f64 {
        let (sin, cos) = transform.rotation.sin_cos();
        self.curve
            .iter()
            .map(|p| {
                let (x, y) = p.x_y();
                let q = Point::new(
                    transform.scale * (x * cos - y * sin) + transform.tx,
                    transform.scale * (x * sin + y * cos) + transform.ty,
                );
                if q.x().is_finite() && q.y().is_finite() {
                    self.index.nearest(q).distance_sq
                } else {
                    f64::INFINITY
                }
            })
            .sum()
    }

    #[inline]
    pub fn cost_at(&self, params: &[f64; 4]) -> f64 {
        self.cost(&RigidTransform::from_array(*params))
    }

    /// Central finite-difference gradient over (scale, rotation, tx, ty)
    ///
    /// The objective is only piecewise smooth: its derivative jumps whenever a
    /// curve point switches nearest neighbour.
    pub fn gradient(&self, params: &[f64; 4], step: f64) -> [f64; 4] {
        let mut grad = [0.0; 4];
        for i in 0..4 {
            let h = step * params[i].abs().max(1.0);
            let mut forward = *params;
            let mut backward = *params;
            forward[i] += h;
            backward[i] -= h;
            grad[i] = (self.cost_at(&forward) - self.cost_at(&backward)) / (2.0 * h);
        }
        grad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::curve::generate_heart;

    #[test]
    fn test_cost_zero_on_exact_copy() {
        let curve = generate_heart(50);
        let truth = RigidTransform::new(0.2, 0.4, -1.0, 3.0);
        let targets = truth.apply(&curve);
        let index = SpatialIndex::new(&targets).unwrap();
        let cost = CostFunction::new(&curve, &index);

        assert!(cost.cost(&truth) < 1e-18);
        assert!(cost.cost(&RigidTransform::new(0.2, 0.4, -0.9, 3.0)) > 0.0);
    }

    #[test]
    fn test_cost_single_target() {
        // Every transformed point has the same nearest neighbour
        let curve = vec![Point::new(1.0, 0.0), Point::new(-1.0, 0.0)];
        let index = SpatialIndex::new(&[Point::new(0.0, 0.0)]).unwrap();
        let cost = CostFunction::new(&curve, &index);
        assert!((cost.cost(&RigidTransform::identity()) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_of_translation() {
        // Cost = (tx - 1)^2 + ty^2 for a single point mapped onto a single target
        let curve = vec![Point::new(0.0, 0.0)];
        let index = SpatialIndex::new(&[Point::new(1.0, 0.0)]).unwrap();
        let cost = CostFunction::new(&curve, &index);

        let grad = cost.gradient(&[1.0, 0.0, 3.0, 2.0], 1e-6);
        assert!(grad[0].abs() < 1e-6);
        assert!(grad[1].abs() < 1e-6);
        assert!((grad[2] - 4.0).abs() < 1e-4);
        assert!((grad[3] - 4.0).abs() < 1e-4);
    }
}
