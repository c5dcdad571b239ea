use geo::Point;
use serde::{Deserialize, Serialize};

/// Uniform scale, rotation (radians) and translation of a 2D point set
///
/// A point `p` maps to `scale * R(rotation) * p + (tx, ty)`: rotate about the
/// origin, scale, then translate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub scale: f64,
    pub rotation: f64,
    pub tx: f64,
    pub ty: f64,
}

impl RigidTransform {
    pub fn new(scale: f64, rotation: f64, tx: f64, ty: f64) -> Self {
        Self { scale, rotation, tx, ty }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Parameter vector in optimizer order: scale, rotation, tx, ty
    pub fn to_array(self) -> [f64; 4] {
        [self.scale, self.rotation, self.tx, self.ty]
    }

    pub fn from_array(params: [f64; 4]) -> Self {
        Self::new(params[0], params[1], params[2], params[3])
    }

    #[inline]
    pub fn apply_point(&self, point: Point<f64>) -> Point<f64> {
        let (sin, cos) = self.rotation.sin_cos();
        self.apply_with(point, sin, cos)
    }

    #[inline]
    fn apply_with(&self, point: Point<f64>, sin: f64, cos: f64) -> Point<f64> {
        let (x, y) = point.x_y();
        Point::new(
            self.scale * (x * cos - y * sin) + self.tx,
            self.scale * (x * sin + y * cos) + self.ty,
        )
    }

    /// Transform every point, preserving order and count
    pub fn apply(&self, points: &[Point<f64>]) -> Vec<Point<f64>> {
        let (sin, cos) = self.rotation.sin_cos();
        points
            .iter()
            .map(|p| self.apply_with(*p, sin, cos))
            .collect()
    }

    /// The single transform equal to applying `self` first and `next` second
    pub fn then(&self, next: &RigidTransform) -> RigidTransform {
        let moved = next.apply_point(Point::new(self.tx, self.ty));
        RigidTransform {
            scale: self.scale * next.scale,
            rotation: self.rotation + next.rotation,
            tx: moved.x(),
            ty: moved.y(),
        }
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 4]> for RigidTransform {
    fn from(params: [f64; 4]) -> Self {
        Self::from_array(params)
    }
}
