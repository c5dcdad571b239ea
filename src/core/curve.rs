use geo::Point;
use std::f64::consts::PI;

/// Number of samples the service uses when the request does not override it
pub const DEFAULT_CURVE_POINTS: usize = 200;

/// Evaluate the heart curve at parameter `t`
///
/// x(t) = 16 sin³ t
/// y(t) = 13 cos t − 5 cos 2t − 2 cos 3t − cos 4t
#[inline]
pub fn heart_point(t: f64) -> Point<f64> {
    let x = 16.0 * t.sin().powi(3);
    let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    Point::new(x, y)
}

/// Sample the heart curve at `num_points` evenly spaced parameters over [0, 2π]
///
/// Both ends of the interval are included, so for two or more samples the
/// first and last points coincide and the outline is closed.
///
/// # Arguments
/// * `num_points` - Number of samples to produce
///
/// # Returns
/// The sampled outline, in parameter order
pub fn generate_heart(num_points: usize) -> Vec<Point<f64>> {
    match num_points {
        0 => Vec::new(),
        1 => vec![heart_point(0.0)],
        n => {
            let step = 2.0 * PI / (n - 1) as f64;
            (0..n).map(|i| heart_point(step * i as f64)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_count() {
        for n in [0, 1, 2, 3, 17, 200] {
            assert_eq!(generate_heart(n).len(), n);
        }
    }

    #[test]
    fn test_curve_is_closed() {
        let curve = generate_heart(200);
        let first = curve[0];
        let last = curve[199];
        assert!((first.x() - last.x()).abs() < 1e-9);
        assert!((first.y() - last.y()).abs() < 1e-9);
    }

    #[test]
    fn test_known_samples() {
        // t = 0 is the notch at the top, t = π the tip at the bottom
        let top = heart_point(0.0);
        assert!(top.x().abs() < 1e-12);
        assert!((top.y() - 5.0).abs() < 1e-12);

        let tip = heart_point(PI);
        assert!(tip.x().abs() < 1e-9);
        assert!((tip.y() + 17.0).abs() < 1e-9);

        let side = heart_point(PI / 2.0);
        assert!((side.x() - 16.0).abs() < 1e-9);
        assert!((side.y() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_mirror_symmetry() {
        let n = 200;
        let curve = generate_heart(n);
        for i in 0..n {
            let a = curve[i];
            let b = curve[n - 1 - i];
            assert!((a.x() + b.x()).abs() < 1e-9, "x not mirrored at {}", i);
            assert!((a.y() - b.y()).abs() < 1e-9, "y not mirrored at {}", i);
        }
    }
}
