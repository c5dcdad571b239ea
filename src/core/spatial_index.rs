use crate::core::error::FitError;
use geo::Point;
use kiddo::{KdTree, SquaredEuclidean};
use std::collections::HashMap;

/// Result of a nearest-neighbour query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Index into the point set the index was built from
    pub index: usize,
    /// Squared Euclidean distance to that point
    pub distance_sq: f64,
}

impl Nearest {
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance_sq.sqrt()
    }
}

/// Static 2-D k-d tree over a point set
///
/// Built once per request and never mutated afterwards. Exactly duplicated
/// coordinates are stored once and resolve to their lowest index, which also
/// keeps kiddo's buckets from filling with identical positions.
pub struct SpatialIndex {
    tree: KdTree<f64, 2>,
    points: Vec<Point<f64>>,
    unique: usize,
}

impl SpatialIndex {
    pub fn new(points: &[Point<f64>]) -> Result<Self, FitError> {
        if points.is_empty() {
            return Err(FitError::EmptyPointSet);
        }

        let mut tree: KdTree<f64, 2> = KdTree::with_capacity(points.len());
        let mut seen: HashMap<(u64, u64), usize> = HashMap::with_capacity(points.len());

        for (index, point) in points.iter().enumerate() {
            let (x, y) = point.x_y();
            if !x.is_finite() || !y.is_finite() {
                return Err(FitError::NonFinitePoint { index });
            }
            // +0.0 and -0.0 are the same position
            let key = ((x + 0.0).to_bits(), (y + 0.0).to_bits());
            if seen.contains_key(&key) {
                continue;
            }
            seen.insert(key, index);
            tree.add(&[x, y], index as u64);
        }

        tracing::debug!(
            "Spatial index built: {} points ({} unique)",
            points.len(),
            seen.len()
        );

        Ok(Self {
            tree,
            points: points.to_vec(),
            unique: seen.len(),
        })
    }

    /// Nearest indexed point to `query`
    #[inline]
    pub fn nearest(&self, query: Point<f64>) -> Nearest {
        let found = self.tree.nearest_one::<SquaredEuclidean>(&[query.x(), query.y()]);
        Nearest {
            index: found.item as usize,
            distance_sq: found.distance,
        }
    }

    /// Nearest indexed point for each query, in query order
    pub fn nearest_all(&self, queries: &[Point<f64>]) -> Vec<Nearest> {
        queries.iter().map(|q| self.nearest(*q)).collect()
    }

    pub fn point(&self, index: usize) -> Option<Point<f64>> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of distinct positions stored in the tree
    pub fn unique_len(&self) -> usize {
        self.unique
    }
}
