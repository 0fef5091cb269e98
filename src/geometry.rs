//! Planar geometry over integer-scaled ink coordinates.
//!
//! Point clusters are plain slices of [`Point`]; a symbol group's cluster is
//! the concatenation of its member strokes' points.

use serde::{Deserialize, Serialize};

/// A pen sample in integer-scaled coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance, computed in floating point so large
    /// scaled coordinates cannot overflow.
    pub fn distance_squared(self, other: Point) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Nearest-point (single-linkage) distance between two clusters.
///
/// Returns `None` if either cluster is empty.
pub fn nearest_distance(a: &[Point], b: &[Point]) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let mut best = f64::INFINITY;
    for &p in a {
        for &q in b {
            let d = p.distance_squared(q);
            if d < best {
                best = d;
                if best == 0.0 {
                    return Some(0.0);
                }
            }
        }
    }
    Some(best.sqrt())
}

/// Smallest x-coordinate in a cluster, or `None` for an empty cluster.
pub fn min_x<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<i64> {
    points.into_iter().map(|p| p.x).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn nearest_distance_uses_closest_pair_not_centroids() {
        // Long horizontal bar and a dot just above its right end.
        let bar: Vec<Point> = (0..=100).map(|x| Point::new(x, 0)).collect();
        let dot = vec![Point::new(100, 2)];
        assert_eq!(nearest_distance(&bar, &dot), Some(2.0));
    }

    #[test]
    fn nearest_distance_zero_for_touching_clusters() {
        let a = vec![Point::new(1, 1), Point::new(5, 5)];
        let b = vec![Point::new(5, 5), Point::new(9, 9)];
        assert_eq!(nearest_distance(&a, &b), Some(0.0));
    }

    #[test]
    fn nearest_distance_empty_cluster() {
        let a = vec![Point::new(1, 1)];
        assert_eq!(nearest_distance(&a, &[]), None);
        assert_eq!(nearest_distance(&[], &a), None);
    }

    #[test]
    fn min_x_over_cluster() {
        let pts = [Point::new(7, 0), Point::new(-3, 9), Point::new(2, 2)];
        assert_eq!(min_x(&pts), Some(-3));
        assert_eq!(min_x(&[] as &[Point]), None);
    }

    #[test]
    fn large_coordinates_do_not_overflow() {
        let a = Point::new(4_000_000_000, 0);
        let b = Point::new(-4_000_000_000, 0);
        assert_eq!(a.distance(b), 8_000_000_000.0);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let a = Point::new(9_000_000_000_000_000_000, 0);
        let b = Point::new(-9_000_000_000_000_000_000, i64::MAX);
        assert_eq!(a.distance(Point::new(-9_000_000_000_000_000_000, 0)), 1.8e19);
        assert!(a.distance(b).is_finite());
        let far = Point::new(i64::MIN, 0);
        assert_eq!(nearest_distance(&[a], &[far]), Some(a.distance(far)));
    }
}
