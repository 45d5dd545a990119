//! # Bounding Box Module
//!
//! Inclusive, axis-aligned integer boxes. Used as placement clip regions, as
//! the footprint a template covers once placed, and as the query volume for
//! entity scans.

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// An axis-aligned box of cells with inclusive bounds on both ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Lowest corner, inclusive
    pub min: [i32; 3],
    /// Highest corner, inclusive
    pub max: [i32; 3],
}

impl BoundingBox {
    /// Creates the box spanning two corners given in any order.
    pub fn from_corners(a: Point3<i32>, b: Point3<i32>) -> Self {
        BoundingBox {
            min: [a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)],
            max: [a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)],
        }
    }

    /// Creates the box starting at `origin` and extending `size` cells along
    /// each axis. Returns `None` if any size component is below one.
    pub fn from_origin_and_size(origin: Point3<i32>, size: Vector3<i32>) -> Option<Self> {
        if size.x < 1 || size.y < 1 || size.z < 1 {
            return None;
        }
        Some(Self::from_corners(
            origin,
            origin + size - Vector3::new(1, 1, 1),
        ))
    }

    /// Lowest corner.
    pub fn min_corner(&self) -> Point3<i32> {
        Point3::new(self.min[0], self.min[1], self.min[2])
    }

    /// Highest corner.
    pub fn max_corner(&self) -> Point3<i32> {
        Point3::new(self.max[0], self.max[1], self.max[2])
    }

    /// Number of cells along each axis.
    pub fn dimensions(&self) -> Vector3<i32> {
        self.max_corner() - self.min_corner() + Vector3::new(1, 1, 1)
    }

    /// Returns `true` if `pos` lies inside the box.
    pub fn contains(&self, pos: Point3<i32>) -> bool {
        (self.min[0]..=self.max[0]).contains(&pos.x)
            && (self.min[1]..=self.max[1]).contains(&pos.y)
            && (self.min[2]..=self.max[2]).contains(&pos.z)
    }

    /// Returns `true` if the continuous point lies inside the volume covered
    /// by the box's cells.
    pub fn contains_point(&self, point: Point3<f64>) -> bool {
        point.x >= self.min[0] as f64
            && point.x < (self.max[0] + 1) as f64
            && point.y >= self.min[1] as f64
            && point.y < (self.max[1] + 1) as f64
            && point.z >= self.min[2] as f64
            && point.z < (self.max[2] + 1) as f64
    }

    /// Grows the box so it also covers `pos`.
    pub fn encapsulate(&mut self, pos: Point3<i32>) {
        self.min = [self.min[0].min(pos.x), self.min[1].min(pos.y), self.min[2].min(pos.z)];
        self.max = [self.max[0].max(pos.x), self.max[1].max(pos.y), self.max[2].max(pos.z)];
    }

    /// Returns the box moved by `offset`.
    pub fn translated(&self, offset: Vector3<i32>) -> Self {
        Self::from_corners(self.min_corner() + offset, self.max_corner() + offset)
    }

    /// Iterates every cell of the box in `(y, z, x)` nesting order.
    pub fn cells(&self) -> impl Iterator<Item = Point3<i32>> {
        let (min, max) = (self.min, self.max);
        (min[1]..=max[1]).flat_map(move |y| {
            (min[2]..=max[2])
                .flat_map(move |z| (min[0]..=max[0]).map(move |x| Point3::new(x, y, z)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_origin_and_size() {
        let bb = BoundingBox::from_origin_and_size(Point3::new(1, 2, 3), Vector3::new(2, 1, 4)).unwrap();
        assert_eq!(bb.min, [1, 2, 3]);
        assert_eq!(bb.max, [2, 2, 6]);
        assert_eq!(bb.dimensions(), Vector3::new(2, 1, 4));
        assert_eq!(bb.cells().count(), 8);
        assert!(BoundingBox::from_origin_and_size(Point3::new(0, 0, 0), Vector3::new(0, 1, 1)).is_none());
    }

    #[test]
    fn test_contains_and_encapsulate() {
        let mut bb = BoundingBox::from_corners(Point3::new(0, 0, 0), Point3::new(0, 0, 0));
        assert!(bb.contains(Point3::new(0, 0, 0)));
        assert!(!bb.contains(Point3::new(1, 0, 0)));
        bb.encapsulate(Point3::new(-2, 5, 1));
        assert_eq!(bb.min, [-2, 0, 0]);
        assert_eq!(bb.max, [0, 5, 1]);
        assert!(bb.contains_point(Point3::new(0.9, 5.5, 1.99)));
        assert!(!bb.contains_point(Point3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_translated_keeps_dimensions() {
        let bb = BoundingBox::from_corners(Point3::new(0, 0, 0), Point3::new(2, 1, 3));
        let moved = bb.translated(Vector3::new(-5, 10, 1));
        assert_eq!(moved.min, [-5, 10, 1]);
        assert_eq!(moved.max, [-3, 11, 4]);
        assert_eq!(moved.dimensions(), bb.dimensions());
    }
}
