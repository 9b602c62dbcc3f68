//! 2D geometry primitives shared by the document model and the exporters.

use serde::{Deserialize, Serialize};

/// Represents a 2D point with X and Y coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point with the given X and Y coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rotates a point around a center by an angle in degrees.
pub fn rotate_point(p: Point, center: Point, angle_deg: f64) -> Point {
    if angle_deg.abs() < 1e-6 {
        return p;
    }
    let angle_rad = angle_deg.to_radians();
    let cos_a = angle_rad.cos();
    let sin_a = angle_rad.sin();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point {
        x: center.x + dx * cos_a - dy * sin_a,
        y: center.y + dx * sin_a + dy * cos_a,
    }
}

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// An empty bounds suitable as a fold seed; union with any real bounds
    /// yields that bounds.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(0.0)
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// The smallest bounds containing both rectangles.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Includes a single point.
    pub fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }
}

/// Bounding box of a rectangle rotated around its own center.
pub fn rotated_rect_bounds(x: f64, y: f64, width: f64, height: f64, rotation_deg: f64) -> Bounds {
    let center = Point::new(x + width / 2.0, y + height / 2.0);
    rotated_rect_bounds_about(x, y, width, height, center, rotation_deg)
}

/// Bounding box of a rectangle rotated around an arbitrary pivot.
pub fn rotated_rect_bounds_about(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    pivot: Point,
    rotation_deg: f64,
) -> Bounds {
    if rotation_deg.abs() < 1e-6 {
        return Bounds::new(x, y, x + width, y + height);
    }
    let corners = [
        Point::new(x, y),
        Point::new(x + width, y),
        Point::new(x + width, y + height),
        Point::new(x, y + height),
    ];
    let mut bounds = Bounds::empty();
    for c in corners {
        bounds.include(rotate_point(c, pivot, rotation_deg));
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_point_quarter_turn() {
        let p = rotate_point(Point::new(1.0, 0.0), Point::new(0.0, 0.0), 90.0);
        assert!((p.x - 0.0).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_and_empty() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, -5.0, 20.0, 8.0);
        let u = a.union(&b);
        assert_eq!(u, Bounds::new(0.0, -5.0, 20.0, 10.0));
        assert_eq!(Bounds::empty().union(&a), a);
        assert!(Bounds::empty().is_empty());
    }

    #[test]
    fn test_rotated_rect_bounds_about_foreign_pivot() {
        // A 20x10 rect spun a quarter turn about the origin lands left of
        // the pivot.
        let b = rotated_rect_bounds_about(0.0, 0.0, 20.0, 10.0, Point::new(0.0, 0.0), 90.0);
        assert!((b.min_x + 10.0).abs() < 1e-9);
        assert!(b.max_x.abs() < 1e-9);
        assert!(b.min_y.abs() < 1e-9);
        assert!((b.max_y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_rect_bounds_square() {
        // A 10x10 square rotated 45 degrees spans 10*sqrt(2) on both axes.
        let b = rotated_rect_bounds(0.0, 0.0, 10.0, 10.0, 45.0);
        let span = 10.0 * std::f64::consts::SQRT_2;
        assert!((b.width() - span).abs() < 1e-9);
        assert!((b.height() - span).abs() < 1e-9);
        let c = b.center();
        assert!((c.x - 5.0).abs() < 1e-9);
        assert!((c.y - 5.0).abs() < 1e-9);
    }
}
