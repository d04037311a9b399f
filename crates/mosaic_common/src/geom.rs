//! Axis-aligned rectangle geometry.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in floorplan coordinates.
///
/// Stored as lower-left `(lx, ly)` and upper-right `(ux, uy)` corners.
/// Degenerate rectangles (zero width or height) are permitted; negative
/// extents are not constructed by the floorplanner.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Rect {
    /// Lower-left x coordinate.
    pub lx: f64,
    /// Lower-left y coordinate.
    pub ly: f64,
    /// Upper-right x coordinate.
    pub ux: f64,
    /// Upper-right y coordinate.
    pub uy: f64,
}

impl Rect {
    /// Creates a rectangle from its lower-left and upper-right corners.
    pub fn new(lx: f64, ly: f64, ux: f64, uy: f64) -> Self {
        Self { lx, ly, ux, uy }
    }

    /// Creates a rectangle from a lower-left corner and a size.
    pub fn from_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            lx: x,
            ly: y,
            ux: x + width,
            uy: y + height,
        }
    }

    /// Returns the width of the rectangle.
    pub fn width(&self) -> f64 {
        self.ux - self.lx
    }

    /// Returns the height of the rectangle.
    pub fn height(&self) -> f64 {
        self.uy - self.ly
    }

    /// Returns the area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns the center point of the rectangle.
    pub fn center(&self) -> (f64, f64) {
        ((self.lx + self.ux) / 2.0, (self.ly + self.uy) / 2.0)
    }

    /// Returns the intersection area with another rectangle.
    ///
    /// Rectangles that merely touch along an edge have zero overlap.
    pub fn overlap(&self, other: &Rect) -> f64 {
        let dx = self.ux.min(other.ux) - self.lx.max(other.lx);
        let dy = self.uy.min(other.uy) - self.ly.max(other.ly);
        if dx > 0.0 && dy > 0.0 {
            dx * dy
        } else {
            0.0
        }
    }

    /// Returns whether this rectangle fully contains another.
    pub fn contains(&self, other: &Rect) -> bool {
        self.lx <= other.lx && self.ly <= other.ly && self.ux >= other.ux && self.uy >= other.uy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accessors() {
        let r = Rect::from_size(1.0, 2.0, 10.0, 4.0);
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 4.0);
        assert_eq!(r.area(), 40.0);
        assert_eq!(r.center(), (6.0, 4.0));
    }

    #[test]
    fn overlap_disjoint() {
        let a = Rect::new(0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(6.0, 6.0, 10.0, 10.0);
        assert_eq!(a.overlap(&b), 0.0);
    }

    #[test]
    fn overlap_touching_edge_is_zero() {
        let a = Rect::new(0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(5.0, 0.0, 10.0, 5.0);
        assert_eq!(a.overlap(&b), 0.0);
    }

    #[test]
    fn overlap_partial() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, 2.0, 6.0, 6.0);
        assert_eq!(a.overlap(&b), 4.0);
        assert_eq!(b.overlap(&a), 4.0);
    }

    #[test]
    fn overlap_contained() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        let inner = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(outer.overlap(&inner), inner.area());
    }

    #[test]
    fn contains_self_and_inner() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        let inner = Rect::new(0.0, 0.0, 10.0, 5.0);
        assert!(outer.contains(&outer));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn serde_roundtrip() {
        let r = Rect::new(1.5, 2.5, 3.5, 4.5);
        let json = serde_json::to_string(&r).unwrap();
        let restored: Rect = serde_json::from_str(&json).unwrap();
        assert_eq!(r, restored);
    }
}
