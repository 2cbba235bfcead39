//! Core geometric types for the training core.
//!
//! Defines the 2D vector used for positions, velocities and shot directions,
//! plus the axis-aligned rectangles that bound training ranges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Squared lengths below this are treated as zero before normalizing.
const ZERO_EPS: f64 = 1e-12;

/// A 2D vector in screen space (x grows right, y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Creates a new vector.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The zero vector.
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Vec2) -> f64 {
        (*other - *self).length()
    }

    /// Returns the unit vector in the same direction.
    ///
    /// Returns the zero vector if `self` has (near) zero length.
    pub fn normalized(&self) -> Vec2 {
        let len_sq = self.x * self.x + self.y * self.y;
        if len_sq < ZERO_EPS {
            Vec2::zero()
        } else {
            let len = len_sq.sqrt();
            Vec2::new(self.x / len, self.y / len)
        }
    }

    /// Returns the unit direction vector from `self` toward `target`.
    ///
    /// Returns `(0, 0)` if positions are coincident.
    pub fn direction_to(&self, target: &Vec2) -> Vec2 {
        (*target - *self).normalized()
    }

    /// Returns true if this vector has (near) zero length.
    pub fn is_zero(&self) -> bool {
        self.x * self.x + self.y * self.y < ZERO_EPS
    }

    /// Rotates the vector by `degrees` (clockwise on screen).
    pub fn rotated(&self, degrees: f64) -> Vec2 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Scales both components.
    pub fn scaled(&self, factor: f64) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Window (or play-area) dimensions used for feature normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Normalizes an offset by the window dimensions.
    pub fn normalize(&self, offset: Vec2) -> Vec2 {
        Vec2::new(offset.x / self.width, offset.y / self.height)
    }
}

/// An axis-aligned rectangle `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Returns true if `p` lies inside the rectangle (right/bottom edges excluded).
    pub fn contains(&self, p: &Vec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Returns true if the two rectangles share any interior area.
    ///
    /// Rectangles that only touch along an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Clamps `p` into the rectangle shrunk by `margin` on every side.
    pub fn clamp(&self, p: Vec2, margin: f64) -> Vec2 {
        let min_x = self.left() + margin;
        let max_x = (self.right() - margin).max(min_x);
        let min_y = self.top() + margin;
        let max_y = (self.bottom() - margin).max(min_y);
        Vec2::new(p.x.clamp(min_x, max_x), p.y.clamp(min_y, max_y))
    }

    /// Distance from `p` to the nearest edge (0 when outside).
    pub fn distance_to_edge(&self, p: &Vec2) -> f64 {
        let d = (p.x - self.left())
            .min(self.right() - p.x)
            .min(p.y - self.top())
            .min(self.bottom() - p.y);
        d.max(0.0)
    }

    /// Distance from `p` to the closest point of the rectangle (0 when inside).
    pub fn distance_from_point(&self, p: &Vec2) -> f64 {
        let cx = p.x.clamp(self.left(), self.right());
        let cy = p.y.clamp(self.top(), self.bottom());
        p.distance_to(&Vec2::new(cx, cy))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.0}, {:.0}, {:.0}x{:.0}]",
            self.x, self.y, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn direction_to_coincident_is_zero() {
        let a = Vec2::new(2.0, 2.0);
        let d = a.direction_to(&a);
        assert_eq!(d, Vec2::zero());
        assert!(!d.x.is_nan());
    }

    #[test]
    fn direction_to_unit() {
        let d = Vec2::new(0.0, 0.0).direction_to(&Vec2::new(10.0, 0.0));
        assert!((d.x - 1.0).abs() < 1e-10);
        assert!(d.y.abs() < 1e-10);
    }

    #[test]
    fn rotation_quarter_turn() {
        let v = Vec2::new(1.0, 0.0).rotated(90.0);
        assert!(v.x.abs() < 1e-10);
        assert!((v.y - 1.0).abs() < 1e-10);
    }

    #[test]
    fn rect_clamp_with_margin() {
        let r = Rect::new(100.0, 100.0, 200.0, 200.0);
        let p = r.clamp(Vec2::new(0.0, 500.0), 20.0);
        assert_eq!(p, Vec2::new(120.0, 280.0));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = Rect::new(9.0, 9.0, 5.0, 5.0);
        assert!(a.intersects(&c));
    }

    #[test]
    fn edge_distance() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert!((r.distance_to_edge(&Vec2::new(30.0, 10.0)) - 10.0).abs() < 1e-10);
        assert_eq!(r.distance_to_edge(&Vec2::new(-5.0, 10.0)), 0.0);
    }
}
