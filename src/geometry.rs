//! 2D vector math and bounding boxes
//!
//! Pure value types shared by the model, the layout engine, and the
//! viewport. Model space and screen space both use `Vec2`.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A point or a displacement in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Scale down to `max` length if longer, otherwise unchanged
    pub fn clamp_length(self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max / len)
        } else {
            self
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl BoundingBox {
    /// Create an empty bounding box
    pub fn empty() -> Self {
        Self {
            min: Vec2::new(f32::INFINITY, f32::INFINITY),
            max: Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Expand to include a circle
    pub fn include_circle(&mut self, center: Vec2, radius: f32) {
        self.min.x = self.min.x.min(center.x - radius);
        self.min.y = self.min.y.min(center.y - radius);
        self.max.x = self.max.x.max(center.x + radius);
        self.max.y = self.max.y.max(center.y + radius);
    }

    /// Width, never below 1.0
    pub fn width(&self) -> f32 {
        (self.max.x - self.min.x).max(1.0)
    }

    /// Height, never below 1.0
    pub fn height(&self) -> f32 {
        (self.max.y - self.min.y).max(1.0)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_arithmetic() {
        let a = Vec2::new(3.0, 4.0);
        let b = Vec2::new(1.0, -1.0);
        assert_eq!(a + b, Vec2::new(4.0, 3.0));
        assert_eq!(a - b, Vec2::new(2.0, 5.0));
        assert_eq!(a * 2.0, Vec2::new(6.0, 8.0));
        assert_eq!(-b, Vec2::new(-1.0, 1.0));
        assert_eq!(a.length(), 5.0);
    }

    #[test]
    fn clamp_length_only_shrinks() {
        let v = Vec2::new(30.0, 40.0).clamp_length(10.0);
        assert!((v.length() - 10.0).abs() < 1e-4);
        assert_eq!(Vec2::new(1.0, 0.0).clamp_length(10.0), Vec2::new(1.0, 0.0));
        assert_eq!(Vec2::ZERO.clamp_length(0.0), Vec2::ZERO);
    }

    #[test]
    fn bounding_box_include_circle() {
        let mut bb = BoundingBox::empty();
        assert!(bb.is_empty());
        bb.include_circle(Vec2::new(0.0, 0.0), 10.0);
        bb.include_circle(Vec2::new(50.0, 20.0), 5.0);

        assert!(!bb.is_empty());
        assert_eq!(bb.min, Vec2::new(-10.0, -10.0));
        assert_eq!(bb.max, Vec2::new(55.0, 25.0));
        assert_eq!(bb.width(), 65.0);
        assert_eq!(bb.center(), Vec2::new(22.5, 7.5));
    }

    #[test]
    fn degenerate_box_has_unit_extent() {
        let mut bb = BoundingBox::empty();
        bb.include_circle(Vec2::new(5.0, 5.0), 0.0);
        // Width/height floored to avoid division by zero when fitting
        assert_eq!(bb.width(), 1.0);
        assert_eq!(bb.height(), 1.0);
    }
}
