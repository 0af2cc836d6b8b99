// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plain 2D value types shared by placement, curves and interaction.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A point (or vector) in graph space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// The origin
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    /// Length when treated as a vector
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalized(self) -> Point {
        let len = self.length();
        if len > f32::EPSILON {
            Point::new(self.x / len, self.y / len)
        } else {
            Point::ZERO
        }
    }

    /// Both coordinates are finite
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// Width and height of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl Size {
    /// A zero-sized box
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Create a new size
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Center of a box of this size anchored at the origin
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Finite and non-negative in both dimensions
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }
}

#[cfg(feature = "egui")]
mod egui_interop {
    use super::{Point, Size};

    impl From<Point> for egui::Pos2 {
        fn from(p: Point) -> Self {
            egui::Pos2::new(p.x, p.y)
        }
    }

    impl From<egui::Pos2> for Point {
        fn from(p: egui::Pos2) -> Self {
            Point::new(p.x, p.y)
        }
    }

    impl From<Size> for egui::Vec2 {
        fn from(s: Size) -> Self {
            egui::Vec2::new(s.width, s.height)
        }
    }

    impl From<egui::Vec2> for Size {
        fn from(v: egui::Vec2) -> Self {
            Size::new(v.x, v.y)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(4.0, 6.0);
        assert_eq!(a + b, Point::new(5.0, 8.0));
        assert_eq!(b - a, Point::new(3.0, 4.0));
        assert_eq!(a * 2.0, Point::new(2.0, 4.0));
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn test_normalized_zero_vector() {
        assert_eq!(Point::ZERO.normalized(), Point::ZERO);
        let n = Point::new(3.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_size_validity() {
        assert!(Size::new(10.0, 20.0).is_valid());
        assert!(!Size::new(f32::NAN, 20.0).is_valid());
        assert!(!Size::new(-1.0, 20.0).is_valid());
        assert_eq!(Size::new(10.0, 20.0).center(), Point::new(5.0, 10.0));
    }
}
