// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection curve geometry.
//!
//! Connections are drawn as cubic beziers whose control points leave each
//! anchor perpendicular to the port's node edge. Everything here is pure and
//! deterministic. The parameter `t` is never clamped, so values outside
//! `[0, 1]` extrapolate.

use crate::connection::Connection;
use crate::geometry::Point;
use crate::placement::{PortLayout, Side};
use serde::{Deserialize, Serialize};

/// Default sampling used for arc length
pub const DEFAULT_LENGTH_SEGMENTS: usize = 10;

/// Refinement passes used by [`CubicBezier::nearest`]
const NEAREST_REFINE_STEPS: usize = 24;

/// Shape parameters for connection curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveStyle {
    /// Control offset as a fraction of the endpoint distance
    pub curvature: f32,
    /// Lower bound for the control offset
    pub min_offset: f32,
    /// Default segment count for arc length
    pub length_segments: usize,
}

impl Default for CurveStyle {
    fn default() -> Self {
        Self {
            curvature: 0.5,
            min_offset: 50.0,
            length_segments: DEFAULT_LENGTH_SEGMENTS,
        }
    }
}

impl CurveStyle {
    /// Distance a control point sits from its anchor
    pub fn control_offset(&self, from: Point, to: Point) -> f32 {
        (from.distance(to) * self.curvature).max(self.min_offset)
    }
}

/// The two inner control points of a connection curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoints {
    /// Control point next to the source anchor
    pub cp1: Point,
    /// Control point next to the target anchor
    pub cp2: Point,
}

/// Control points with the default style
pub fn control_points(from: Point, to: Point, from_side: Side, to_side: Side) -> ControlPoints {
    control_points_with(&CurveStyle::default(), from, to, from_side, to_side)
}

/// Control points pushed outward from each anchor along its side's normal
pub fn control_points_with(style: &CurveStyle, from: Point, to: Point, from_side: Side, to_side: Side) -> ControlPoints {
    let offset = style.control_offset(from, to);
    ControlPoints {
        cp1: from + from_side.outward() * offset,
        cp2: to + to_side.outward() * offset,
    }
}

/// Path string with the default style
pub fn path(from: Point, to: Point, from_side: Side, to_side: Side) -> String {
    path_with(&CurveStyle::default(), from, to, from_side, to_side)
}

/// Path string in the form `M x,y C x1,y1 x2,y2 x,y`
pub fn path_with(style: &CurveStyle, from: Point, to: Point, from_side: Side, to_side: Side) -> String {
    CubicBezier::between(style, from, to, from_side, to_side).to_path()
}

/// Bernstein evaluation
pub fn point_at(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// First derivative of the curve (not normalized)
pub fn tangent_at(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let mt = 1.0 - t;
    let a = 3.0 * mt * mt;
    let b = 6.0 * mt * t;
    let c = 3.0 * t * t;
    (p1 - p0) * a + (p2 - p1) * b + (p3 - p2) * c
}

/// Polyline arc length over `segments` equal parameter steps.
///
/// Zero segments is treated as one.
pub fn length_approx(p0: Point, p1: Point, p2: Point, p3: Point, segments: usize) -> f32 {
    let segments = segments.max(1);
    let mut length = 0.0;
    let mut previous = p0;
    for i in 1..=segments {
        let point = point_at(p0, p1, p2, p3, i as f32 / segments as f32);
        length += previous.distance(point);
        previous = point;
    }
    length
}

/// Closest point on a curve to some target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearestPoint {
    /// Curve parameter in `[0, 1]`
    pub t: f32,
    /// Point on the curve
    pub point: Point,
    /// Distance to the target
    pub distance: f32,
}

/// A cubic bezier segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    /// Start anchor
    pub p0: Point,
    /// First control point
    pub p1: Point,
    /// Second control point
    pub p2: Point,
    /// End anchor
    pub p3: Point,
}

impl CubicBezier {
    /// Create a curve from its four points
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Connection curve between two anchors
    pub fn between(style: &CurveStyle, from: Point, to: Point, from_side: Side, to_side: Side) -> Self {
        let ControlPoints { cp1, cp2 } = control_points_with(style, from, to, from_side, to_side);
        Self::new(from, cp1, cp2, to)
    }

    /// Point at parameter `t`
    pub fn point_at(&self, t: f32) -> Point {
        point_at(self.p0, self.p1, self.p2, self.p3, t)
    }

    /// Derivative at parameter `t`
    pub fn tangent_at(&self, t: f32) -> Point {
        tangent_at(self.p0, self.p1, self.p2, self.p3, t)
    }

    /// Approximate arc length
    pub fn length_approx(&self, segments: usize) -> f32 {
        length_approx(self.p0, self.p1, self.p2, self.p3, segments)
    }

    /// `segments + 1` evenly spaced points, both anchors included
    pub fn sample(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f32 / segments as f32))
            .collect()
    }

    /// Point at `t = 0.5`
    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    /// Closest point to `target`: a coarse scan over `samples` steps, then a
    /// local refinement around the best sample
    pub fn nearest(&self, target: Point, samples: usize) -> NearestPoint {
        let samples = samples.max(1);
        let step = 1.0 / samples as f32;
        let mut best_t = 0.0;
        let mut best_distance = f32::INFINITY;
        for i in 0..=samples {
            let t = i as f32 * step;
            let distance = self.point_at(t).distance(target);
            if distance < best_distance {
                best_t = t;
                best_distance = distance;
            }
        }

        let mut lo = (best_t - step).max(0.0);
        let mut hi = (best_t + step).min(1.0);
        for _ in 0..NEAREST_REFINE_STEPS {
            let third = (hi - lo) / 3.0;
            let a = lo + third;
            let b = hi - third;
            if self.point_at(a).distance(target) < self.point_at(b).distance(target) {
                hi = b;
            } else {
                lo = a;
            }
        }
        let refined = (lo + hi) * 0.5;
        let refined_distance = self.point_at(refined).distance(target);
        if refined_distance < best_distance {
            best_t = refined;
            best_distance = refined_distance;
        }

        NearestPoint {
            t: best_t,
            point: self.point_at(best_t),
            distance: best_distance,
        }
    }

    /// Whether `point` lies within `tolerance` of the curve
    pub fn hit_test(&self, point: Point, tolerance: f32) -> bool {
        self.nearest(point, 32).distance <= tolerance
    }

    /// Path string in the form `M x,y C x1,y1 x2,y2 x,y`
    pub fn to_path(&self) -> String {
        format!(
            "M {},{} C {},{} {},{} {},{}",
            self.p0.x, self.p0.y, self.p1.x, self.p1.y, self.p2.x, self.p2.y, self.p3.x, self.p3.y
        )
    }
}

/// Geometry of one stored connection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConnectionCurve {
    /// Exit side of the source port
    pub from_side: Side,
    /// Entry side of the target port
    pub to_side: Side,
    /// The curve itself
    pub bezier: CubicBezier,
}

impl ConnectionCurve {
    /// Build the curve of a connection; `None` when an endpoint is not in the layout
    pub fn for_connection(connection: &Connection, layout: &PortLayout, style: &CurveStyle) -> Option<Self> {
        let from = layout.get(&connection.source())?;
        let to = layout.get(&connection.target())?;
        Some(Self {
            from_side: from.side,
            to_side: to.side,
            bezier: CubicBezier::between(style, from.connection_point, to.connection_point, from.side, to.side),
        })
    }

    /// Path string
    pub fn path(&self) -> String {
        self.bezier.to_path()
    }

    /// Approximate length using the style's default sampling
    pub fn length(&self, style: &CurveStyle) -> f32 {
        self.bezier.length_approx(style.length_segments)
    }
}
