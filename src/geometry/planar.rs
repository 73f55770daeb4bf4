// src/geometry/planar.rs
//
// 2D primitives in the local simulation plane (metres, radians).
//
// Degeneracies never panic:
//   - zero-length segment      → distance to the single endpoint
//   - polygon with 1 corner    → distance to that corner
//   - polygon with 0 corners   → f64::INFINITY
//   - polygon with < 3 corners → never contains a point

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Div, Mul, Neg, Sub};

const EPS: f64 = 1e-12;

// ============================================================================
// VECTOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3D cross product.
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).norm()
    }

    /// Heading of the vector, atan2(y, x).
    pub fn heading(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Rotate counter-clockwise by `angle` radians.
    pub fn rotate(self, angle: f64) -> Vec2 {
        let (s, c) = angle.sin_cos();
        Vec2::new(c * self.x - s * self.y, s * self.x + c * self.y)
    }

    pub fn midpoint(self, other: Vec2) -> Vec2 {
        (self + other) / 2.0
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

// ============================================================================
// DISTANCES
// ============================================================================

/// Distance from `q` to the segment `p1–p2`.
///
/// The projection parameter of `q` onto the segment's line is clamped to
/// [0, 1], so points past either end measure to the nearer endpoint.
pub fn point_to_segment_distance(p1: Vec2, p2: Vec2, q: Vec2) -> f64 {
    let seg = p2 - p1;
    let len_sq = seg.dot(seg);
    if len_sq < EPS {
        return q.distance(p1);
    }

    let t = (q - p1).dot(seg) / len_sq;
    if t <= 0.0 {
        q.distance(p1)
    } else if t >= 1.0 {
        q.distance(p2)
    } else {
        (q - p1).cross(seg).abs() / len_sq.sqrt()
    }
}

/// Minimum distance from `q` to the polygon outline, wrap-around edge included.
pub fn point_to_polygon_distance(q: Vec2, corners: &[Vec2]) -> f64 {
    match corners.len() {
        0 => f64::INFINITY,
        1 => q.distance(corners[0]),
        n => (0..n)
            .map(|i| point_to_segment_distance(corners[i], corners[(i + 1) % n], q))
            .fold(f64::INFINITY, f64::min),
    }
}

// ============================================================================
// CONTAINMENT
// ============================================================================

/// Even-odd ray casting along +x.
///
/// Points exactly on an edge are not classified consistently: for an
/// axis-aligned box the left and bottom edges count as inside, the right
/// and top edges as outside.
pub fn point_in_polygon(point: Vec2, corners: &[Vec2]) -> bool {
    let n = corners.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (corners[i], corners[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Proper or touching intersection of segments `a1–a2` and `b1–b2`.
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = (a2 - a1).cross(b1 - a1);
    let d2 = (a2 - a1).cross(b2 - a1);
    let d3 = (b2 - b1).cross(a1 - b1);
    let d4 = (b2 - b1).cross(a2 - b1);

    if ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
    {
        return true;
    }

    let on_segment = |p: Vec2, q: Vec2, r: Vec2| {
        r.x >= p.x.min(q.x) - EPS
            && r.x <= p.x.max(q.x) + EPS
            && r.y >= p.y.min(q.y) - EPS
            && r.y <= p.y.max(q.y) + EPS
    };

    (d1.abs() <= EPS && on_segment(a1, a2, b1))
        || (d2.abs() <= EPS && on_segment(a1, a2, b2))
        || (d3.abs() <= EPS && on_segment(b1, b2, a1))
        || (d4.abs() <= EPS && on_segment(b1, b2, a2))
}

/// True if two simple polygons share any area or touch along an edge.
pub fn polygons_overlap(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }

    for i in 0..a.len() {
        let (a1, a2) = (a[i], a[(i + 1) % a.len()]);
        for j in 0..b.len() {
            if segments_intersect(a1, a2, b[j], b[(j + 1) % b.len()]) {
                return true;
            }
        }
    }

    // No edge crossings: either disjoint or one fully inside the other.
    point_in_polygon(a[0], b) || point_in_polygon(b[0], a)
}

/// Corners of an oriented rectangle in the order
/// front-left, front-right, rear-right, rear-left.
pub fn footprint_corners(center: Vec2, yaw: f64, length: f64, width: f64) -> [Vec2; 4] {
    let hl = length / 2.0;
    let hw = width / 2.0;
    [
        Vec2::new(hl, hw),
        Vec2::new(hl, -hw),
        Vec2::new(-hl, -hw),
        Vec2::new(-hl, hw),
    ]
    .map(|local| center + local.rotate(yaw))
}

// ============================================================================
// ANGLES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleUnit {
    Radians,
    Degrees,
}

/// Unsigned angle between two vectors, in [0, π] (or [0, 180]).
pub fn angle_between(v1: Vec2, v2: Vec2, unit: AngleUnit) -> f64 {
    let mut delta = (v2.heading() - v1.heading()).abs();
    if delta > PI {
        delta = 2.0 * PI - delta;
    }
    match unit {
        AngleUnit::Radians => delta,
        AngleUnit::Degrees => delta.to_degrees(),
    }
}

/// Wrap an angle into (-π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Signed heading difference `to - from`, wrapped into (-π, π].
pub fn yaw_diff(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}
