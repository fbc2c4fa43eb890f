//! Intersection and projection kernel.
//!
//! Pure functions over points and directions. Degenerate inputs (parallel
//! lines, zero-length segments) are reported through return values, never
//! through errors or panics.

use crate::geometry::midpoint;
use kurbo::{Point, Vec2};

/// Determinant magnitude below which two rays count as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-4;

/// Determinant magnitude below which two segments count as parallel.
pub const SEGMENT_PARALLEL_EPSILON: f64 = 1e-6;

/// Squared segment length below which projection is skipped.
pub const MIN_PROJECTION_LENGTH_SQ: f64 = 1e-6;

/// Result of intersecting two infinite lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayIntersection {
    /// The lines cross at this point.
    Point(Point),
    /// The directions are parallel within [`PARALLEL_EPSILON`].
    Parallel,
}

impl RayIntersection {
    pub fn point(self) -> Option<Point> {
        match self {
            RayIntersection::Point(p) => Some(p),
            RayIntersection::Parallel => None,
        }
    }
}

/// Intersect two infinite lines given as point + direction.
pub fn intersect_rays(p1: Point, d1: Vec2, p2: Point, d2: Vec2) -> RayIntersection {
    let denom = d1.cross(d2);
    if denom.abs() < PARALLEL_EPSILON {
        return RayIntersection::Parallel;
    }
    let t = (p2 - p1).cross(d2) / denom;
    RayIntersection::Point(p1 + d1 * t)
}

/// Intersect two lines, falling back to the midpoint of the two origins when
/// they are parallel.
///
/// The fallback is not geometrically meaningful. It exists so interactive
/// construction always yields a point, and callers rely on it as-is.
pub fn intersect_rays_or_midpoint(p1: Point, d1: Vec2, p2: Point, d2: Vec2) -> Point {
    match intersect_rays(p1, d1, p2, d2) {
        RayIntersection::Point(p) => p,
        RayIntersection::Parallel => midpoint(p1, p2),
    }
}

/// Intersect two finite segments `a0→a1` and `b0→b1`.
///
/// Returns a hit only when both segment parameters lie in `[0, 1]`.
pub fn intersect_segments(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<Point> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.cross(s);
    if denom.abs() < SEGMENT_PARALLEL_EPSILON {
        return None;
    }

    let w = b0 - a0;
    let t = w.cross(s) / denom;
    let u = w.cross(r) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a0 + r * t)
    } else {
        None
    }
}

/// Turn direction of the triple `a → b → c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Colinear,
    Clockwise,
    CounterClockwise,
}

/// Orientation from the sign of the cross product of `(b - a)` and `(c - b)`.
///
/// Colinearity is an exact zero comparison. Near-parallel inputs can flip
/// between results under floating point noise.
pub fn orientation(a: Point, b: Point, c: Point) -> Orientation {
    let val = (b.y - a.y) * (c.x - b.x) - (b.x - a.x) * (c.y - b.y);
    if val == 0.0 {
        Orientation::Colinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Orientation-based crossing test for segments `p1→p2` and `q1→q2`.
///
/// True only for a general-position crossing; colinear overlaps are not
/// detected.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);
    o1 != o2 && o3 != o4
}

/// Projection of a point onto the line through a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// The projected point on the infinite line.
    pub point: Point,
    /// Line parameter; `0` at the start, `1` at the end.
    pub t: f64,
}

impl Projection {
    /// Whether the projection falls strictly between the endpoints.
    pub fn is_interior(&self) -> bool {
        self.t > 0.0 && self.t < 1.0
    }
}

/// Project a point onto the line through `start → end`.
///
/// Returns `None` for segments shorter than [`MIN_PROJECTION_LENGTH_SQ`].
pub fn project_point_on_segment(point: Point, start: Point, end: Point) -> Option<Projection> {
    let ab = end - start;
    let len_sq = ab.hypot2();
    if len_sq <= MIN_PROJECTION_LENGTH_SQ {
        return None;
    }
    let t = (point - start).dot(ab) / len_sq;
    Some(Projection {
        point: start + ab * t,
        t,
    })
}

/// Nearest point on the segment, with the parameter clamped to `[0, 1]`.
///
/// Used for hit-testing; a zero-length segment yields its start point.
pub fn nearest_point_on_segment_clamped(point: Point, start: Point, end: Point) -> Point {
    let ab = end - start;
    let len_sq = ab.hypot2();
    if len_sq < f64::EPSILON {
        return start;
    }
    let t = ((point - start).dot(ab) / len_sq).clamp(0.0, 1.0);
    start + ab * t
}

/// Distance from a point to a segment.
pub fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
    point.distance(nearest_point_on_segment_clamped(point, start, end))
}
