//! Geometry primitives: vector helpers and the line segment value.

use crate::color::SerializableColor;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Squared length below which a direction is considered undefined.
pub const DIRECTION_EPSILON_SQ: f64 = 1e-8;

/// Unique identifier for segments.
pub type SegmentId = Uuid;

/// Normalize a vector, or `None` when it has no discernible direction.
pub fn normalized(v: Vec2) -> Option<Vec2> {
    let len_sq = v.hypot2();
    if len_sq < DIRECTION_EPSILON_SQ || !len_sq.is_finite() {
        return None;
    }
    Some(v / len_sq.sqrt())
}

/// Unit direction from `from` towards `to`, if the points are distinct.
pub fn direction_between(from: Point, to: Point) -> Option<Vec2> {
    normalized(to - from)
}

/// Rotate a vector by +90 degrees.
pub fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Midpoint of two points.
pub fn midpoint(a: Point, b: Point) -> Point {
    a.midpoint(b)
}

/// A straight line segment with a display colour.
///
/// The colour is opaque to the snapping engine and carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub(crate) id: SegmentId,
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    /// Display colour.
    #[serde(default)]
    pub color: SerializableColor,
}

impl Segment {
    /// Create a new segment with the default (white) colour.
    pub fn new(start: Point, end: Point) -> Self {
        Self::with_color(start, end, SerializableColor::default())
    }

    /// Create a new segment with a specific colour.
    pub fn with_color(start: Point, end: Point, color: SerializableColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            color,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Vector from start to end.
    pub fn vector(&self) -> Vec2 {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.vector().hypot()
    }

    pub fn midpoint(&self) -> Point {
        midpoint(self.start, self.end)
    }

    /// Whether both endpoints coincide.
    pub fn is_degenerate(&self) -> bool {
        self.vector().hypot2() < DIRECTION_EPSILON_SQ
    }

    /// Unit direction from start to end, if the segment has a length.
    pub fn direction(&self) -> Option<Vec2> {
        direction_between(self.start, self.end)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    /// Translate both endpoints.
    pub fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }
}
