//! The drawing document: segments and dimensions.

use crate::color::SerializableColor;
use crate::dimension::Dimension;
use crate::geometry::{Segment, SegmentId};
use crate::kernel::{distance_to_segment, segments_intersect};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// How a rectangle selects segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Both endpoints inside the rectangle.
    Window,
    /// Any endpoint inside, or any rectangle edge crossed.
    Crossing,
}

/// Inclusive containment; `Rect::contains` excludes the far edges.
fn rect_contains(rect: Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}

/// An ordered collection of segments plus dimensions.
///
/// Segment order is insertion order. Snap ties are broken by this order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    segments: Vec<Segment>,
    #[serde(default)]
    dimensions: Vec<Dimension>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.dimensions.is_empty()
    }

    /// Append a segment and return its id.
    pub fn add_segment(&mut self, segment: Segment) -> SegmentId {
        let id = segment.id();
        self.segments.push(segment);
        id
    }

    pub fn add_dimension(&mut self, dimension: Dimension) {
        self.dimensions.push(dimension);
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    /// Remove a segment, preserving the order of the rest.
    pub fn remove_segment(&mut self, id: SegmentId) -> Option<Segment> {
        let index = self.segments.iter().position(|s| s.id() == id)?;
        Some(self.segments.remove(index))
    }

    /// Remove every listed segment. Returns how many were removed.
    pub fn remove_segments(&mut self, ids: &[SegmentId]) -> usize {
        let before = self.segments.len();
        self.segments.retain(|s| !ids.contains(&s.id()));
        before - self.segments.len()
    }

    /// Translate the listed segments by `delta`.
    pub fn move_segments(&mut self, ids: &[SegmentId], delta: Vec2) {
        for segment in self.segments.iter_mut().filter(|s| ids.contains(&s.id())) {
            segment.translate(delta);
        }
    }

    /// Recolour the listed segments.
    pub fn set_color(&mut self, ids: &[SegmentId], color: SerializableColor) {
        for segment in self.segments.iter_mut().filter(|s| ids.contains(&s.id())) {
            segment.color = color;
        }
    }

    /// Replace all segments, keeping dimensions.
    pub fn replace_segments(&mut self, segments: Vec<Segment>) {
        self.segments = segments;
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.dimensions.clear();
    }

    /// Bounding box of all segment endpoints.
    pub fn bounds(&self) -> Option<Rect> {
        self.segments
            .iter()
            .map(Segment::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    /// First segment within `tolerance` of `point`.
    pub fn segment_at(&self, point: Point, tolerance: f64) -> Option<SegmentId> {
        self.segments
            .iter()
            .find(|s| distance_to_segment(point, s.start, s.end) <= tolerance)
            .map(Segment::id)
    }

    /// Segments selected by a world-space rectangle, in drawing order.
    pub fn segments_in_rect(&self, rect: Rect, mode: SelectionMode) -> Vec<SegmentId> {
        let rect = rect.abs();
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ];

        self.segments
            .iter()
            .filter(|s| {
                let start_inside = rect_contains(rect, s.start);
                let end_inside = rect_contains(rect, s.end);
                match mode {
                    SelectionMode::Window => start_inside && end_inside,
                    SelectionMode::Crossing => {
                        start_inside
                            || end_inside
                            || (0..4).any(|i| {
                                segments_intersect(s.start, s.end, corners[i], corners[(i + 1) % 4])
                            })
                    }
                }
            })
            .map(Segment::id)
            .collect()
    }

    /// Serialize the drawing to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a drawing from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
