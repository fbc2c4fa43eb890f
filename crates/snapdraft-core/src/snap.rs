//! Snap engine: finds the best snap target among existing segments.
//!
//! Candidates are searched as a priority cascade rather than pure nearest
//! neighbour: endpoints, then segment intersections, then midpoints, then
//! interior projections onto a segment. A lower tier is only consulted when
//! every higher tier came up empty.

use crate::geometry::Segment;
use crate::kernel::{intersect_segments, project_point_on_segment};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Default snap radius in screen pixels.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 5.0;

/// Smallest accepted snap radius in screen pixels.
pub const MIN_SNAP_THRESHOLD: f64 = 1.0;

/// Smallest accepted zoom scale for radius computation.
pub const MIN_ZOOM_SCALE: f64 = 0.1;

/// Radius multiplier applied to the on-segment tier.
pub const ON_SEGMENT_RADIUS_MULTIPLIER: f64 = 5.0;

/// Kind of snap target that was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SnapKind {
    /// Nothing in range; the query point is used as-is.
    #[default]
    None,
    /// A segment endpoint.
    Endpoint,
    /// The midpoint of a segment.
    Midpoint,
    /// The crossing of two segments.
    Intersection,
    /// A projection strictly inside a segment's span.
    OnSegment,
}

impl SnapKind {
    /// Short label for status output.
    pub fn label(self) -> &'static str {
        match self {
            SnapKind::None => "none",
            SnapKind::Endpoint => "endpoint",
            SnapKind::Midpoint => "midpoint",
            SnapKind::Intersection => "intersection",
            SnapKind::OnSegment => "on-segment",
        }
    }
}

/// Result of a snap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate {
    pub kind: SnapKind,
    /// Snapped location, or the query point when `kind` is `None`.
    pub location: Point,
}

impl SnapCandidate {
    /// A candidate that leaves the point unchanged.
    pub fn none(point: Point) -> Self {
        Self {
            kind: SnapKind::None,
            location: point,
        }
    }

    pub fn is_active(&self) -> bool {
        self.kind != SnapKind::None
    }
}

impl Default for SnapCandidate {
    fn default() -> Self {
        Self::none(Point::ZERO)
    }
}

/// Closest point within `radius` of `query`, earliest wins on exact ties.
fn closest_within(query: Point, radius: f64, candidates: impl Iterator<Item = Point>) -> Option<Point> {
    let mut best: Option<Point> = None;
    let mut best_dist_sq = radius * radius;

    for candidate in candidates {
        let dist_sq = (candidate - query).hypot2();
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = Some(candidate);
        }
    }

    best
}

/// Snap engine holding a read-only snapshot of the drawing's segments.
#[derive(Debug, Clone)]
pub struct SnapEngine {
    segments: Vec<Segment>,
    threshold: f64,
    zoom: f64,
    on_segment_multiplier: f64,
    current: SnapCandidate,
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapEngine {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            threshold: DEFAULT_SNAP_THRESHOLD,
            zoom: 1.0,
            on_segment_multiplier: ON_SEGMENT_RADIUS_MULTIPLIER,
            current: SnapCandidate::default(),
        }
    }

    /// Replace the segment snapshot and thresholds.
    ///
    /// Threshold and zoom are clamped to their minimums here. The active
    /// snap is reset to `None`.
    pub fn configure(&mut self, threshold_pixels: f64, zoom_scale: f64, segments: &[Segment]) {
        self.threshold = clamp_min(threshold_pixels, MIN_SNAP_THRESHOLD);
        self.zoom = clamp_min(zoom_scale, MIN_ZOOM_SCALE);
        self.segments.clear();
        self.segments.extend_from_slice(segments);
        self.current = SnapCandidate::none(self.current.location);
    }

    /// Set the on-segment radius multiplier (values below 1 are raised to 1).
    pub fn set_on_segment_multiplier(&mut self, multiplier: f64) {
        self.on_segment_multiplier = clamp_min(multiplier, 1.0);
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// World-space capture radius: pixel threshold divided by zoom.
    pub fn effective_radius(&self) -> f64 {
        self.threshold / self.zoom
    }

    /// Wider radius used by the on-segment tier.
    pub fn on_segment_radius(&self) -> f64 {
        self.effective_radius() * self.on_segment_multiplier
    }

    /// The candidate found by the most recent query.
    pub fn current(&self) -> SnapCandidate {
        self.current
    }

    /// Forget the active snap without touching the snapshot.
    pub fn reset(&mut self) {
        self.current = SnapCandidate::none(self.current.location);
    }

    /// Find the best snap target for `point` and record it as current.
    pub fn query(&mut self, point: Point) -> SnapCandidate {
        let candidate = self.search(point);
        self.current = candidate;
        candidate
    }

    fn search(&self, point: Point) -> SnapCandidate {
        let radius = self.effective_radius();

        let endpoints = self.segments.iter().flat_map(|s| [s.start, s.end]);
        if let Some(location) = closest_within(point, radius, endpoints) {
            return SnapCandidate {
                kind: SnapKind::Endpoint,
                location,
            };
        }

        if let Some(location) = closest_within(point, radius, self.intersections()) {
            return SnapCandidate {
                kind: SnapKind::Intersection,
                location,
            };
        }

        let midpoints = self.segments.iter().map(Segment::midpoint);
        if let Some(location) = closest_within(point, radius, midpoints) {
            return SnapCandidate {
                kind: SnapKind::Midpoint,
                location,
            };
        }

        let projections = self.segments.iter().filter_map(|s| {
            project_point_on_segment(point, s.start, s.end)
                .filter(|proj| proj.is_interior())
                .map(|proj| proj.point)
        });
        if let Some(location) = closest_within(point, self.on_segment_radius(), projections) {
            return SnapCandidate {
                kind: SnapKind::OnSegment,
                location,
            };
        }

        SnapCandidate::none(point)
    }

    /// Pairwise crossings of the snapshot, in (i, j) order with i < j.
    fn intersections(&self) -> impl Iterator<Item = Point> + '_ {
        self.segments.iter().enumerate().flat_map(move |(i, a)| {
            self.segments[i + 1..]
                .iter()
                .filter_map(move |b| intersect_segments(a.start, a.end, b.start, b.end))
        })
    }
}

fn clamp_min(value: f64, min: f64) -> f64 {
    if value.is_finite() { value.max(min) } else { min }
}
