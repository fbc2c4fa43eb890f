//! Linear dimensions.

use crate::geometry::{midpoint, normalized, perpendicular};
use kurbo::{Line, Point};
use serde::{Deserialize, Serialize};

/// Arrowhead size in screen pixels.
pub const ARROW_SIZE: f64 = 5.0;

/// A linear dimension between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub start: Point,
    pub end: Point,
    /// Distance of the dimension line from the measured points, along the
    /// left-hand normal of `start → end`.
    pub offset: f64,
    pub measurement: f64,
    /// Measurement formatted with two decimals.
    pub text: String,
}

/// Renderer-ready pieces of a dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionGeometry {
    pub extension_lines: [Line; 2],
    pub dimension_line: Line,
    /// Closed triangles `[tip, wing, wing]` at each end of the dimension line.
    pub arrows: [[Point; 3]; 2],
    /// Centre of the dimension line.
    pub text_anchor: Point,
}

impl Dimension {
    pub fn new(start: Point, end: Point, offset: f64) -> Self {
        let measurement = start.distance(end);
        Self {
            start,
            end,
            offset,
            measurement,
            text: format!("{:.2}", measurement),
        }
    }

    /// Geometry at the given zoom, or `None` for a zero-length dimension.
    pub fn geometry(&self, zoom: f64) -> Option<DimensionGeometry> {
        let dir = normalized(self.end - self.start)?;
        let perp = perpendicular(dir);
        let shift = perp * self.offset;

        let line_start = self.start + shift;
        let line_end = self.end + shift;

        let size = ARROW_SIZE / zoom.max(f64::EPSILON);
        let wing = perp * size;
        let back = dir * size;

        Some(DimensionGeometry {
            extension_lines: [Line::new(self.start, line_start), Line::new(self.end, line_end)],
            dimension_line: Line::new(line_start, line_end),
            arrows: [
                [line_start, line_start + back + wing, line_start + back - wing],
                [line_end, line_end - back + wing, line_end - back - wing],
            ],
            text_anchor: midpoint(line_start, line_end),
        })
    }
}
