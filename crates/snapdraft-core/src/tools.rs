//! Tool system: drawing modes and their in-progress state.

use crate::geometry::{SegmentId, normalized};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    None,
    Line,
    Dimension,
    Move,
    Delete,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::None => "None",
            ToolKind::Line => "Line",
            ToolKind::Dimension => "Dimension",
            ToolKind::Move => "Move",
            ToolKind::Delete => "Delete",
        }
    }

    /// Parse a tool name, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "ready" => Some(ToolKind::None),
            "line" => Some(ToolKind::Line),
            "dimension" | "dim" => Some(ToolKind::Dimension),
            "move" => Some(ToolKind::Move),
            "delete" | "erase" => Some(ToolKind::Delete),
            _ => None,
        }
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolState {
    /// Waiting for the first click.
    #[default]
    Idle,
    /// Line or dimension with its first point fixed (world space).
    Placing { start: Point, current: Point },
    /// Move: segments picked, waiting for the base point.
    AwaitingBase { selection: Vec<SegmentId> },
    /// Move: base point fixed, waiting for the destination.
    AwaitingDestination {
        selection: Vec<SegmentId>,
        base: Point,
        current: Point,
    },
    /// Delete: dragging a selection rectangle (screen space).
    Selecting { start: Point, current: Point },
}

/// Typed length for the line being drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LengthEntry {
    input: String,
    target: Option<f64>,
}

impl LengthEntry {
    /// Text typed so far.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The active length constraint, if any.
    pub fn target(&self) -> Option<f64> {
        self.target
    }

    /// Append a digit or `.`. Other characters are rejected.
    pub fn push(&mut self, c: char) -> bool {
        if !(c.is_ascii_digit() || c == '.') {
            return false;
        }
        self.input.push(c);
        self.reparse();
        true
    }

    pub fn backspace(&mut self) {
        if self.input.pop().is_some() {
            self.reparse();
        }
    }

    /// Confirm the typed text. Returns the positive length to commit with.
    pub fn confirm(&mut self) -> Option<f64> {
        if self.input.is_empty() {
            return None;
        }
        self.reparse();
        self.input.clear();
        self.target
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.target = None;
    }

    fn reparse(&mut self) {
        self.target = self
            .input
            .parse::<f64>()
            .ok()
            .filter(|len| *len > 0.0 && len.is_finite());
    }
}

/// Constrain `end` to the horizontal or vertical through `start`, whichever
/// is closer to the drag direction.
pub fn constrain_ortho(start: Point, end: Point) -> Point {
    let delta = end - start;
    if delta.x.abs() > delta.y.abs() {
        Point::new(end.x, start.y)
    } else {
        Point::new(start.x, end.y)
    }
}

/// Point at `length` from `start` towards `toward`; unchanged when the
/// direction is undefined.
pub fn apply_length(start: Point, toward: Point, length: f64) -> Point {
    match normalized(toward - start) {
        Some(dir) => start + dir * length,
        None => toward,
    }
}

/// Manages the current tool and its state.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current state of the tool.
    pub state: ToolState,
    /// Ortho mode constrains new lines to horizontal/vertical.
    pub ortho: bool,
    length: LengthEntry,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch tools, discarding any in-progress interaction.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
        self.reset_state();
    }

    /// Abandon the in-progress interaction, keeping the tool.
    pub fn reset_state(&mut self) {
        self.state = ToolState::Idle;
        self.length.clear();
    }

    pub fn is_active(&self) -> bool {
        self.state != ToolState::Idle
    }

    pub fn toggle_ortho(&mut self) -> bool {
        self.ortho = !self.ortho;
        self.ortho
    }

    pub fn length(&self) -> &LengthEntry {
        &self.length
    }

    pub fn length_mut(&mut self) -> &mut LengthEntry {
        &mut self.length
    }

    /// Line end for `cursor` given the ortho and length constraints.
    pub fn constrained_end(&self, start: Point, cursor: Point) -> Point {
        let end = if self.ortho {
            constrain_ortho(start, cursor)
        } else {
            cursor
        };
        match self.length.target() {
            Some(len) => apply_length(start, end, len),
            None => end,
        }
    }

    /// Offset of the move preview from the base point.
    pub fn ghost_offset(&self) -> Option<Vec2> {
        match &self.state {
            ToolState::AwaitingDestination { base, current, .. } => Some(*current - *base),
            _ => None,
        }
    }
}
