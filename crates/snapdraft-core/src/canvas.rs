//! Canvas runtime state and event handling.
//!
//! The canvas owns the drawing, the camera, the active tool and the snap
//! resolver. Front ends feed it pointer and key events in screen
//! coordinates and read back preview state and a status line.

use crate::camera::Camera;
use crate::color::SerializableColor;
use crate::dimension::Dimension;
use crate::document::{Drawing, SelectionMode};
use crate::geometry::{Segment, SegmentId, normalized};
use crate::input::{Key, KeyEvent, MouseButton, PointerEvent};
use crate::resolve::{Resolved, SnapResolver};
use crate::settings::Settings;
use crate::storage::dxf;
use crate::tools::{ToolKind, ToolManager, ToolState, apply_length};
use crate::Instant;
use kurbo::{Line, Point, Rect, Size, Vec2};
use std::path::Path;

/// Outcome of a user-visible file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub success: bool,
    /// Short human-readable status.
    pub message: String,
}

impl FileOutcome {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// Canvas runtime state.
#[derive(Debug, Clone)]
pub struct Canvas {
    /// The drawing being edited.
    pub drawing: Drawing,
    /// Camera for view transform.
    pub camera: Camera,
    /// Tool manager.
    pub tools: ToolManager,
    /// Currently selected segment IDs.
    pub selection: Vec<SegmentId>,
    /// Viewport size.
    pub viewport_size: Size,
    settings: Settings,
    resolver: SnapResolver,
    current_color: SerializableColor,
    /// Last resolved cursor position in world space.
    cursor: Point,
    pan_anchor: Option<Point>,
    command: String,
    last_sweep: Option<Instant>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a new canvas with default settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let settings = settings.validated();
        let viewport_size = Size::new(800.0, 600.0);
        let mut camera = Camera::centered(viewport_size);
        camera.min_zoom = settings.min_zoom;
        camera.max_zoom = settings.max_zoom;
        camera.zoom_in_step = settings.zoom_in_step;
        camera.zoom_out_step = settings.zoom_out_step;

        let mut resolver = SnapResolver::new(settings.reference_timeout());
        resolver.set_on_segment_multiplier(settings.on_segment_multiplier);

        Self {
            drawing: Drawing::new(),
            camera,
            tools: ToolManager::new(),
            selection: Vec::new(),
            viewport_size,
            current_color: settings.default_color.color(),
            settings,
            resolver,
            cursor: Point::ZERO,
            pan_anchor: None,
            command: "Ready".to_string(),
            last_sweep: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolver(&self) -> &SnapResolver {
        &self.resolver
    }

    /// Set the viewport size, keeping the view centre fixed.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        let shift = Vec2::new(
            (width - self.viewport_size.width) / 2.0,
            (height - self.viewport_size.height) / 2.0,
        );
        self.camera.pan(shift);
        self.viewport_size = Size::new(width, height);
    }

    /// Last message produced by a command.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn current_color(&self) -> SerializableColor {
        self.current_color
    }

    /// Last resolved cursor position (world space).
    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn is_shift_held(&self) -> bool {
        self.resolver.is_shift_held()
    }

    /// Hand the current segments and zoom to the snap engine. The drawing
    /// and camera are public, so this runs before every query.
    fn refresh_snap(&mut self) {
        self.resolver
            .configure(self.settings.snap_threshold, self.camera.zoom, self.drawing.segments());
    }

    /// Resolve a screen position to a world point.
    pub fn resolve_screen(&mut self, screen: Point, now: Instant) -> Resolved {
        let world = self.camera.screen_to_world(screen);
        self.resolve_world(world, now)
    }

    /// Resolve a world position.
    pub fn resolve_world(&mut self, world: Point, now: Instant) -> Resolved {
        self.refresh_snap();
        self.resolver.resolve(world, now)
    }

    /// Switch the active tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
        self.resolver.set_bypass(tool == ToolKind::Delete);
        self.selection.clear();
        self.command = tool.name().to_string();
        log::debug!("Tool changed to {}", tool.name());
    }

    /// Toggle ortho mode. Returns the new state.
    pub fn toggle_ortho(&mut self) -> bool {
        self.tools.toggle_ortho()
    }

    /// Colour for new segments; also recolours the current selection.
    pub fn set_color(&mut self, color: SerializableColor) {
        self.current_color = color;
        if !self.selection.is_empty() {
            self.drawing.set_color(&self.selection, color);
        }
    }

    /// Handle a pointer event in screen coordinates.
    pub fn handle_pointer_event(&mut self, event: PointerEvent, now: Instant) {
        match event {
            PointerEvent::Down { position, button } => self.pointer_down(position, button, now),
            PointerEvent::Move { position } => self.pointer_move(position, now),
            PointerEvent::Up { position, button } => self.pointer_up(position, button),
            PointerEvent::Scroll { position, delta } => self.camera.wheel(position, delta.y),
        }
    }

    fn pointer_down(&mut self, screen: Point, button: MouseButton, now: Instant) {
        self.resolver.begin_action();

        match button {
            MouseButton::Middle => {
                self.pan_anchor = Some(screen);
                return;
            }
            MouseButton::Right => return,
            MouseButton::Left => {}
        }

        let raw = self.camera.screen_to_world(screen);
        let resolved = self.resolve_world(raw, now).point;
        self.cursor = resolved;

        let state = std::mem::take(&mut self.tools.state);
        self.tools.state = match (self.tools.current_tool, state) {
            (ToolKind::Line | ToolKind::Dimension, ToolState::Idle) => ToolState::Placing {
                start: resolved,
                current: resolved,
            },
            (ToolKind::Line, ToolState::Placing { start, .. }) => {
                let end = self.tools.constrained_end(start, resolved);
                self.commit_line(start, end);
                ToolState::Idle
            }
            (ToolKind::Dimension, ToolState::Placing { start, .. }) => {
                self.drawing
                    .add_dimension(Dimension::new(start, resolved, self.settings.dimension_offset));
                self.command = "Dimension added".to_string();
                ToolState::Idle
            }
            (ToolKind::Move, ToolState::Idle) => {
                let tolerance = self.settings.selection_radius / self.camera.zoom;
                match self.drawing.segment_at(raw, tolerance) {
                    Some(id) => {
                        self.selection = vec![id];
                        self.command = "Move: Click base point".to_string();
                        ToolState::AwaitingBase {
                            selection: vec![id],
                        }
                    }
                    None => {
                        self.selection.clear();
                        ToolState::Idle
                    }
                }
            }
            (ToolKind::Move, ToolState::AwaitingBase { selection }) => {
                self.command = "Move: Click destination point".to_string();
                ToolState::AwaitingDestination {
                    selection,
                    base: resolved,
                    current: resolved,
                }
            }
            (ToolKind::Move, ToolState::AwaitingDestination { selection, base, .. }) => {
                self.drawing.move_segments(&selection, resolved - base);
                self.selection.clear();
                self.command = "Move completed".to_string();
                ToolState::Idle
            }
            (ToolKind::Delete | ToolKind::None, _) => ToolState::Selecting {
                start: screen,
                current: screen,
            },
            (_, state) => state,
        };
    }

    fn pointer_move(&mut self, screen: Point, now: Instant) {
        if let Some(anchor) = self.pan_anchor {
            self.camera.pan(screen - anchor);
            self.pan_anchor = Some(screen);
            return;
        }

        let resolved = self.resolve_screen(screen, now).point;
        self.cursor = resolved;

        let line_end = match self.tools.state {
            ToolState::Placing { start, .. } if self.tools.current_tool == ToolKind::Line => {
                Some(self.tools.constrained_end(start, resolved))
            }
            _ => None,
        };

        match &mut self.tools.state {
            ToolState::Placing { current, .. } => *current = line_end.unwrap_or(resolved),
            ToolState::AwaitingDestination { current, .. } => *current = resolved,
            ToolState::Selecting { current, .. } => *current = screen,
            ToolState::Idle | ToolState::AwaitingBase { .. } => {}
        }
    }

    fn pointer_up(&mut self, screen: Point, button: MouseButton) {
        if button == MouseButton::Middle {
            self.pan_anchor = None;
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        if let ToolState::Selecting { start, .. } = self.tools.state {
            self.tools.state = ToolState::Idle;
            self.finish_rectangle(start, screen);
        }
    }

    /// Select (or delete, in delete mode) by a screen-space rectangle.
    ///
    /// Dragging right-to-left or bottom-to-top is a crossing selection.
    fn finish_rectangle(&mut self, start: Point, end: Point) {
        let mode = if end.x < start.x || end.y < start.y {
            SelectionMode::Crossing
        } else {
            SelectionMode::Window
        };
        let rect = Rect::from_points(
            self.camera.screen_to_world(start),
            self.camera.screen_to_world(end),
        );
        let ids = self.drawing.segments_in_rect(rect, mode);

        if self.tools.current_tool == ToolKind::Delete {
            if !ids.is_empty() {
                let removed = self.drawing.remove_segments(&ids);
                log::info!("Deleted {} segments", removed);
                self.command =
                    "Objects deleted. Select more objects to delete or ESC to exit".to_string();
            }
            self.selection.clear();
        } else {
            self.selection = ids;
        }
    }

    fn commit_line(&mut self, start: Point, end: Point) {
        self.drawing
            .add_segment(Segment::with_color(start, end, self.current_color));
        self.tools.length_mut().clear();
        self.command = "Line added".to_string();
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, event: KeyEvent, now: Instant) {
        match event {
            KeyEvent::Pressed(key) => self.key_pressed(key, now),
            KeyEvent::Released(Key::Shift) => {
                self.resolver.shift_released();
            }
            KeyEvent::Released(_) => {}
        }
    }

    fn key_pressed(&mut self, key: Key, now: Instant) {
        match key {
            Key::F8 => {
                let on = self.toggle_ortho();
                self.command = format!("Ortho {}", if on { "ON" } else { "OFF" });
            }
            Key::Char(c) => {
                if self.is_placing_line() && self.tools.length_mut().push(c) {
                    self.refresh_line_preview();
                }
            }
            Key::Backspace => {
                if self.is_placing_line() {
                    self.tools.length_mut().backspace();
                    self.refresh_line_preview();
                }
            }
            Key::Enter => self.confirm_length(),
            Key::Escape => {
                let was_delete = self.tools.current_tool == ToolKind::Delete;
                self.set_tool(ToolKind::None);
                self.resolver.clear_all();
                self.command = if was_delete {
                    "Delete mode canceled".to_string()
                } else {
                    "Ready".to_string()
                };
            }
            Key::Delete => {
                if self.tools.current_tool != ToolKind::Delete {
                    self.set_tool(ToolKind::Delete);
                }
            }
            Key::Shift => {
                self.resolver.shift_pressed(now);
            }
        }
    }

    fn is_placing_line(&self) -> bool {
        self.tools.current_tool == ToolKind::Line
            && matches!(self.tools.state, ToolState::Placing { .. })
    }

    fn refresh_line_preview(&mut self) {
        let cursor = self.cursor;
        if let ToolState::Placing { start, .. } = self.tools.state {
            let end = self.tools.constrained_end(start, cursor);
            self.tools.state = ToolState::Placing { start, current: end };
        }
    }

    /// Enter: commit the line at the typed length along the current
    /// direction.
    fn confirm_length(&mut self) {
        if !self.is_placing_line() {
            return;
        }
        let ToolState::Placing { start, current } = self.tools.state else {
            return;
        };
        // No direction yet: keep the typed length for a later Enter.
        if normalized(current - start).is_none() {
            return;
        }
        let Some(length) = self.tools.length_mut().confirm() else {
            return;
        };
        let end = apply_length(start, current, length);
        self.commit_line(start, end);
        self.tools.state = ToolState::Idle;
    }

    /// Periodic sweep; returns whether a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = match self.last_sweep {
            Some(last) => now.saturating_duration_since(last) >= self.settings.sweep_interval(),
            None => true,
        };
        if !due {
            return false;
        }
        self.last_sweep = Some(now);
        self.resolver.sweep(now)
    }

    /// Fit the view to the drawing, or reset it when the drawing is empty.
    pub fn zoom_all(&mut self) {
        match self.drawing.bounds() {
            Some(bounds) => {
                self.camera
                    .fit_to_bounds(bounds, self.viewport_size, self.settings.fit_padding)
            }
            None => self.camera.reset(self.viewport_size),
        }
    }

    /// Clear drawing, selection, view and tools.
    pub fn reset_all(&mut self) {
        self.drawing.clear();
        self.selection.clear();
        self.set_tool(ToolKind::None);
        self.resolver.clear_all();
        self.camera.reset(self.viewport_size);
        self.current_color = self.settings.default_color.color();
        self.command = "Ready".to_string();
    }

    /// Write all segments to a DXF file.
    pub fn save_dxf(&mut self, path: &Path) -> FileOutcome {
        let outcome = match dxf::save_dxf(path, self.drawing.segments()) {
            Ok(()) => FileOutcome::ok(format!("Saved {}", path.display())),
            Err(e) => FileOutcome::failed(format!("Could not save file: {}", e)),
        };
        self.command = outcome.message.clone();
        outcome
    }

    /// Replace all segments with those read from a DXF file.
    pub fn load_dxf(&mut self, path: &Path) -> FileOutcome {
        let outcome = match dxf::load_dxf(path) {
            Ok(segments) => {
                let count = segments.len();
                self.drawing.replace_segments(segments);
                self.selection.clear();
                self.tools.reset_state();
                self.resolver.clear_all();
                self.zoom_all();
                FileOutcome::ok(format!("Loaded {} lines from {}", count, path.display()))
            }
            Err(e) => FileOutcome::failed(format!("Could not open file: {}", e)),
        };
        self.command = outcome.message.clone();
        outcome
    }

    /// Line or dimension preview from the fixed start to the cursor.
    pub fn preview_line(&self) -> Option<Line> {
        match self.tools.state {
            ToolState::Placing { start, current } => Some(Line::new(start, current)),
            _ => None,
        }
    }

    /// Selected segments displaced by the move ghost offset.
    pub fn ghost_segments(&self) -> Vec<Segment> {
        let Some(offset) = self.tools.ghost_offset() else {
            return Vec::new();
        };
        self.selection
            .iter()
            .filter_map(|&id| self.drawing.get(id))
            .map(|segment| {
                let mut ghost = segment.clone();
                ghost.translate(offset);
                ghost
            })
            .collect()
    }

    /// The selection rectangle being dragged, in screen space.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self.tools.state {
            ToolState::Selecting { start, current } => Some(Rect::from_points(start, current)),
            _ => None,
        }
    }

    /// Status line for the front end.
    pub fn status(&self) -> String {
        let ortho = if self.tools.ortho { " (Ortho)" } else { "" };
        match (self.tools.current_tool, &self.tools.state) {
            (ToolKind::Delete, _) => "Delete Mode: Select objects to delete (ESC to exit)".to_string(),
            (ToolKind::Move, ToolState::AwaitingBase { .. }) => {
                "Move Mode: Click to set Move Start Point".to_string()
            }
            (ToolKind::Move, ToolState::AwaitingDestination { .. }) => {
                "Move Mode: Click to set Move End Point".to_string()
            }
            (ToolKind::Move, _) => "Move Mode: Click an object to move".to_string(),
            (ToolKind::Line, ToolState::Placing { .. }) => {
                let length = self.tools.length();
                let length_text = match (length.input(), length.target()) {
                    ("", Some(target)) => format!(" | Length: {}", target),
                    ("", None) => String::new(),
                    (input, _) => format!(" | Length: {}", input),
                };
                format!("Drawing Line: Click for end point{}{}", ortho, length_text)
            }
            (ToolKind::Line, _) => format!("Drawing Line: Click for start point{}", ortho),
            (ToolKind::Dimension, ToolState::Placing { .. }) => {
                "Dimension: Click second point".to_string()
            }
            (ToolKind::Dimension, _) => "Dimension: Click first point".to_string(),
            (ToolKind::None, _) => format!(
                "Ready - Left drag: Select | Middle drag: Pan | Wheel: Zoom | F8: Ortho {}",
                if self.tools.ortho { "ON" } else { "OFF" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Duration;
    use crate::color::AciColor;
    use crate::resolve::ResolveSource;
    use crate::snap::SnapKind;
    use tempfile::tempdir;

    /// Canvas whose camera maps world (x, y) to screen (x, -y): unit zoom,
    /// origin at the top-left corner.
    fn canvas() -> Canvas {
        let mut canvas = Canvas::new();
        canvas.camera.offset = Vec2::ZERO;
        canvas
    }

    fn screen(x: f64, y: f64) -> Point {
        Point::new(x, -y)
    }

    fn click(canvas: &mut Canvas, x: f64, y: f64, now: Instant) {
        let position = screen(x, y);
        canvas.handle_pointer_event(PointerEvent::Move { position }, now);
        canvas.handle_pointer_event(
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            },
            now,
        );
        canvas.handle_pointer_event(
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
            },
            now,
        );
    }

    fn drag(canvas: &mut Canvas, from: Point, to: Point, now: Instant) {
        canvas.handle_pointer_event(
            PointerEvent::Down {
                position: from,
                button: MouseButton::Left,
            },
            now,
        );
        canvas.handle_pointer_event(PointerEvent::Move { position: to }, now);
        canvas.handle_pointer_event(
            PointerEvent::Up {
                position: to,
                button: MouseButton::Left,
            },
            now,
        );
    }

    fn press(canvas: &mut Canvas, key: Key, now: Instant) {
        canvas.handle_key_event(KeyEvent::Pressed(key), now);
    }

    #[test]
    fn test_draw_line() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas.set_tool(ToolKind::Line);

        click(&mut canvas, 0.0, 0.0, now);
        assert!(canvas.preview_line().is_some());
        click(&mut canvas, 100.0, 0.0, now);

        assert_eq!(canvas.drawing.len(), 1);
        let segment = &canvas.drawing.segments()[0];
        assert_eq!(segment.start, Point::new(0.0, 0.0));
        assert_eq!(segment.end, Point::new(100.0, 0.0));
        assert_eq!(canvas.tools.current_tool, ToolKind::Line);
        assert!(canvas.preview_line().is_none());
    }

    #[test]
    fn test_line_snaps_to_endpoint() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas.set_tool(ToolKind::Line);
        click(&mut canvas, 0.0, 0.0, now);
        click(&mut canvas, 100.0, 0.0, now);

        click(&mut canvas, 101.0, 1.0, now);
        click(&mut canvas, 100.0, 80.0, now);

        let second = &canvas.drawing.segments()[1];
        assert_eq!(second.start, Point::new(100.0, 0.0));
    }

    #[test]
    fn test_ortho_line() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas.set_tool(ToolKind::Line);
        press(&mut canvas, Key::F8, now);
        assert!(canvas.status().contains("(Ortho)"));

        click(&mut canvas, 0.0, 0.0, now);
        click(&mut canvas, 50.0, 20.0, now);
        let segment = &canvas.drawing.segments()[0];
        assert_eq!(segment.end, Point::new(50.0, 0.0));
    }

    #[test]
    fn test_numeric_length_entry() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas.set_tool(ToolKind::Line);
        click(&mut canvas, 0.0, 0.0, now);
        canvas.handle_pointer_event(PointerEvent::Move { position: screen(30.0, 40.0) }, now);

        press(&mut canvas, Key::Char('1'), now);
        press(&mut canvas, Key::Char('0'), now);
        assert_eq!(canvas.status(), "Drawing Line: Click for end point | Length: 10");
        let preview = canvas.preview_line().unwrap();
        assert!((preview.p1 - Point::new(6.0, 8.0)).hypot() < 1e-9);

        press(&mut canvas, Key::Enter, now);
        assert_eq!(canvas.drawing.len(), 1);
        let segment = &canvas.drawing.segments()[0];
        assert!((segment.end - Point::new(6.0, 8.0)).hypot() < 1e-9);
        assert!(canvas.preview_line().is_none());
    }

    #[test]
    fn test_enter_without_direction_keeps_length() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas.set_tool(ToolKind::Line);
        click(&mut canvas, 0.0, 0.0, now);

        press(&mut canvas, Key::Char('5'), now);
        press(&mut canvas, Key::Enter, now);
        assert!(canvas.drawing.is_empty());
        assert_eq!(canvas.tools.length().input(), "5");

        canvas.handle_pointer_event(PointerEvent::Move { position: screen(0.0, 20.0) }, now);
        press(&mut canvas, Key::Enter, now);
        assert_eq!(canvas.drawing.len(), 1);
        let segment = &canvas.drawing.segments()[0];
        assert!((segment.end - Point::new(0.0, 5.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_dimension_tool() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas.set_tool(ToolKind::Dimension);
        click(&mut canvas, 0.0, 0.0, now);
        assert_eq!(canvas.status(), "Dimension: Click second point");
        click(&mut canvas, 30.0, 40.0, now);

        let dims = canvas.drawing.dimensions();
        assert_eq!(dims.len(), 1);
        assert_eq!(dims[0].text, "50.00");
        assert_eq!(dims[0].offset, canvas.settings().dimension_offset);
    }

    #[test]
    fn test_move_tool() {
        let mut canvas = canvas();
        let now = Instant::now();
        let id = canvas
            .drawing
            .add_segment(Segment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
        canvas.set_tool(ToolKind::Move);

        // Pick the segment away from any snap target.
        click(&mut canvas, 30.0, 3.0, now);
        assert_eq!(canvas.selection, vec![id]);
        assert_eq!(canvas.status(), "Move Mode: Click to set Move Start Point");

        click(&mut canvas, 0.0, 0.0, now);
        canvas.handle_pointer_event(PointerEvent::Move { position: screen(200.0, 200.0) }, now);
        let ghosts = canvas.ghost_segments();
        assert_eq!(ghosts.len(), 1);
        assert_eq!(ghosts[0].start, Point::new(200.0, 200.0));

        click(&mut canvas, 200.0, 200.0, now);
        let moved = canvas.drawing.get(id).unwrap();
        assert_eq!(moved.start, Point::new(200.0, 200.0));
        assert_eq!(moved.end, Point::new(300.0, 200.0));
        assert!(canvas.selection.is_empty());
        assert_eq!(canvas.command(), "Move completed");
    }

    #[test]
    fn test_move_tool_click_on_empty_space() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas
            .drawing
            .add_segment(Segment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
        canvas.set_tool(ToolKind::Move);
        click(&mut canvas, 50.0, 60.0, now);
        assert!(canvas.selection.is_empty());
        assert!(!canvas.tools.is_active());
    }

    #[test]
    fn test_delete_window_and_crossing() {
        let mut canvas = canvas();
        let now = Instant::now();
        let inside = canvas
            .drawing
            .add_segment(Segment::new(Point::new(10.0, 10.0), Point::new(20.0, 20.0)));
        let partial = canvas
            .drawing
            .add_segment(Segment::new(Point::new(10.0, 10.0), Point::new(200.0, 10.0)));

        press(&mut canvas, Key::Delete, now);
        assert_eq!(canvas.tools.current_tool, ToolKind::Delete);

        // Left-to-right, top-to-bottom in screen space: window selection.
        drag(&mut canvas, screen(0.0, 50.0), screen(50.0, 0.0), now);
        assert!(canvas.drawing.get(inside).is_none());
        assert!(canvas.drawing.get(partial).is_some());

        // Right-to-left: crossing selection.
        drag(&mut canvas, screen(50.0, 50.0), screen(0.0, 0.0), now);
        assert!(canvas.drawing.get(partial).is_none());
        assert!(canvas.command().starts_with("Objects deleted"));
    }

    #[test]
    fn test_delete_mode_resolves_raw() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas
            .drawing
            .add_segment(Segment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
        canvas.set_tool(ToolKind::Delete);
        let resolved = canvas.resolve_world(Point::new(0.5, 0.5), now);
        assert_eq!(resolved.point, Point::new(0.5, 0.5));
        assert!(resolved.is_raw());

        canvas.set_tool(ToolKind::Line);
        let resolved = canvas.resolve_world(Point::new(0.5, 0.5), now);
        assert_eq!(resolved.source, ResolveSource::Snap(SnapKind::Endpoint));
    }

    #[test]
    fn test_escape_cancels() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas.set_tool(ToolKind::Delete);
        press(&mut canvas, Key::Escape, now);
        assert_eq!(canvas.tools.current_tool, ToolKind::None);
        assert_eq!(canvas.command(), "Delete mode canceled");
        assert!(!canvas.resolver().is_bypassed());

        canvas.set_tool(ToolKind::Line);
        click(&mut canvas, 0.0, 0.0, now);
        press(&mut canvas, Key::Escape, now);
        assert!(canvas.preview_line().is_none());
        assert_eq!(canvas.tools.current_tool, ToolKind::None);
    }

    #[test]
    fn test_shift_chain() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas
            .drawing
            .add_segment(Segment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));

        canvas.handle_pointer_event(PointerEvent::Move { position: screen(1.0, 1.0) }, now);
        press(&mut canvas, Key::Shift, now);
        assert!(canvas.is_shift_held());
        assert_eq!(canvas.resolver().shift_chain().len(), 1);

        canvas.handle_key_event(KeyEvent::Released(Key::Shift), now);
        assert!(canvas.resolver().shift_chain().is_empty());
    }

    #[test]
    fn test_shift_chain_follows_held_snaps() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas
            .drawing
            .add_segment(Segment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
        canvas
            .drawing
            .add_segment(Segment::new(Point::new(50.0, 50.0), Point::new(80.0, 50.0)));

        canvas.handle_pointer_event(PointerEvent::Move { position: screen(0.5, 0.5) }, now);
        press(&mut canvas, Key::Shift, now);
        canvas.handle_pointer_event(PointerEvent::Move { position: screen(50.5, 50.5) }, now);
        assert_eq!(canvas.resolver().current_snap().kind, SnapKind::Endpoint);
        assert_eq!(canvas.resolver().shift_chain().len(), 2);
        assert_eq!(
            canvas.resolver().shift_chain().intersection(now),
            Some(Point::new(50.0, 50.0))
        );

        // A new press drops the tracked lines; the held chain still catches
        // the cursor.
        canvas.handle_pointer_event(
            PointerEvent::Down {
                position: screen(50.5, 50.5),
                button: MouseButton::Middle,
            },
            now,
        );
        let resolved = canvas.resolve_screen(screen(50.5, 50.5), now);
        assert_eq!(resolved.point, Point::new(50.0, 50.0));
        assert_eq!(resolved.source, ResolveSource::ShiftIntersection);

        canvas.handle_key_event(KeyEvent::Released(Key::Shift), now);
        assert!(!canvas.is_shift_held());
        assert!(canvas.resolver().shift_chain().is_empty());
    }

    #[test]
    fn test_tick_respects_interval() {
        let mut canvas = canvas();
        let start = Instant::now();
        canvas
            .drawing
            .add_segment(Segment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
        canvas.resolve_world(Point::new(1.0, 1.0), start);
        assert!(canvas.resolver().reference().is_armed(start));

        assert!(!canvas.tick(start));
        let later = start + Duration::from_secs(3);
        assert!(canvas.tick(later));
        assert!(!canvas.resolver().reference().is_armed(later));
        assert!(!canvas.tick(later + Duration::from_millis(10)));
    }

    #[test]
    fn test_wheel_zoom_updates_snap_radius() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas.resolve_world(Point::ZERO, now);
        let before = canvas.resolver().engine().effective_radius();

        canvas.handle_pointer_event(
            PointerEvent::Scroll {
                position: Point::ZERO,
                delta: Vec2::new(0.0, 1.0),
            },
            now,
        );
        canvas.resolve_world(Point::ZERO, now);
        let after = canvas.resolver().engine().effective_radius();
        assert!((after - before / 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_zoom_limits_do_not_panic() {
        let settings = Settings {
            min_zoom: 10.0,
            max_zoom: 1.0,
            ..Settings::default()
        };
        let mut canvas = Canvas::with_settings(settings);
        let now = Instant::now();
        canvas.handle_pointer_event(
            PointerEvent::Scroll {
                position: Point::ZERO,
                delta: Vec2::new(0.0, 1.0),
            },
            now,
        );
        assert!(canvas.camera.zoom >= 1.0 && canvas.camera.zoom <= 10.0);

        canvas
            .drawing
            .add_segment(Segment::new(Point::new(0.0, 0.0), Point::new(1000.0, 0.0)));
        canvas.zoom_all();
        assert!(canvas.camera.zoom >= 1.0 && canvas.camera.zoom <= 10.0);
    }

    #[test]
    fn test_middle_drag_pans() {
        let mut canvas = canvas();
        let now = Instant::now();
        canvas.handle_pointer_event(
            PointerEvent::Down {
                position: Point::new(10.0, 10.0),
                button: MouseButton::Middle,
            },
            now,
        );
        canvas.handle_pointer_event(PointerEvent::Move { position: Point::new(30.0, 5.0) }, now);
        canvas.handle_pointer_event(
            PointerEvent::Up {
                position: Point::new(30.0, 5.0),
                button: MouseButton::Middle,
            },
            now,
        );
        assert_eq!(canvas.camera.offset, Vec2::new(20.0, -5.0));
    }

    #[test]
    fn test_select_and_recolor() {
        let mut canvas = canvas();
        let now = Instant::now();
        let id = canvas
            .drawing
            .add_segment(Segment::new(Point::new(10.0, 10.0), Point::new(20.0, 20.0)));

        drag(&mut canvas, screen(0.0, 50.0), screen(50.0, 0.0), now);
        assert_eq!(canvas.selection, vec![id]);

        canvas.set_color(AciColor::Red.color());
        assert_eq!(canvas.drawing.get(id).unwrap().color, AciColor::Red.color());
        assert_eq!(canvas.current_color(), AciColor::Red.color());
    }

    #[test]
    fn test_selection_rect_while_dragging() {
        let mut canvas = canvas();
        let now = Instant::now();
        assert!(canvas.selection_rect().is_none());

        canvas.handle_pointer_event(
            PointerEvent::Down {
                position: Point::new(40.0, 10.0),
                button: MouseButton::Left,
            },
            now,
        );
        canvas.handle_pointer_event(PointerEvent::Move { position: Point::new(10.0, 30.0) }, now);
        assert_eq!(canvas.selection_rect(), Some(Rect::new(10.0, 10.0, 40.0, 30.0)));

        canvas.handle_pointer_event(
            PointerEvent::Up {
                position: Point::new(10.0, 30.0),
                button: MouseButton::Left,
            },
            now,
        );
        assert!(canvas.selection_rect().is_none());
    }

    #[test]
    fn test_resize_keeps_view_centre() {
        let mut canvas = Canvas::new();
        let centre = canvas.camera.screen_to_world(Point::new(400.0, 300.0));
        canvas.set_viewport_size(1000.0, 500.0);
        let after = canvas.camera.screen_to_world(Point::new(500.0, 250.0));
        assert!((after - centre).hypot() < 1e-9);
        assert_eq!(canvas.viewport_size, Size::new(1000.0, 500.0));
    }

    #[test]
    fn test_save_and_load_dxf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.dxf");

        let mut canvas = canvas();
        canvas.set_color(AciColor::Green.color());
        canvas.set_tool(ToolKind::Line);
        let now = Instant::now();
        click(&mut canvas, 0.0, 0.0, now);
        click(&mut canvas, 100.0, 50.0, now);

        let outcome = canvas.save_dxf(&path);
        assert!(outcome.success, "{}", outcome.message);

        let mut other = Canvas::new();
        let outcome = other.load_dxf(&path);
        assert!(outcome.success);
        assert_eq!(outcome.message, format!("Loaded 1 lines from {}", path.display()));
        assert_eq!(other.drawing.len(), 1);
        assert_eq!(other.drawing.segments()[0].color, AciColor::Green.color());

        // The loaded drawing is centred in the view.
        let center = other.camera.world_to_screen(Point::new(50.0, 25.0));
        assert!((center - Point::new(400.0, 300.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_load_failure_keeps_drawing() {
        let dir = tempdir().unwrap();
        let mut canvas = canvas();
        canvas
            .drawing
            .add_segment(Segment::new(Point::new(0.0, 0.0), Point::new(1.0, 0.0)));

        let outcome = canvas.load_dxf(&dir.path().join("missing.dxf"));
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Could not open file"));
        assert_eq!(canvas.drawing.len(), 1);
    }

    #[test]
    fn test_reset_all() {
        let mut canvas = canvas();
        canvas
            .drawing
            .add_segment(Segment::new(Point::new(0.0, 0.0), Point::new(1.0, 0.0)));
        canvas.set_tool(ToolKind::Line);
        canvas.set_color(AciColor::Blue.color());
        canvas.reset_all();
        assert!(canvas.drawing.is_empty());
        assert_eq!(canvas.tools.current_tool, ToolKind::None);
        assert_eq!(canvas.current_color(), SerializableColor::white());
        assert_eq!(canvas.camera.offset, Vec2::new(400.0, 300.0));
    }
}
