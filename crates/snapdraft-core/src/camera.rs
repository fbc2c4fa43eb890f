//! Camera module for pan/zoom transforms.
//!
//! World space is y-up; screen space is y-down with the origin at the top
//! left of the viewport.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default zoom limits.
pub const MIN_ZOOM: f64 = 0.01;
pub const MAX_ZOOM: f64 = 100.0;

/// Zoom factors for one wheel step.
pub const WHEEL_ZOOM_IN: f64 = 1.1;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Padding factor used when fitting the view to the drawing.
pub const FIT_PADDING: f64 = 1.2;

/// Camera manages the view transform for the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen position of the world origin.
    pub offset: Vec2,
    /// Screen pixels per world unit.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom factors for one wheel step in and out.
    pub zoom_in_step: f64,
    pub zoom_out_step: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_in_step: WHEEL_ZOOM_IN,
            zoom_out_step: WHEEL_ZOOM_OUT,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with the world origin at the centre of the viewport.
    pub fn centered(viewport: Size) -> Self {
        let mut camera = Self::default();
        camera.reset(viewport);
        camera
    }

    /// World-to-screen transform (flips y).
    pub fn transform(&self) -> Affine {
        Affine::new([self.zoom, 0.0, 0.0, -self.zoom, self.offset.x, self.offset.y])
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        self.transform().inverse()
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Set the zoom, clamped to the camera's limits.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let old_zoom = self.zoom;
        let world_point = self.screen_to_world(screen_point);
        self.set_zoom(self.zoom * factor);
        if (self.zoom - old_zoom).abs() < f64::EPSILON {
            return;
        }

        // Adjust offset so world_point stays at screen_point
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// One mouse-wheel step at `screen_point`; positive `delta` zooms in.
    pub fn wheel(&mut self, screen_point: Point, delta: f64) {
        if delta == 0.0 {
            return;
        }
        let factor = if delta > 0.0 {
            self.zoom_in_step
        } else {
            self.zoom_out_step
        };
        self.zoom_at(screen_point, factor);
    }

    /// Reset zoom to 1 with the world origin at the viewport centre.
    pub fn reset(&mut self, viewport: Size) {
        self.zoom = 1.0;
        self.offset = Vec2::new(viewport.width / 2.0, viewport.height / 2.0);
    }

    /// Fit the camera to show the given bounding box.
    ///
    /// Zero extents count as one world unit so a single point or an
    /// axis-aligned segment still yields a finite zoom.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        let width = if bounds.width() == 0.0 { 1.0 } else { bounds.width() };
        let height = if bounds.height() == 0.0 { 1.0 } else { bounds.height() };
        let padding = padding.max(f64::EPSILON);

        let zoom_x = viewport.width / (width * padding);
        let zoom_y = viewport.height / (height * padding);
        self.set_zoom(zoom_x.min(zoom_y));

        // Center the bounds in the viewport
        let center = bounds.center();
        self.offset = Vec2::new(
            viewport.width / 2.0 - center.x * self.zoom,
            viewport.height / 2.0 + center.y * self.zoom,
        );
    }
}
