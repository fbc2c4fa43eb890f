//! User-tunable settings, persisted as JSON.

use crate::Duration;
use crate::camera::{FIT_PADDING, MAX_ZOOM, MIN_ZOOM, WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT};
use crate::color::AciColor;
use crate::snap::{DEFAULT_SNAP_THRESHOLD, ON_SEGMENT_RADIUS_MULTIPLIER};
use crate::storage::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Editor settings. Missing fields in a settings file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Snap radius in screen pixels.
    pub snap_threshold: f64,
    /// Radius multiplier for the on-segment snap tier.
    pub on_segment_multiplier: f64,
    /// Lifetime of reference points and tracked lines, in milliseconds.
    pub reference_timeout_ms: u64,
    /// Interval between expiry sweeps, in milliseconds.
    pub sweep_interval_ms: u64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom factor for one wheel step in.
    pub zoom_in_step: f64,
    /// Zoom factor for one wheel step out.
    pub zoom_out_step: f64,
    /// Hit-test radius in screen pixels.
    pub selection_radius: f64,
    /// Offset of new dimension lines, in world units.
    pub dimension_offset: f64,
    /// Colour for new segments.
    pub default_color: AciColor,
    /// Padding factor applied when fitting the view to the drawing.
    pub fit_padding: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            on_segment_multiplier: ON_SEGMENT_RADIUS_MULTIPLIER,
            reference_timeout_ms: 2000,
            sweep_interval_ms: 100,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_in_step: WHEEL_ZOOM_IN,
            zoom_out_step: WHEEL_ZOOM_OUT,
            selection_radius: 10.0,
            dimension_offset: 20.0,
            default_color: AciColor::White,
            fit_padding: FIT_PADDING,
        }
    }
}

impl Settings {
    pub fn reference_timeout(&self) -> Duration {
        Duration::from_millis(self.reference_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Repair values the camera cannot work with: non-positive or
    /// non-finite zoom limits and steps fall back to their defaults, and
    /// inverted zoom limits are swapped.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        self.min_zoom = positive(self.min_zoom, defaults.min_zoom);
        self.max_zoom = positive(self.max_zoom, defaults.max_zoom);
        if self.min_zoom > self.max_zoom {
            log::warn!(
                "Swapping inverted zoom limits {} and {}",
                self.min_zoom,
                self.max_zoom
            );
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        self.zoom_in_step = positive(self.zoom_in_step, defaults.zoom_in_step);
        self.zoom_out_step = positive(self.zoom_out_step, defaults.zoom_out_step);
        self.fit_padding = positive(self.fit_padding, defaults.fit_padding);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| StorageError::from_io(path, "read", e))?;
        Self::from_json(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(StorageError::NotFound(_)) => Self::default(),
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::from_io(parent, "create", e))?;
        }
        let json = self
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(path, json).map_err(|e| StorageError::from_io(path, "write", e))
    }

    /// Per-user settings file location.
    ///
    /// On Unix: `~/.config/snapdraft/settings.json`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("snapdraft").join("settings.json"))
    }
}
