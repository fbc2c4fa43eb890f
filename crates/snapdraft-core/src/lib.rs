//! SnapDraft Core Library
//!
//! Platform-agnostic drawing model, snapping and construction inference for
//! the SnapDraft line editor.

pub mod camera;
pub mod canvas;
pub mod color;
pub mod dimension;
pub mod document;
pub mod geometry;
pub mod input;
pub mod kernel;
pub mod resolve;
pub mod settings;
pub mod snap;
pub mod storage;
pub mod tools;
pub mod tracking;

#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant};

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};

pub use camera::Camera;
pub use canvas::{Canvas, FileOutcome};
pub use color::{AciColor, SerializableColor};
pub use dimension::Dimension;
pub use document::{Drawing, SelectionMode};
pub use geometry::{Segment, SegmentId};
pub use input::{Key, KeyEvent, MouseButton, PointerEvent};
pub use resolve::{ResolveSource, Resolved, SnapResolver};
pub use settings::Settings;
pub use snap::{SnapCandidate, SnapEngine, SnapKind};
pub use storage::{StorageError, StorageResult};
pub use tools::{ToolKind, ToolManager, ToolState};
pub use tracking::{ReferenceTracker, TwoPointConstruction};
