//! Native drawing files (JSON) for platforms with a filesystem.

use super::{StorageError, StorageResult};
use crate::document::Drawing;
use std::fs;
use std::path::Path;

/// Save a full drawing, including dimensions, as JSON.
pub fn save_drawing(path: &Path, drawing: &Drawing) -> StorageResult<()> {
    let json = drawing
        .to_json()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    fs::write(path, json).map_err(|e| StorageError::from_io(path, "write", e))?;
    log::info!("Saved drawing to {}", path.display());
    Ok(())
}

/// Load a drawing saved by [`save_drawing`].
pub fn load_drawing(path: &Path) -> StorageResult<Drawing> {
    let json = fs::read_to_string(path).map_err(|e| StorageError::from_io(path, "read", e))?;
    Drawing::from_json(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}
