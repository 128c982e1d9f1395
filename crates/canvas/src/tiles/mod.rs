//! Tile persistence backends
//!
//! A tile store is plain key -> raster storage keyed by (canvas id, tile
//! index). It knows nothing about canvas geometry or locking; callers are
//! expected to hold the owning canvas's lock.

mod fs;
mod memory;

pub use fs::FsTileStore;
pub use memory::MemoryTileStore;

use crate::error::StorageError;
use crate::raster::Raster;
use crate::types::CanvasId;

/// Trait for tile storage backends
pub trait TileStore: Send + Sync {
    /// Persist a tile, replacing any previous contents
    fn save(&self, canvas: CanvasId, tile: u32, raster: &Raster) -> Result<(), StorageError>;

    /// Load a previously saved tile
    fn load(&self, canvas: CanvasId, tile: u32) -> Result<Raster, StorageError>;

    /// Remove every tile of a canvas. Removing an unknown canvas is not an error.
    fn delete_all(&self, canvas: CanvasId) -> Result<(), StorageError>;
}
