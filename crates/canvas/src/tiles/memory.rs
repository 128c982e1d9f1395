//! In-process tile storage

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::StorageError;
use crate::raster::Raster;
use crate::types::CanvasId;

use super::TileStore;

/// Tile store that keeps every tile in memory.
///
/// Nothing survives a restart. Useful for tests and throwaway deployments.
#[derive(Debug, Default)]
pub struct MemoryTileStore {
    tiles: RwLock<HashMap<(CanvasId, u32), Raster>>,
}

impl MemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tiles currently stored for `canvas`
    #[cfg(test)]
    pub(crate) fn tile_count(&self, canvas: CanvasId) -> usize {
        self.tiles.read().keys().filter(|(id, _)| *id == canvas).count()
    }

    /// Total number of tiles across all canvases
    #[cfg(test)]
    pub(crate) fn total_tile_count(&self) -> usize {
        self.tiles.read().len()
    }
}

impl TileStore for MemoryTileStore {
    fn save(&self, canvas: CanvasId, tile: u32, raster: &Raster) -> Result<(), StorageError> {
        self.tiles.write().insert((canvas, tile), raster.clone());
        Ok(())
    }

    fn load(&self, canvas: CanvasId, tile: u32) -> Result<Raster, StorageError> {
        self.tiles
            .read()
            .get(&(canvas, tile))
            .cloned()
            .ok_or(StorageError::MissingTile { canvas, tile })
    }

    fn delete_all(&self, canvas: CanvasId) -> Result<(), StorageError> {
        self.tiles.write().retain(|(id, _), _| *id != canvas);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let store = MemoryTileStore::new();
        let raster = Raster::filled(4, 2, [9, 9, 9]);

        store.save(3, 1, &raster).unwrap();
        assert_eq!(store.load(3, 1).unwrap(), raster);
        assert!(matches!(
            store.load(3, 0),
            Err(StorageError::MissingTile { canvas: 3, tile: 0 })
        ));
    }

    #[test]
    fn test_delete_all_is_scoped() {
        let store = MemoryTileStore::new();
        for tile in 0..3 {
            store.save(0, tile, &Raster::new(1, 1)).unwrap();
            store.save(1, tile, &Raster::new(1, 1)).unwrap();
        }

        store.delete_all(0).unwrap();
        assert_eq!(store.tile_count(0), 0);
        assert_eq!(store.tile_count(1), 3);

        // Unknown canvas
        store.delete_all(42).unwrap();
        assert_eq!(store.total_tile_count(), 3);
    }
}
