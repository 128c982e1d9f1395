//! One-file-per-tile storage under a working directory
//!
//! Layout: `{root}/{canvas_id}/{tile_index}.{ext}`

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chartas_config::ImageFormatKind;
use tracing::{debug, warn};

use crate::codec::{ImageCodec, RasterCodec};
use crate::error::StorageError;
use crate::raster::Raster;
use crate::types::CanvasId;

use super::TileStore;

/// Tile store writing encoded tiles to the filesystem
#[derive(Debug, Clone)]
pub struct FsTileStore {
    root: PathBuf,
    codec: ImageCodec,
    extension: &'static str,
}

impl FsTileStore {
    /// Open a store rooted at an existing directory
    pub fn new(root: impl Into<PathBuf>, format: ImageFormatKind) -> Result<Self, StorageError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StorageError::NotADirectory(root));
        }
        Ok(Self {
            root,
            codec: ImageCodec::new(format),
            extension: format.extension(),
        })
    }

    /// Directory holding every tile of `canvas`
    pub fn canvas_dir(&self, canvas: CanvasId) -> PathBuf {
        self.root.join(canvas.to_string())
    }

    pub fn tile_path(&self, canvas: CanvasId, tile: u32) -> PathBuf {
        self.canvas_dir(canvas)
            .join(format!("{}.{}", tile, self.extension))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl TileStore for FsTileStore {
    fn save(&self, canvas: CanvasId, tile: u32, raster: &Raster) -> Result<(), StorageError> {
        let dir = self.canvas_dir(canvas);
        std::fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let path = self.tile_path(canvas, tile);
        let bytes = self.codec.encode(raster)?;
        std::fs::write(&path, &bytes).map_err(io_error(&path))?;

        debug!("saved tile {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn load(&self, canvas: CanvasId, tile: u32) -> Result<Raster, StorageError> {
        let path = self.tile_path(canvas, tile);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::MissingTile { canvas, tile });
            }
            Err(e) => return Err(io_error(&path)(e)),
        };
        Ok(self.codec.decode(&bytes)?)
    }

    fn delete_all(&self, canvas: CanvasId) -> Result<(), StorageError> {
        let dir = self.canvas_dir(canvas);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("tile directory {} already gone", dir.display());
                Ok(())
            }
            Err(e) => Err(io_error(&dir)(e)),
        }
    }
}
