//! Error types for canvas operations.

use std::path::PathBuf;

use crate::types::CanvasId;

/// Errors from encoding or decoding raster bytes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Raster buffer does not match {width}x{height}")]
    BufferSize { width: u32, height: u32 },
}

/// Errors from the tile backend. These are never expected in normal
/// operation and are reported as-is to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tile codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Tile {tile} of canvas {canvas} is missing")]
    MissingTile { canvas: CanvasId, tile: u32 },

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Errors returned by [`crate::CanvasStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// The id was never allocated, is still being created, or was deleted
    #[error("Incorrect image id: {0}")]
    IncorrectImageId(CanvasId),

    #[error("Incorrect image region: {0}")]
    IncorrectImageRegion(String),

    /// Inbound image bytes could not be decoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl CanvasError {
    pub(crate) fn region(reason: impl Into<String>) -> Self {
        Self::IncorrectImageRegion(reason.into())
    }
}

/// Errors from building a [`crate::CanvasStore`].
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] chartas_config::ConfigError),

    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),
}
