//! Shared configuration for Chartas
//!
//! This crate provides the single source of truth for tile geometry,
//! storage layout, and server settings shared by the canvas store and the
//! HTTP front end.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default cap on tile width in pixels
pub const DEFAULT_MAX_TILE_WIDTH: u32 = 20000;

/// Default tile height in pixels
pub const DEFAULT_TILE_HEIGHT: u32 = 5000;

/// Default cap on the pixel count of a single read or write region
pub const DEFAULT_MAX_REGION_PIXELS: u64 = 1 << 28;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default mount point for canvas routes
pub const DEFAULT_REQUEST_PATH: &str = "/chartas";

/// Default upper bound for an uploaded image body (512 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 512 * 1024 * 1024;

/// Default working directory when none is configured
pub const DEFAULT_WORKING_DIR: &str = "chartas-data";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid tile size: {width}x{height}")]
    InvalidTileSize { width: u32, height: u32 },

    #[error("Region pixel limit must be positive")]
    InvalidRegionLimit,

    #[error("Request path must start with '/': {0:?}")]
    InvalidRequestPath(String),

    #[error("Body limit must be positive")]
    InvalidBodyLimit,

    #[error("Worker count must be positive")]
    InvalidWorkers,

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Geometry of the tiles a canvas is split into, and how much of a
/// canvas one request may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Tiles are never wider than this, regardless of canvas width
    pub max_tile_width: u32,
    /// Height of every tile except possibly the last one of a canvas
    pub tile_height: u32,
    /// Largest `width * height` a region read or write may ask for
    pub max_region_pixels: u64,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            max_tile_width: DEFAULT_MAX_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            max_region_pixels: DEFAULT_MAX_REGION_PIXELS,
        }
    }
}

impl TileConfig {
    pub fn new(max_tile_width: u32, tile_height: u32) -> Self {
        Self {
            max_tile_width,
            tile_height,
            max_region_pixels: DEFAULT_MAX_REGION_PIXELS,
        }
    }

    pub fn with_max_region_pixels(mut self, max_region_pixels: u64) -> Self {
        self.max_region_pixels = max_region_pixels;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tile_width == 0 || self.tile_height == 0 {
            return Err(ConfigError::InvalidTileSize {
                width: self.max_tile_width,
                height: self.tile_height,
            });
        }
        if self.max_region_pixels == 0 {
            return Err(ConfigError::InvalidRegionLimit);
        }
        Ok(())
    }
}

/// Container format used for persisted tiles and returned sub-images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormatKind {
    #[default]
    Bmp,
    Png,
}

impl ImageFormatKind {
    /// File extension for tiles written in this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Bmp => "bmp",
            Self::Png => "png",
        }
    }

    /// MIME type of encoded images
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Bmp => "image/bmp",
            Self::Png => "image/png",
        }
    }

    /// Parse a format name, case-insensitive
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bmp" => Some(Self::Bmp),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Where tile rasters are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One file per tile under the working directory
    #[default]
    Filesystem,
    /// Process memory only, lost on restart
    Memory,
}

/// Canvas store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub working_dir: PathBuf,
    pub tiles: TileConfig,
    pub format: ImageFormatKind,
    pub backend: StorageBackend,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            tiles: TileConfig::default(),
            format: ImageFormatKind::default(),
            backend: StorageBackend::default(),
        }
    }
}

/// HTTP front end settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub request_path: String,
    pub max_body_bytes: usize,
    /// Runtime worker threads; `None` means one per available core
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            request_path: DEFAULT_REQUEST_PATH.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            workers: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartasConfig {
    pub store: StoreConfig,
    pub server: ServerConfig,
}

impl ChartasConfig {
    /// Load a JSON config file; missing fields fall back to defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Overlay settings from `CHARTAS_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay settings from an arbitrary variable source
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("CHARTAS_WORKING_DIR") {
            self.store.working_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("CHARTAS_TILE_HEIGHT") {
            self.store.tiles.tile_height = parse_env("CHARTAS_TILE_HEIGHT", value)?;
        }
        if let Some(value) = lookup("CHARTAS_MAX_TILE_WIDTH") {
            self.store.tiles.max_tile_width = parse_env("CHARTAS_MAX_TILE_WIDTH", value)?;
        }
        if let Some(value) = lookup("CHARTAS_MAX_REGION_PIXELS") {
            self.store.tiles.max_region_pixels = parse_env("CHARTAS_MAX_REGION_PIXELS", value)?;
        }
        if let Some(value) = lookup("CHARTAS_FORMAT") {
            self.store.format = ImageFormatKind::parse(&value).ok_or(ConfigError::InvalidEnv {
                key: "CHARTAS_FORMAT",
                value,
            })?;
        }
        if let Some(value) = lookup("CHARTAS_STORAGE") {
            self.store.backend = match value.as_str() {
                "filesystem" | "fs" => StorageBackend::Filesystem,
                "memory" => StorageBackend::Memory,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: "CHARTAS_STORAGE",
                        value,
                    });
                }
            };
        }
        if let Some(value) = lookup("CHARTAS_PORT") {
            self.server.port = parse_env("CHARTAS_PORT", value)?;
        }
        if let Some(path) = lookup("CHARTAS_REQUEST_PATH") {
            self.server.request_path = path;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.tiles.validate()?;
        if !self.server.request_path.starts_with('/') {
            return Err(ConfigError::InvalidRequestPath(
                self.server.request_path.clone(),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::InvalidBodyLimit);
        }
        if self.server.workers == Some(0) {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
