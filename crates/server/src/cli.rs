//! Command line parsing and configuration layering

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chartas_config::{ChartasConfig, ImageFormatKind, StorageBackend};
use clap::Parser;

/// Tiled storage server for very large images
#[derive(Parser, Debug)]
#[command(name = "chartas", version, about)]
pub struct Cli {
    /// Directory holding canvas tiles
    pub working_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Height of each tile in pixels
    #[arg(long)]
    pub tile_height: Option<u32>,

    /// Cap on tile width in pixels
    #[arg(long)]
    pub max_tile_width: Option<u32>,

    /// Largest width * height one read or write may cover
    #[arg(long)]
    pub max_region_pixels: Option<u64>,

    /// Tile and response image format (bmp, png)
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ImageFormatKind>,

    /// Keep tiles in memory instead of on disk
    #[arg(long)]
    pub memory: bool,

    /// Runtime worker threads (default: one per core)
    #[arg(long)]
    pub workers: Option<usize>,
}

fn parse_format(name: &str) -> Result<ImageFormatKind, String> {
    ImageFormatKind::parse(name).ok_or_else(|| format!("unknown format '{}', expected bmp or png", name))
}

impl Cli {
    /// Defaults, then config file, then `CHARTAS_*` env, then flags
    pub fn resolve(&self) -> Result<ChartasConfig> {
        let mut config = match &self.config {
            Some(path) => ChartasConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ChartasConfig::default(),
        };
        config.apply_env()?;
        self.apply_to(&mut config);
        config.validate().map_err(|e| anyhow!("invalid configuration: {}", e))?;
        Ok(config)
    }

    fn apply_to(&self, config: &mut ChartasConfig) {
        if let Some(dir) = &self.working_dir {
            config.store.working_dir = dir.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(height) = self.tile_height {
            config.store.tiles.tile_height = height;
        }
        if let Some(width) = self.max_tile_width {
            config.store.tiles.max_tile_width = width;
        }
        if let Some(limit) = self.max_region_pixels {
            config.store.tiles.max_region_pixels = limit;
        }
        if let Some(format) = self.format {
            config.store.format = format;
        }
        if self.memory {
            config.store.backend = StorageBackend::Memory;
        }
        if self.workers.is_some() {
            config.server.workers = self.workers;
        }
    }
}
