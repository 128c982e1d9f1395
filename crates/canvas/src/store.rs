//! Canvas store - the public create / read / write / delete operations
//!
//! Each operation resolves the canvas in the registry, plans the affected
//! tiles with [`RegionPlan`], and touches tile storage only while holding
//! that canvas's lock: shared for reads, exclusive for writes and deletes.
//! Encoding and decoding happen outside the lock.

use chartas_config::{StorageBackend, StoreConfig, TileConfig};
use tracing::{debug, info, warn};

use crate::codec::{ImageCodec, RasterCodec};
use crate::error::{CanvasError, SetupError};
use crate::geometry::{Rect, RegionPlan};
use crate::raster::Raster;
use crate::registry::CanvasRegistry;
use crate::tiles::{FsTileStore, MemoryTileStore, TileStore};
use crate::types::{Canvas, CanvasId};

/// Tiled storage for large canvases
pub struct CanvasStore {
    registry: CanvasRegistry,
    tiles: Box<dyn TileStore>,
    codec: Box<dyn RasterCodec>,
    tile_config: TileConfig,
}

impl std::fmt::Debug for CanvasStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasStore")
            .field("registry", &self.registry)
            .field("tile_config", &self.tile_config)
            .finish_non_exhaustive()
    }
}

impl CanvasStore {
    /// Create a store over the given backends
    pub fn new<T, C>(tiles: T, codec: C, tile_config: TileConfig) -> Result<Self, SetupError>
    where
        T: TileStore + 'static,
        C: RasterCodec + 'static,
    {
        tile_config.validate()?;
        Ok(Self {
            registry: CanvasRegistry::new(),
            tiles: Box::new(tiles),
            codec: Box::new(codec),
            tile_config,
        })
    }

    /// Build the backend selected by `config`
    pub fn from_config(config: &StoreConfig) -> Result<Self, SetupError> {
        let codec = ImageCodec::new(config.format);
        match config.backend {
            StorageBackend::Filesystem => {
                let tiles = FsTileStore::new(&config.working_dir, config.format)?;
                Self::new(tiles, codec, config.tiles)
            }
            StorageBackend::Memory => Self::new(MemoryTileStore::new(), codec, config.tiles),
        }
    }

    pub fn registry(&self) -> &CanvasRegistry {
        &self.registry
    }

    pub fn tile_config(&self) -> TileConfig {
        self.tile_config
    }

    /// Metadata of a live canvas
    pub fn canvas(&self, id: CanvasId) -> Result<Canvas, CanvasError> {
        self.registry.lookup_live(id)
    }

    /// Create a blank `width` x `height` canvas and return its id
    pub fn create_image(&self, width: i64, height: i64) -> Result<CanvasId, CanvasError> {
        if width <= 0 || height <= 0 {
            return Err(CanvasError::region(format!(
                "canvas size must be positive, got {}x{}",
                width, height
            )));
        }
        let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(CanvasError::region(format!(
                "canvas size {}x{} is too large",
                width, height
            )));
        };

        let reservation = self.registry.allocate();
        let canvas = Canvas::new(reservation.id(), width, height, self.tile_config);

        if let Err(e) = self.materialize_tiles(&canvas) {
            if let Err(cleanup) = self.tiles.delete_all(canvas.id) {
                warn!("cleanup of canvas {} failed: {}", canvas.id, cleanup);
            }
            self.registry.abort(reservation);
            return Err(e);
        }

        self.registry.publish(reservation, canvas);
        info!(
            "created canvas {} ({}x{}, {} tiles, {} live)",
            canvas.id,
            width,
            height,
            canvas.tile_count,
            self.registry.live_count()
        );
        Ok(canvas.id)
    }

    fn materialize_tiles(&self, canvas: &Canvas) -> Result<(), CanvasError> {
        // Shared by every full-height tile; a canvas shorter than one tile never builds it
        let mut full: Option<Raster> = None;
        for index in 0..canvas.tile_count {
            let rows = canvas.tile_rows(index);
            if rows == canvas.tile_height {
                let blank = full.get_or_insert_with(|| Raster::new(canvas.tile_width, rows));
                self.tiles.save(canvas.id, index, blank)?;
            } else {
                self.tiles
                    .save(canvas.id, index, &Raster::new(canvas.tile_width, rows))?;
            }
        }
        Ok(())
    }

    /// Dimensions of a `w` x `h` region buffer, if it is within the configured pixel cap
    fn region_size(&self, w: i64, h: i64) -> Result<(u32, u32), CanvasError> {
        let (Ok(width), Ok(height)) = (u32::try_from(w), u32::try_from(h)) else {
            return Err(CanvasError::region(format!("invalid region size {}x{}", w, h)));
        };
        let limit = self.tile_config.max_region_pixels;
        let fits = (width as u64)
            .checked_mul(height as u64)
            .filter(|pixels| *pixels <= limit)
            .and_then(|pixels| pixels.checked_mul(3))
            .is_some_and(|bytes| isize::try_from(bytes).is_ok());
        if !fits {
            return Err(CanvasError::region(format!(
                "region {}x{} exceeds the {} pixel limit",
                w, h, limit
            )));
        }
        Ok((width, height))
    }

    /// Read a `w` x `h` region and return it encoded.
    ///
    /// The region may hang off any edge of the canvas; those pixels are
    /// [`crate::DEFAULT_FILL`]. Fails if no part of it is on the canvas or
    /// it covers more than `max_region_pixels`.
    pub fn get_sub_image(
        &self,
        id: CanvasId,
        x: i64,
        y: i64,
        w: i64,
        h: i64,
    ) -> Result<Vec<u8>, CanvasError> {
        let raster = self.read_region(id, x, y, w, h)?;
        Ok(self.codec.encode(&raster)?)
    }

    /// Unencoded form of [`Self::get_sub_image`]
    pub fn read_region(
        &self,
        id: CanvasId,
        x: i64,
        y: i64,
        w: i64,
        h: i64,
    ) -> Result<Raster, CanvasError> {
        let canvas = self.registry.lookup_live(id)?;
        let query = Rect::new(x, y, w, h);
        let (out_w, out_h) = self.region_size(w, h)?;
        let plan = RegionPlan::new(&canvas, query).ok_or_else(|| {
            CanvasError::region(format!("{:?} is outside canvas {}", query, id))
        })?;

        let mut output = Raster::new(out_w, out_h);
        {
            let _access = self.registry.acquire_shared(id)?;
            for slice in plan.slices() {
                let tile = self.tiles.load(id, slice.index)?;
                output.copy_region(&tile, slice.local, slice.output_x, slice.output_y);
            }
        }

        debug!(
            "read canvas {} region {:?} from {} tiles",
            id,
            query,
            plan.tile_count()
        );
        Ok(output)
    }

    /// Decode `bytes` and paint them over the region at (`x`, `y`).
    ///
    /// The decoded image must be exactly `w` x `h`. Parts falling outside
    /// the canvas are dropped; fails if nothing would land on the canvas.
    pub fn draw_image(
        &self,
        id: CanvasId,
        x: i64,
        y: i64,
        w: i64,
        h: i64,
        bytes: &[u8],
    ) -> Result<(), CanvasError> {
        self.registry.lookup_live(id)?;
        self.region_size(w, h)?;

        let source = self.codec.decode(bytes)?;
        if source.width() as i64 != w || source.height() as i64 != h {
            return Err(CanvasError::region(format!(
                "image is {}x{}, region is {}x{}",
                source.width(),
                source.height(),
                w,
                h
            )));
        }

        self.write_region(id, x, y, &source)
    }

    /// Unencoded form of [`Self::draw_image`]
    pub fn write_region(
        &self,
        id: CanvasId,
        x: i64,
        y: i64,
        source: &Raster,
    ) -> Result<(), CanvasError> {
        let canvas = self.registry.lookup_live(id)?;
        self.region_size(source.width() as i64, source.height() as i64)?;
        let target = Rect::new(x, y, source.width() as i64, source.height() as i64);
        let plan = RegionPlan::new(&canvas, target).ok_or_else(|| {
            CanvasError::region(format!("{:?} does not overlap canvas {}", target, id))
        })?;

        let access = self.registry.acquire_exclusive(id)?;
        let mut written = 0;
        for slice in plan.slices() {
            let mut tile = self.tiles.load(id, slice.index)?;
            let from = Rect::new(
                slice.output_x,
                slice.output_y,
                slice.local.width,
                slice.local.height,
            );
            if tile.copy_region(source, from, slice.local.x, slice.local.y) {
                self.tiles.save(id, slice.index, &tile)?;
                written += 1;
            }
        }
        drop(access);

        debug!("drew {:?} onto canvas {} ({} tiles)", target, id, written);
        Ok(())
    }

    /// Delete a canvas and all its tiles. The id is never reused.
    pub fn delete_image(&self, id: CanvasId) -> Result<(), CanvasError> {
        let access = self.registry.acquire_exclusive(id)?;
        self.tiles.delete_all(id)?;
        self.registry.tombstone(access);

        info!("deleted canvas {} ({} live)", id, self.registry.live_count());
        Ok(())
    }
}
