use chartas_config::TileConfig;

/// Canvas identifier. Allocated in increasing order, never reused.
pub type CanvasId = u64;

/// One RGB pixel
pub type Pixel = [u8; 3];

/// Immutable metadata of a live canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub id: CanvasId,
    /// Logical width in pixels
    pub width: u32,
    /// Logical height in pixels
    pub height: u32,
    /// Height of every tile but the last
    pub tile_height: u32,
    /// `min(width, max_tile_width)`; columns past this are not stored
    pub tile_width: u32,
    /// `ceil(height / tile_height)`
    pub tile_count: u32,
}

impl Canvas {
    /// Derive the tile layout of a `width` x `height` canvas.
    /// Dimensions must be positive and `tiles` validated.
    pub fn new(id: CanvasId, width: u32, height: u32, tiles: TileConfig) -> Self {
        Self {
            id,
            width,
            height,
            tile_height: tiles.tile_height,
            tile_width: width.min(tiles.max_tile_width),
            tile_count: height.div_ceil(tiles.tile_height),
        }
    }

    /// Height of tile `index`; the last tile may be shorter than `tile_height`
    pub fn tile_rows(&self, index: u32) -> u32 {
        let top = index as u64 * self.tile_height as u64;
        (self.height as u64).saturating_sub(top).min(self.tile_height as u64) as u32
    }

    /// Canvas row at which tile `index` starts
    #[inline]
    pub fn tile_top(&self, index: u32) -> i64 {
        index as i64 * self.tile_height as i64
    }

    /// Canvas width and height as signed coordinates
    #[inline]
    pub fn extent(&self) -> (i64, i64) {
        (self.width as i64, self.height as i64)
    }
}
