//! Mapping between logical canvas rectangles and horizontal tiles
//!
//! Everything here is pure integer interval math. The same [`RegionPlan`]
//! drives both directions: reads copy tile -> output buffer, writes copy
//! source raster -> tile.

use crate::types::Canvas;

/// A rectangle in signed pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Exclusive right edge, saturating at `i64::MAX`
    #[inline]
    pub fn right(&self) -> i64 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `i64::MAX`
    #[inline]
    pub fn bottom(&self) -> i64 {
        self.y.saturating_add(self.height)
    }
}

/// Intersect `query` with `[0, width) x [0, height)`
/// Returns None when the intersection is empty
///
/// Accepts any coordinates; clipping saturates instead of overflowing.
pub fn visible_rect(width: i64, height: i64, query: Rect) -> Option<Rect> {
    let x = query.x.max(0);
    let y = query.y.max(0);
    let visible = Rect {
        x,
        y,
        width: (width - x).min(query.width.saturating_sub(x.saturating_sub(query.x))),
        height: (height - y).min(query.height.saturating_sub(y.saturating_sub(query.y))),
    };
    (!visible.is_empty()).then_some(visible)
}

/// Where the visible part of `query` starts inside a `query`-sized buffer
#[inline]
pub fn output_offset(query: Rect) -> (i64, i64) {
    (query.x.saturating_neg().max(0), query.y.saturating_neg().max(0))
}

/// The part of a region that falls into one tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSlice {
    pub index: u32,
    /// Rectangle in the tile's own coordinates
    pub local: Rect,
    /// Top-left of the same pixels inside the region-sized buffer
    pub output_x: i64,
    pub output_y: i64,
}

/// Which tiles a region touches and how it is cut across them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionPlan {
    pub query: Rect,
    pub visible: Rect,
    pub offset: (i64, i64),
    pub first_tile: u32,
    /// Inclusive
    pub last_tile: u32,
    tile_height: u32,
}

impl RegionPlan {
    /// Plan access to `query` on `canvas`
    /// Returns None if the region does not overlap the canvas
    pub fn new(canvas: &Canvas, query: Rect) -> Option<Self> {
        let (width, height) = canvas.extent();
        let visible = visible_rect(width, height, query)?;
        let tile_height = canvas.tile_height as i64;

        Some(Self {
            query,
            visible,
            offset: output_offset(query),
            first_tile: (visible.y / tile_height) as u32,
            last_tile: ((visible.bottom() - 1) / tile_height) as u32,
            tile_height: canvas.tile_height,
        })
    }

    /// Number of tiles in the span
    #[inline]
    pub fn tile_count(&self) -> u32 {
        self.last_tile - self.first_tile + 1
    }

    /// Per-tile pieces of the visible rectangle, top to bottom
    pub fn slices(&self) -> impl Iterator<Item = TileSlice> + '_ {
        let tile_height = self.tile_height as i64;
        let top = self.visible.y;
        let bottom = self.visible.bottom();

        (self.first_tile..=self.last_tile).scan(self.offset.1, move |output_y, index| {
            let tile_top = index as i64 * tile_height;
            let start = top.max(tile_top);
            let end = bottom.min(tile_top + tile_height);

            let slice = TileSlice {
                index,
                local: Rect::new(self.visible.x, start - tile_top, self.visible.width, end - start),
                output_x: self.offset.0,
                output_y: *output_y,
            };
            *output_y += end - start;
            Some(slice)
        })
    }
}
