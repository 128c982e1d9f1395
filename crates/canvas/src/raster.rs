//! CPU raster buffer - 8-bit RGB storage for tiles and sub-images

use crate::constants::DEFAULT_FILL;
use crate::geometry::Rect;
use crate::types::Pixel;

/// An 8-bit RGB raster
/// Stores pixels as [u8; 3] in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl Raster {
    /// Create a new raster with the given dimensions, filled with [`DEFAULT_FILL`]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, DEFAULT_FILL)
    }

    /// Create a new raster with every pixel set to `pixel`
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![pixel; pixel_count],
        }
    }

    /// Wrap packed RGB bytes (3 per pixel, row-major)
    /// Returns None if the byte count does not match the dimensions
    pub fn from_rgb_bytes(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 3;
        if bytes.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: bytemuck::cast_slice::<u8, Pixel>(bytes).to_vec(),
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Get a pixel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Set a pixel at the given coordinates
    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        self.pixels[index] = pixel;
    }

    /// Packed RGB bytes, suitable for handing to an encoder
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Copy `src_rect` of `src` so that its top-left corner lands at
    /// (`dst_x`, `dst_y`) in `self`.
    ///
    /// Both rectangles are clipped: pixels outside `src`, outside `src_rect`,
    /// or landing outside `self` are skipped. Returns true if anything was
    /// written.
    pub fn copy_region(&mut self, src: &Raster, src_rect: Rect, dst_x: i64, dst_y: i64) -> bool {
        let col_start = 0i64
            .max(src_rect.x.saturating_neg())
            .max(dst_x.saturating_neg());
        let col_end = src_rect
            .width
            .min((src.width as i64).saturating_sub(src_rect.x))
            .min((self.width as i64).saturating_sub(dst_x));
        let row_start = 0i64
            .max(src_rect.y.saturating_neg())
            .max(dst_y.saturating_neg());
        let row_end = src_rect
            .height
            .min((src.height as i64).saturating_sub(src_rect.y))
            .min((self.height as i64).saturating_sub(dst_y));

        if col_start >= col_end || row_start >= row_end {
            return false;
        }

        let len = (col_end - col_start) as usize;
        for row in row_start..row_end {
            let s = src.index((src_rect.x + col_start) as u32, (src_rect.y + row) as u32);
            let d = self.index((dst_x + col_start) as u32, (dst_y + row) as u32);
            self.pixels[d..d + len].copy_from_slice(&src.pixels[s..s + len]);
        }
        true
    }

    /// Composite all of `src` with its top-left corner at (`x`, `y`)
    pub fn draw(&mut self, src: &Raster, x: i64, y: i64) -> bool {
        self.copy_region(src, src.bounds(), x, y)
    }

    /// The full extent of this raster as a rectangle
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i64, self.height as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Pixel = [255, 0, 0];
    const BLUE: Pixel = [0, 0, 255];

    #[test]
    fn test_new_raster() {
        let raster = Raster::new(100, 50);
        assert_eq!(raster.width(), 100);
        assert_eq!(raster.height(), 50);
        assert_eq!(raster.pixels().len(), 5000);
        assert!(raster.pixels().iter().all(|p| *p == DEFAULT_FILL));
    }

    #[test]
    fn test_get_set_pixel() {
        let mut raster = Raster::new(10, 10);
        raster.set_pixel(5, 5, RED);
        assert_eq!(raster.get_pixel(5, 5), Some(RED));

        // Out of bounds should return None and writes are ignored
        raster.set_pixel(10, 0, RED);
        assert_eq!(raster.get_pixel(10, 0), None);
    }

    #[test]
    fn test_from_rgb_bytes() {
        let bytes = [1, 2, 3, 4, 5, 6];
        let raster = Raster::from_rgb_bytes(2, 1, &bytes).unwrap();
        assert_eq!(raster.get_pixel(1, 0), Some([4, 5, 6]));
        assert_eq!(raster.as_bytes(), &bytes);

        assert!(Raster::from_rgb_bytes(2, 2, &bytes).is_none());
    }

    #[test]
    fn test_draw_clips_negative_origin() {
        let mut target = Raster::new(4, 4);
        let src = Raster::filled(3, 2, RED);

        assert!(target.draw(&src, -1, -1));

        // Only the bottom-right 2x1 of the source lands on the target
        assert_eq!(target.get_pixel(0, 0), Some(RED));
        assert_eq!(target.get_pixel(1, 0), Some(RED));
        assert_eq!(target.get_pixel(2, 0), Some(DEFAULT_FILL));
        assert_eq!(target.get_pixel(0, 1), Some(DEFAULT_FILL));
    }

    #[test]
    fn test_draw_clips_far_edge() {
        let mut target = Raster::new(4, 4);
        let src = Raster::filled(3, 3, BLUE);

        assert!(target.draw(&src, 2, 3));
        assert_eq!(target.get_pixel(2, 3), Some(BLUE));
        assert_eq!(target.get_pixel(3, 3), Some(BLUE));
        assert_eq!(target.get_pixel(2, 2), Some(DEFAULT_FILL));
    }

    #[test]
    fn test_draw_disjoint_is_noop() {
        let mut target = Raster::new(4, 4);
        let src = Raster::filled(2, 2, RED);

        assert!(!target.draw(&src, 4, 0));
        assert!(!target.draw(&src, -2, 0));
        assert!(!target.draw(&src, 0, 10));
        assert!(!target.draw(&src, i64::MIN, i64::MIN));
        assert!(!target.draw(&src, i64::MAX, 0));
        assert_eq!(target, Raster::new(4, 4));
    }

    #[test]
    fn test_copy_region_offsets() {
        let mut src = Raster::new(5, 5);
        src.set_pixel(3, 4, RED);

        let mut out = Raster::new(3, 3);
        assert!(out.copy_region(&src, Rect::new(2, 3, 2, 2), 1, 1));

        // src (3, 4) is (1, 1) inside the region, shifted by (1, 1)
        assert_eq!(out.get_pixel(2, 2), Some(RED));
        assert_eq!(out.get_pixel(1, 1), Some(DEFAULT_FILL));
    }

    #[test]
    fn test_copy_region_past_source_edge() {
        let src = Raster::filled(2, 2, RED);
        let mut out = Raster::new(4, 4);

        // Region asks for 4x4 but the source only has 2x2
        assert!(out.copy_region(&src, Rect::new(0, 0, 4, 4), 0, 0));
        assert_eq!(out.get_pixel(1, 1), Some(RED));
        assert_eq!(out.get_pixel(2, 2), Some(DEFAULT_FILL));
    }

    #[test]
    fn test_as_bytes() {
        let raster = Raster::new(2, 2);
        // 4 pixels * 3 channels
        assert_eq!(raster.as_bytes().len(), 12);
    }
}
