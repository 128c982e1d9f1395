use crate::types::Pixel;

pub use chartas_config::{DEFAULT_MAX_REGION_PIXELS, DEFAULT_MAX_TILE_WIDTH, DEFAULT_TILE_HEIGHT};

/// Value of every pixel in a freshly created canvas and of every
/// out-of-canvas pixel in a sub-image.
pub const DEFAULT_FILL: Pixel = [0, 0, 0];
