//! Chartas canvas store - tiled storage for very large raster images
//!
//! A canvas is split into full-width horizontal tiles that are persisted
//! independently. This crate provides:
//! - [`store::CanvasStore`] - create / read region / write region / delete
//! - [`geometry`] - Mapping of logical rectangles onto tiles
//! - [`registry`] - Id allocation, tombstones, and per-canvas locks
//! - [`tiles`] - Tile persistence backends (filesystem, memory)
//! - [`codec`] - Raster <-> encoded image bytes
//! - [`raster`] - CPU 8-bit RGB raster buffer

pub mod codec;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod registry;
pub mod store;
pub mod tiles;
pub mod types;

pub use codec::*;
pub use constants::*;
pub use error::*;
pub use geometry::*;
pub use raster::*;
pub use registry::*;
pub use store::*;
pub use tiles::*;
pub use types::*;
