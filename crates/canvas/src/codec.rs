//! Pixel codec: raster buffers <-> encoded image bytes

use std::io::Cursor;

use chartas_config::ImageFormatKind;
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::error::CodecError;
use crate::raster::Raster;

/// Trait for converting between rasters and an encoded byte stream
pub trait RasterCodec: Send + Sync {
    /// Encode a raster into the codec's output format
    fn encode(&self, raster: &Raster) -> Result<Vec<u8>, CodecError>;

    /// Decode image bytes into an RGB raster
    fn decode(&self, bytes: &[u8]) -> Result<Raster, CodecError>;
}

/// Codec backed by the `image` crate
///
/// Encodes in a fixed format; decoding sniffs the container format so any
/// format the `image` crate understands is accepted.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    format: ImageFormat,
}

impl ImageCodec {
    pub fn new(kind: ImageFormatKind) -> Self {
        let format = match kind {
            ImageFormatKind::Bmp => ImageFormat::Bmp,
            ImageFormatKind::Png => ImageFormat::Png,
        };
        Self { format }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(ImageFormatKind::default())
    }
}

impl RasterCodec for ImageCodec {
    fn encode(&self, raster: &Raster) -> Result<Vec<u8>, CodecError> {
        let buffer = RgbImage::from_raw(raster.width(), raster.height(), raster.as_bytes().to_vec())
            .ok_or(CodecError::BufferSize {
                width: raster.width(),
                height: raster.height(),
            })?;

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), self.format)
            .map_err(CodecError::Encode)?;
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Raster, CodecError> {
        let img = image::load_from_memory(bytes)
            .map_err(CodecError::Decode)?
            .to_rgb8();
        let (width, height) = img.dimensions();
        Raster::from_rgb_bytes(width, height, img.as_raw())
            .ok_or(CodecError::BufferSize { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Raster {
        let mut raster = Raster::new(3, 2);
        raster.set_pixel(0, 0, [255, 0, 0]);
        raster.set_pixel(2, 1, [10, 20, 30]);
        raster
    }

    #[test]
    fn test_bmp_preserves_pixels() {
        let codec = ImageCodec::new(ImageFormatKind::Bmp);
        let bytes = codec.encode(&sample()).unwrap();
        assert_eq!(&bytes[..2], b"BM");
        assert_eq!(codec.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_decode_sniffs_format() {
        let png = ImageCodec::new(ImageFormatKind::Png).encode(&sample()).unwrap();
        let bmp_codec = ImageCodec::new(ImageFormatKind::Bmp);
        assert_eq!(bmp_codec.decode(&png).unwrap(), sample());
    }

    #[test]
    fn test_decode_garbage() {
        let codec = ImageCodec::default();
        assert!(matches!(
            codec.decode(b"definitely not an image"),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let codec = ImageCodec::default();
        assert_eq!(codec.encode(&sample()).unwrap(), codec.encode(&sample()).unwrap());
    }
}
