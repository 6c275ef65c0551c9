//! Image encoding.

use super::options::{ConvertOptions, OutputFormat};
use crate::error::ConvertError;
use image::codecs::avif::AvifEncoder;
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageError};
use std::io::Cursor;

/// AVIF encoder speed (1 = slowest/best, 10 = fastest)
const AVIF_SPEED: u8 = 6;

/// Turns a decoded image into encoded bytes.
///
/// Implement this trait to plug in a different encoder (e.g., for testing).
pub trait Codec: Send + Sync {
    fn encode(&self, image: &DynamicImage, options: &ConvertOptions)
        -> Result<Vec<u8>, ConvertError>;
}

/// Encoder backed by the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for ImageCodec {
    fn encode(
        &self,
        image: &DynamicImage,
        options: &ConvertOptions,
    ) -> Result<Vec<u8>, ConvertError> {
        let format = options.format;
        let mut bytes = Vec::new();

        let result = match format {
            OutputFormat::Png => image.write_with_encoder(PngEncoder::new_with_quality(
                &mut bytes,
                png_compression(options.png_level),
                FilterType::Adaptive,
            )),
            // JPEG has no alpha channel
            OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(
                JpegEncoder::new_with_quality(&mut bytes, options.effective_quality()),
            ),
            OutputFormat::WebP => {
                to_8bit(image).write_with_encoder(WebPEncoder::new_lossless(&mut bytes))
            }
            OutputFormat::Avif => DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(
                AvifEncoder::new_with_speed_quality(
                    &mut bytes,
                    AVIF_SPEED,
                    options.effective_quality(),
                ),
            ),
            OutputFormat::Bmp => to_8bit(image).write_with_encoder(BmpEncoder::new(&mut bytes)),
            OutputFormat::Tiff => {
                let mut cursor = Cursor::new(Vec::new());
                let written = image.write_with_encoder(TiffEncoder::new(&mut cursor));
                bytes = cursor.into_inner();
                written
            }
        };

        result.map_err(|source: ImageError| ConvertError::Encode {
            format: format.to_string(),
            source,
        })?;

        Ok(bytes)
    }
}

/// Map a zlib level (0-9) onto the encoder's presets.
fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// 8-bit RGB or RGBA, whichever keeps the alpha channel.
fn to_8bit(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient() -> DynamicImage {
        let image = RgbImage::from_fn(16, 12, |x, y| Rgb([(x * 16) as u8, (y * 20) as u8, 128]));
        DynamicImage::ImageRgb8(image)
    }

    #[test]
    fn encodes_every_format_to_decodable_bytes() {
        let codec = ImageCodec::new();
        let cases = [
            (OutputFormat::Png, ImageFormat::Png),
            (OutputFormat::Jpeg, ImageFormat::Jpeg),
            (OutputFormat::WebP, ImageFormat::WebP),
            (OutputFormat::Bmp, ImageFormat::Bmp),
            (OutputFormat::Tiff, ImageFormat::Tiff),
        ];

        for (format, expected) in cases {
            let bytes = codec
                .encode(&gradient(), &ConvertOptions::new(format))
                .unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), expected, "{}", format);

            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (16, 12));
        }
    }

    #[test]
    fn encodes_avif() {
        let bytes = ImageCodec::new()
            .encode(&gradient(), &ConvertOptions::new(OutputFormat::Avif))
            .unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn jpeg_drops_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 40])));
        let bytes = ImageCodec::new()
            .encode(&image, &ConvertOptions::new(OutputFormat::Jpeg))
            .unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn lower_jpeg_quality_gives_smaller_output() {
        let noisy = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([((x * 37 + y * 11) % 256) as u8, ((x * y) % 256) as u8, ((x ^ y) * 7 % 256) as u8])
        }));
        let codec = ImageCodec::new();
        let low = codec
            .encode(&noisy, &ConvertOptions::new(OutputFormat::Jpeg).with_quality(10))
            .unwrap();
        let high = codec
            .encode(&noisy, &ConvertOptions::new(OutputFormat::Jpeg).with_quality(100))
            .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn png_level_maps_to_presets() {
        assert!(matches!(png_compression(0), CompressionType::Fast));
        assert!(matches!(png_compression(6), CompressionType::Default));
        assert!(matches!(png_compression(9), CompressionType::Best));
    }
}
