//! Image encoding shared by the resizer and the PDF rasteriser.
//!
//! JPEG has no alpha channel, so RGBA and palette images are flattened to RGB
//! before encoding; writing RGBA straight into the JPEG encoder is an error in
//! the `image` crate.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageError, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Output encodings the toolbox can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
    WebP,
}

impl OutputFormat {
    /// Map an `image` crate format to an output encoding, if supported.
    pub fn from_image_format(format: ImageFormat, jpeg_quality: u8) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg {
                quality: jpeg_quality,
            }),
            ImageFormat::WebP => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    /// Upper-case format name, e.g. `JPEG`.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg { .. } => "JPEG",
            OutputFormat::WebP => "WEBP",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg { .. } => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }
}

/// Encode `img` into a byte buffer in the requested format.
pub fn encode_image(img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Png => {
            img.write_with_encoder(PngEncoder::new(Cursor::new(&mut buf)))?;
        }
        OutputFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(
                Cursor::new(&mut buf),
                quality,
            ))?;
        }
        OutputFormat::WebP => {
            // The pure-Rust WebP encoder is lossless and takes 8-bit RGB(A).
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(Cursor::new(&mut buf)))?;
        }
    }
    debug!(
        "Encoded {}x{} image as {} → {} bytes",
        img.width(),
        img.height(),
        format.name(),
        buf.len()
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red_square() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 128])))
    }

    #[test]
    fn png_round_trips_dimensions() {
        let bytes = encode_image(&red_square(), OutputFormat::Png).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let back = image::load_from_memory(&bytes).unwrap();
        assert_eq!((back.width(), back.height()), (8, 8));
    }

    #[test]
    fn jpeg_drops_alpha() {
        let bytes = encode_image(&red_square(), OutputFormat::Jpeg { quality: 90 }).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let back = image::load_from_memory(&bytes).unwrap();
        assert!(!back.color().has_alpha());
    }

    #[test]
    fn webp_is_encoded() {
        let bytes = encode_image(&red_square(), OutputFormat::WebP).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn unsupported_formats_are_rejected() {
        assert_eq!(OutputFormat::from_image_format(ImageFormat::Gif, 90), None);
        assert_eq!(
            OutputFormat::from_image_format(ImageFormat::Jpeg, 90),
            Some(OutputFormat::Jpeg { quality: 90 })
        );
    }
}
