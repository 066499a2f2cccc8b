//! Batch image resizing with Lanczos3 resampling.

use crate::archive::{dedupe_names, zip_entries, ArchiveEntry};
use crate::error::{FilekitError, ItemError};
use crate::imaging::encode::{encode_image, OutputFormat};
use crate::progress::ProgressCallback;
use image::imageops::FilterType;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// JPEG quality used for resized output.
pub const RESIZE_JPEG_QUALITY: u8 = 90;

/// Name of the archive produced by [`BatchResize::into_archive`].
pub const BATCH_ARCHIVE_NAME: &str = "resized_images.zip";

/// How the target size is derived from the source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeMode {
    /// Scale both sides to this percentage.
    Percent(u32),
    /// Fix the width in pixels, keep the aspect ratio.
    Width(u32),
    /// Fix the height in pixels, keep the aspect ratio.
    Height(u32),
}

/// Target dimensions for a `width`×`height` source.
///
/// Fractional results are truncated, then clamped to at least 1 px so an
/// extreme ratio never produces an empty image.
pub fn new_dimensions(width: u32, height: u32, mode: ResizeMode) -> (u32, u32) {
    let (w, h) = match mode {
        ResizeMode::Percent(p) => {
            let f = p as f64 / 100.0;
            ((width as f64 * f) as u32, (height as f64 * f) as u32)
        }
        ResizeMode::Width(target) => {
            let ratio = target as f64 / width.max(1) as f64;
            (target, (height as f64 * ratio) as u32)
        }
        ResizeMode::Height(target) => {
            let ratio = target as f64 / height.max(1) as f64;
            ((width as f64 * ratio) as u32, target)
        }
    };
    (w.max(1), h.max(1))
}

/// One resized image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizedImage {
    /// Original file name, reused for the output.
    pub name: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl ResizedImage {
    /// Dimensions as `WxH`.
    pub fn dimensions_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Output of [`resize_batch`]: successes and per-file failures.
#[derive(Debug, Default)]
pub struct BatchResize {
    pub images: Vec<ResizedImage>,
    pub errors: Vec<ItemError>,
}

/// A batch ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeDownload {
    /// Exactly one image succeeded.
    Single(ResizedImage),
    /// Several images, zipped under [`BATCH_ARCHIVE_NAME`].
    Archive { name: String, bytes: Vec<u8> },
}

impl BatchResize {
    /// Bundle the successful images: the image itself when there is one,
    /// a ZIP archive when there are several, `None` when all failed.
    pub fn into_archive(mut self) -> Result<Option<ResizeDownload>, FilekitError> {
        match self.images.len() {
            0 => Ok(None),
            1 => Ok(self.images.pop().map(ResizeDownload::Single)),
            _ => {
                let mut entries: Vec<ArchiveEntry> = self
                    .images
                    .into_iter()
                    .map(|img| ArchiveEntry::new(img.name, img.bytes))
                    .collect();
                dedupe_names(&mut entries);
                let bytes = zip_entries(&entries)?;
                Ok(Some(ResizeDownload::Archive {
                    name: BATCH_ARCHIVE_NAME.to_string(),
                    bytes,
                }))
            }
        }
    }
}

/// Pick the output encoding for `name`: the extension first, then the
/// content, then JPEG.
fn detect_format(name: &str, bytes: &[u8]) -> Result<OutputFormat, FilekitError> {
    let from_ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension);

    match from_ext.or_else(|| image::guess_format(bytes).ok()) {
        Some(format) => OutputFormat::from_image_format(format, RESIZE_JPEG_QUALITY).ok_or_else(
            || FilekitError::UnsupportedImageFormat {
                name: name.to_string(),
                format: format!("{format:?}"),
            },
        ),
        None => Ok(OutputFormat::Jpeg {
            quality: RESIZE_JPEG_QUALITY,
        }),
    }
}

/// Decode, resize and re-encode one image in its own format.
pub fn resize_image(
    name: &str,
    bytes: &[u8],
    mode: ResizeMode,
) -> Result<ResizedImage, FilekitError> {
    let format = detect_format(name, bytes)?;
    let img = image::load_from_memory(bytes).map_err(|e| FilekitError::ImageFailed {
        name: name.to_string(),
        detail: e.to_string(),
    })?;

    let (width, height) = new_dimensions(img.width(), img.height(), mode);
    debug!(
        "Resizing '{}' {}x{} → {}x{}",
        name,
        img.width(),
        img.height(),
        width,
        height
    );
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);

    let out = encode_image(&resized, format).map_err(|e| FilekitError::ImageFailed {
        name: name.to_string(),
        detail: e.to_string(),
    })?;

    Ok(ResizedImage {
        name: name.to_string(),
        bytes: out,
        width,
        height,
        format,
    })
}

/// Resize every `(name, bytes)` input. Failures are collected, not fatal.
pub fn resize_batch(
    inputs: Vec<(String, Vec<u8>)>,
    mode: ResizeMode,
    progress: Option<ProgressCallback>,
) -> BatchResize {
    let total = inputs.len();
    let mut batch = BatchResize::default();

    if let Some(ref cb) = progress {
        cb.on_batch_start(total);
    }

    for (i, (name, bytes)) in inputs.into_iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = progress {
            cb.on_item_start(index, total, &name);
        }
        match resize_image(&name, &bytes, mode) {
            Ok(img) => {
                if let Some(ref cb) = progress {
                    cb.on_item_complete(index, total, &name);
                }
                batch.images.push(img);
            }
            Err(e) => {
                warn!("Skipping '{}': {}", name, e);
                if let Some(ref cb) = progress {
                    cb.on_item_error(index, total, &e.to_string());
                }
                batch.errors.push(ItemError::from_error(&name, e));
            }
        }
    }

    if let Some(ref cb) = progress {
        cb.on_batch_complete(total, batch.images.len());
    }
    info!(
        "Resized {}/{} images ({} failed)",
        batch.images.len(),
        total,
        batch.errors.len()
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([0, 128, 255, 255])));
        encode_image(&img, OutputFormat::Png).unwrap()
    }

    #[test]
    fn percent_halves_both_sides() {
        assert_eq!(new_dimensions(800, 600, ResizeMode::Percent(50)), (400, 300));
    }

    #[test]
    fn width_keeps_aspect_ratio_truncated() {
        assert_eq!(new_dimensions(1000, 333, ResizeMode::Width(500)), (500, 166));
    }

    #[test]
    fn height_keeps_aspect_ratio() {
        assert_eq!(new_dimensions(1920, 1080, ResizeMode::Height(540)), (960, 540));
    }

    #[test]
    fn dimensions_never_collapse_to_zero() {
        assert_eq!(new_dimensions(10, 1000, ResizeMode::Width(1)), (1, 100));
        assert_eq!(new_dimensions(3, 3, ResizeMode::Percent(1)), (1, 1));
    }

    #[test]
    fn dimensions_at_the_extremes() {
        // Float-to-int casts saturate instead of wrapping.
        assert_eq!(
            new_dimensions(u32::MAX, u32::MAX, ResizeMode::Percent(200)),
            (u32::MAX, u32::MAX)
        );
        assert_eq!(new_dimensions(1, 1, ResizeMode::Percent(200)), (2, 2));
        assert_eq!(new_dimensions(1, 1, ResizeMode::Percent(1)), (1, 1));
        assert_eq!(new_dimensions(0, 0, ResizeMode::Width(10)), (10, 1));
        assert_eq!(new_dimensions(1, 5000, ResizeMode::Height(1)), (1, 1));
        assert_eq!(new_dimensions(2, 1, ResizeMode::Width(u32::MAX)).0, u32::MAX);
    }

    #[test]
    fn resize_png_keeps_format() {
        let out = resize_image("icon.png", &png_bytes(40, 20), ResizeMode::Percent(50)).unwrap();
        assert_eq!((out.width, out.height), (20, 10));
        assert_eq!(out.format, OutputFormat::Png);
        assert_eq!(out.dimensions_label(), "20x10");
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn jpg_extension_becomes_jpeg() {
        let out = resize_image("photo.JPG", &png_bytes(10, 10), ResizeMode::Width(5)).unwrap();
        assert_eq!(
            out.format,
            OutputFormat::Jpeg {
                quality: RESIZE_JPEG_QUALITY
            }
        );
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn unknown_extension_falls_back_to_content() {
        let out = resize_image("upload.bin", &png_bytes(4, 4), ResizeMode::Percent(200)).unwrap();
        assert_eq!(out.format, OutputFormat::Png);
        assert_eq!((out.width, out.height), (8, 8));
    }

    #[test]
    fn gif_is_unsupported() {
        let err = resize_image("anim.gif", &png_bytes(4, 4), ResizeMode::Percent(50)).unwrap_err();
        assert!(matches!(err, FilekitError::UnsupportedImageFormat { .. }));
    }

    #[test]
    fn batch_records_failures_and_continues() {
        let inputs = vec![
            ("a.png".to_string(), png_bytes(10, 10)),
            ("broken.png".to_string(), b"not an image".to_vec()),
            ("b.png".to_string(), png_bytes(20, 10)),
        ];
        let batch = resize_batch(inputs, ResizeMode::Percent(50), None);
        assert_eq!(batch.images.len(), 2);
        assert_eq!(batch.errors.len(), 1);

        match batch.into_archive().unwrap() {
            Some(ResizeDownload::Archive { name, bytes }) => {
                assert_eq!(name, BATCH_ARCHIVE_NAME);
                assert!(bytes.starts_with(b"PK"));
            }
            other => panic!("expected archive, got {other:?}"),
        }
    }

    #[test]
    fn same_named_inputs_get_distinct_entries() {
        let inputs = vec![
            ("x.png".to_string(), png_bytes(10, 10)),
            ("x.png".to_string(), png_bytes(20, 20)),
        ];
        let batch = resize_batch(inputs, ResizeMode::Percent(50), None);
        assert!(batch.errors.is_empty());

        let Some(ResizeDownload::Archive { bytes, .. }) = batch.into_archive().unwrap() else {
            panic!("expected an archive");
        };
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["x.png", "x_2.png"]);
    }

    #[test]
    fn single_success_is_not_zipped() {
        let batch = resize_batch(
            vec![("only.png".to_string(), png_bytes(6, 6))],
            ResizeMode::Percent(50),
            None,
        );
        assert!(matches!(
            batch.into_archive().unwrap(),
            Some(ResizeDownload::Single(_))
        ));
    }

    #[test]
    fn all_failed_yields_nothing() {
        let batch = resize_batch(
            vec![("x.png".to_string(), vec![0, 1, 2])],
            ResizeMode::Percent(50),
            None,
        );
        assert!(batch.into_archive().unwrap().is_none());
    }
}
