//! PDF rasterisation and metadata extraction.
//!
//! Pages are rendered at `dpi / 72` scale: PDF user space is defined in
//! points (1/72 inch), so a scale factor of 1.0 is 72 DPI.

use crate::archive::{numbered_name, zip_entries, ArchiveEntry};
use crate::config::{RasterConfig, RasterFormat};
use crate::error::FilekitError;
use crate::imaging::encode::{encode_image, OutputFormat};
use crate::pdf::engine::{self, PdfInput};
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of rendering a PDF to images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterOutput {
    /// The document had one page: the image itself.
    Single {
        bytes: Vec<u8>,
        format: RasterFormat,
    },
    /// Several pages: a ZIP with one `page_NNN.{ext}` entry per page.
    Archive { bytes: Vec<u8>, pages: usize },
}

impl RasterOutput {
    /// Number of pages rendered.
    pub fn page_count(&self) -> usize {
        match self {
            RasterOutput::Single { .. } => 1,
            RasterOutput::Archive { pages, .. } => *pages,
        }
    }

    /// The output bytes.
    pub fn bytes(&self) -> &[u8] {
        match self {
            RasterOutput::Single { bytes, .. } | RasterOutput::Archive { bytes, .. } => bytes,
        }
    }

    /// Suggested download name for a source document named `stem`.
    pub fn file_name(&self, stem: &str) -> String {
        match self {
            RasterOutput::Single { format, .. } => format!("{stem}.{}", format.extension()),
            RasterOutput::Archive { .. } => format!("{stem}_images.zip"),
        }
    }

    /// MIME type of [`RasterOutput::bytes`].
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterOutput::Single { format, .. } => format.mime_type(),
            RasterOutput::Archive { .. } => "application/zip",
        }
    }
}

/// Document information read without rendering any page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Render every page of `input` to PNG or JPEG.
pub fn rasterise_blocking(
    pdfium: &Pdfium,
    input: &PdfInput,
    config: &RasterConfig,
) -> Result<RasterOutput, FilekitError> {
    let document = engine::open(pdfium, input)?;
    let pages = document.pages();
    let total = pages.len() as usize;
    if total == 0 {
        return Err(FilekitError::NoPagesSelected { total });
    }
    info!("Rendering {} pages of '{}' at {} DPI", total, input.name, config.dpi);

    let render_config = PdfRenderConfig::new().scale_page_by_factor(config.dpi as f32 / 72.0);
    let format = match config.format {
        RasterFormat::Png => OutputFormat::Png,
        RasterFormat::Jpeg => OutputFormat::Jpeg {
            quality: config.jpeg_quality,
        },
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut entries = Vec::with_capacity(total);
    for idx in 0..total {
        let name = numbered_name("page", idx, config.format.extension());
        if let Some(ref cb) = config.progress_callback {
            cb.on_item_start(idx + 1, total, &name);
        }

        let image = match render_page(pages, idx, &render_config) {
            Ok(image) => image,
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_error(idx + 1, total, &e.to_string());
                    cb.on_batch_complete(total, idx);
                }
                return Err(e);
            }
        };

        debug!("Rendered page {} → {}x{} px", idx + 1, image.width(), image.height());

        let bytes = encode_image(&image, format).map_err(|e| FilekitError::RasterisationFailed {
            page: idx + 1,
            detail: format!("Image encoding failed: {e}"),
        })?;

        if let Some(ref cb) = config.progress_callback {
            cb.on_item_complete(idx + 1, total, &name);
        }
        entries.push(ArchiveEntry::new(name, bytes));
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, entries.len());
    }

    if entries.len() == 1 {
        let entry = entries.remove(0);
        return Ok(RasterOutput::Single {
            bytes: entry.bytes,
            format: config.format,
        });
    }

    let bytes = zip_entries(&entries)?;
    Ok(RasterOutput::Archive {
        bytes,
        pages: entries.len(),
    })
}

/// Render one page; the bitmap borrows the page, so it is converted here.
fn render_page(
    pages: &PdfPages<'_>,
    idx: usize,
    render_config: &PdfRenderConfig,
) -> Result<image::DynamicImage, FilekitError> {
    let page = pages
        .get(idx as u16)
        .map_err(|e| FilekitError::RasterisationFailed {
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;

    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| FilekitError::RasterisationFailed {
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;

    Ok(bitmap.as_image())
}

/// Read the document information dictionary and page count.
pub fn metadata_blocking(
    pdfium: &Pdfium,
    input: &PdfInput,
) -> Result<DocumentMetadata, FilekitError> {
    use PdfDocumentMetadataTagType as Tag;

    let document = engine::open(pdfium, input)?;
    let info = document.metadata();
    let field = |tag: Tag| {
        info.get(tag)
            .map(|t| t.value().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(DocumentMetadata {
        title: field(Tag::Title),
        author: field(Tag::Author),
        subject: field(Tag::Subject),
        creator: field(Tag::Creator),
        producer: field(Tag::Producer),
        creation_date: field(Tag::CreationDate),
        modification_date: field(Tag::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
