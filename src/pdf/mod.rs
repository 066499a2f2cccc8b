//! PDF tools: merge, split, page extraction, rasterisation and inspection.
//!
//! pdfium is a blocking C library, so every public function here binds the
//! library and does its work inside `tokio::task::spawn_blocking`. The
//! `*_blocking` functions in the submodules are public for callers that
//! already hold a [`pdfium_render::prelude::Pdfium`] instance.

pub mod edit;
pub mod engine;
pub mod render;

pub use engine::PdfInput;
pub use render::{DocumentMetadata, RasterOutput};

use crate::config::{PageSelection, RasterConfig};
use crate::error::FilekitError;

async fn run_blocking<T, F>(task: &'static str, f: F) -> Result<T, FilekitError>
where
    T: Send + 'static,
    F: FnOnce(&pdfium_render::prelude::Pdfium) -> Result<T, FilekitError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let pdfium = engine::bind()?;
        f(&pdfium)
    })
    .await
    .map_err(|e| FilekitError::Internal(format!("{task} task panicked: {e}")))?
}

/// Concatenate `inputs`, in the given order, into one PDF.
pub async fn merge_pdfs(inputs: Vec<PdfInput>) -> Result<Vec<u8>, FilekitError> {
    run_blocking("Merge", move |pdfium| edit::merge_blocking(pdfium, &inputs)).await
}

/// Build a new PDF from the pages named by `selection`.
///
/// Out-of-range page numbers are ignored; if nothing remains the call fails
/// with [`FilekitError::NoPagesSelected`].
pub async fn extract_pages(
    input: PdfInput,
    selection: PageSelection,
) -> Result<Vec<u8>, FilekitError> {
    run_blocking("Extract", move |pdfium| {
        edit::extract_blocking(pdfium, &input, &selection)
    })
    .await
}

/// Split a PDF into one file per page, returned as a ZIP archive.
pub async fn split_pdf(input: PdfInput, prefix: String) -> Result<Vec<u8>, FilekitError> {
    run_blocking("Split", move |pdfium| {
        edit::split_blocking(pdfium, &input, &prefix)
    })
    .await
}

/// Render every page to an image. One page yields the image itself, more
/// yield a ZIP archive.
pub async fn pdf_to_images(
    mut input: PdfInput,
    config: RasterConfig,
) -> Result<RasterOutput, FilekitError> {
    if input.password.is_none() {
        input.password = config.password.clone();
    }
    run_blocking("Render", move |pdfium| {
        render::rasterise_blocking(pdfium, &input, &config)
    })
    .await
}

/// Read title, author, dates, page count and version.
pub async fn inspect(input: PdfInput) -> Result<DocumentMetadata, FilekitError> {
    run_blocking("Metadata", move |pdfium| {
        render::metadata_blocking(pdfium, &input)
    })
    .await
}
