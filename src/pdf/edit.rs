//! Page-level PDF editing: merge, extract and split.
//!
//! Every function builds a fresh document with `create_new_pdf` and copies
//! pages into it, so the inputs are never modified.

use crate::archive::{numbered_name, zip_entries, ArchiveEntry};
use crate::config::PageSelection;
use crate::error::FilekitError;
use crate::pdf::engine::{self, op_error, PdfInput};
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Concatenate `inputs` in order into a single PDF.
pub fn merge_blocking(pdfium: &Pdfium, inputs: &[PdfInput]) -> Result<Vec<u8>, FilekitError> {
    if inputs.is_empty() {
        return Err(FilekitError::InvalidInput(
            "at least one PDF is required to merge".into(),
        ));
    }

    let mut merged = pdfium.create_new_pdf().map_err(op_error("create"))?;
    for input in inputs {
        let source = engine::open(pdfium, input)?;
        debug!("Appending '{}' ({} pages)", input.name, source.pages().len());
        merged.pages_mut().append(&source).map_err(op_error("append"))?;
    }

    info!(
        "Merged {} files into {} pages",
        inputs.len(),
        merged.pages().len()
    );
    merged.save_to_bytes().map_err(op_error("save"))
}

/// Copy the selected pages of `input` into a new PDF, in ascending order.
pub fn extract_blocking(
    pdfium: &Pdfium,
    input: &PdfInput,
    selection: &PageSelection,
) -> Result<Vec<u8>, FilekitError> {
    let source = engine::open(pdfium, input)?;
    let total = source.pages().len() as usize;
    let indices = selection.to_indices(total);
    if indices.is_empty() {
        return Err(FilekitError::NoPagesSelected { total });
    }

    let mut out = pdfium.create_new_pdf().map_err(op_error("create"))?;
    for (dest, &idx) in indices.iter().enumerate() {
        out.pages_mut()
            .copy_page_from_document(&source, idx as u16, dest as u16)
            .map_err(op_error("copy page"))?;
    }

    info!("Extracted {} of {} pages from '{}'", indices.len(), total, input.name);
    out.save_to_bytes().map_err(op_error("save"))
}

/// Split `input` into single-page PDFs bundled in a ZIP archive.
///
/// Entries are named `{prefix}_{NNN}.pdf`, numbered from 1.
pub fn split_blocking(
    pdfium: &Pdfium,
    input: &PdfInput,
    prefix: &str,
) -> Result<Vec<u8>, FilekitError> {
    let source = engine::open(pdfium, input)?;
    let total = source.pages().len() as usize;

    let mut entries = Vec::with_capacity(total);
    for idx in 0..total {
        let mut single = pdfium.create_new_pdf().map_err(op_error("create"))?;
        single
            .pages_mut()
            .copy_page_from_document(&source, idx as u16, 0)
            .map_err(op_error("copy page"))?;
        let bytes = single.save_to_bytes().map_err(op_error("save"))?;
        entries.push(ArchiveEntry::new(numbered_name(prefix, idx, "pdf"), bytes));
    }

    info!("Split '{}' into {} files", input.name, entries.len());
    zip_entries(&entries)
}
