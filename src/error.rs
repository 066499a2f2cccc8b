//! Error types for the filekit library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`FilekitError`] — **Fatal**: the operation cannot proceed at all
//!   (missing folder, corrupt PDF, provider not configured, unknown book).
//!   Returned as `Err(FilekitError)` from every public entry point.
//!
//! * [`ItemError`] — **Non-fatal**: one item of a batch failed (a single image
//!   that could not be decoded) while the others are fine. Stored inside
//!   [`crate::imaging::BatchResize`] so callers can report partial success
//!   rather than losing the whole batch to one bad file.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the filekit library.
#[derive(Debug, Error)]
pub enum FilekitError {
    // ── Filesystem errors ────────────────────────────────────────────────
    /// Path does not exist.
    #[error("Path not found: '{path}'\nCheck the path exists and is readable.")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a directory.
    #[error("'{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    /// Process does not have permission to read the path.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The supplied input is unusable (empty batch, empty title, …).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The bytes do not start with the `%PDF` magic.
    #[error("'{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' could not be opened: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// The page selection string could not be parsed.
    #[error("Invalid page selection '{input}': {reason}\nUse e.g. \"1, 3-5, 8\" or \"all\".")]
    InvalidPageSelection { input: String, reason: String },

    /// The selection parsed but matched no page of the document.
    #[error("No valid page selected (document has {total} pages)")]
    NoPagesSelected { total: usize },

    /// pdfium returned an error while editing or saving a document.
    #[error("PDF operation '{operation}' failed: {detail}")]
    PdfOperationFailed { operation: String, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide (bblanchon/pdfium-binaries).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Image errors ──────────────────────────────────────────────────────
    /// The image could not be decoded or encoded.
    #[error("Image '{name}' could not be processed: {detail}")]
    ImageFailed { name: String, detail: String },

    /// The image format is not one of PNG, JPEG, WebP.
    #[error("Unsupported image format for '{name}': {format}")]
    UnsupportedImageFormat { name: String, format: String },

    // ── AI errors ─────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("AI provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The speech-to-text API rejected the upload.
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// The chat API returned an error after all retries.
    #[error("LLM API error after {retries} retries: {message}")]
    LlmApiError { retries: u32, message: String },

    /// The model answered but not with the JSON we asked for.
    #[error("Could not parse AI response: {detail}")]
    InvalidAiResponse { detail: String },

    // ── Document conversion errors ────────────────────────────────────────
    /// `pandoc` is not installed or not on PATH.
    #[error(
        "Pandoc not found (tried '{binary}').\n\
Install it from https://pandoc.org/installing.html and check `pandoc --version`,\n\
or point PANDOC_PATH at the executable."
    )]
    PandocNotFound { binary: String },

    /// `pandoc` ran but exited with an error.
    #[error("Document conversion failed: {stderr}")]
    ConversionFailed { stderr: String },

    // ── Reading list errors ───────────────────────────────────────────────
    /// The CSV file lacks required columns.
    #[error("Reading list '{path}' is missing columns: {}\nColumns found: {}", missing.join(", "), found.join(", "))]
    MissingColumns {
        path: PathBuf,
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// A row or value could not be parsed.
    #[error("Invalid book record: {0}")]
    InvalidRecord(String),

    /// A book with the same title already exists.
    #[error("The book '{title}' is already in the list")]
    DuplicateBook { title: String },

    /// No book has the given title.
    #[error("Book not found: '{title}'")]
    BookNotFound { title: String },

    /// CSV reader/writer error.
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read an input file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// ZIP archive creation failed.
    #[error("Failed to build archive: {0}")]
    Archive(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FilekitError {
    /// Map an I/O error on `path` to the closest filesystem variant.
    pub(crate) fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => FilekitError::PathNotFound { path },
            std::io::ErrorKind::PermissionDenied => FilekitError::PermissionDenied { path },
            _ => FilekitError::ReadFailed { path, source: err },
        }
    }
}

/// A non-fatal error for a single item of a batch.
///
/// The batch continues; callers decide whether a partial result is acceptable.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ItemError {
    /// Decoding or encoding the item failed.
    #[error("{name}: processing failed: {detail}")]
    ProcessingFailed { name: String, detail: String },

    /// The item's format is not supported.
    #[error("{name}: unsupported format '{format}'")]
    Unsupported { name: String, format: String },
}

impl ItemError {
    /// Downgrade a fatal error for item `name` into a batch entry.
    pub fn from_error(name: &str, e: FilekitError) -> Self {
        match e {
            FilekitError::UnsupportedImageFormat { name, format } => {
                ItemError::Unsupported { name, format }
            }
            FilekitError::ImageFailed { name, detail } => {
                ItemError::ProcessingFailed { name, detail }
            }
            other => ItemError::ProcessingFailed {
                name: name.to_string(),
                detail: other.to_string(),
            },
        }
    }

    /// Name of the item that failed.
    pub fn name(&self) -> &str {
        match self {
            ItemError::ProcessingFailed { name, .. } | ItemError::Unsupported { name, .. } => name,
        }
    }
}
