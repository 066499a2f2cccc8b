//! Binding to the pdfium shared library and opening documents.
//!
//! Library resolution, first match wins:
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to `libpdfium.{so,dylib}` / `pdfium.dll`
//! 2. the platform library name in the current working directory
//! 3. the system library search path
//!
//! All functions here are blocking; callers run them inside
//! `tokio::task::spawn_blocking` (see [`crate::pdf`]).

use crate::error::FilekitError;
use pdfium_render::prelude::*;
use tracing::debug;

/// Environment variable pointing at an existing pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// A named PDF held in memory, as uploaded by the user.
#[derive(Debug, Clone)]
pub struct PdfInput {
    /// Display name used in error messages and output file names.
    pub name: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// User password for encrypted documents.
    pub password: Option<String>,
}

impl PdfInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// File name without its extension, e.g. `report` for `report.pdf`.
    pub fn stem(&self) -> &str {
        std::path::Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
    }
}

/// Bind to a pdfium library following the resolution order above.
pub fn bind() -> Result<Pdfium, FilekitError> {
    if let Ok(path) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !path.is_empty() {
            debug!("Binding pdfium from {}={}", PDFIUM_LIB_PATH_ENV, path);
            let bindings = Pdfium::bind_to_library(&path)
                .map_err(|e| FilekitError::PdfiumBindingFailed(format!("{path}: {e:?}")))?;
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| FilekitError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Reject bytes that do not carry the `%PDF` magic before pdfium sees them.
pub fn check_magic(input: &PdfInput) -> Result<(), FilekitError> {
    if input.bytes.len() < 4 || &input.bytes[..4] != b"%PDF" {
        return Err(FilekitError::NotAPdf {
            name: input.name.clone(),
            magic: input.bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Open an in-memory PDF, mapping pdfium errors to [`FilekitError`].
pub fn open<'a>(pdfium: &'a Pdfium, input: &'a PdfInput) -> Result<PdfDocument<'a>, FilekitError> {
    check_magic(input)?;
    pdfium
        .load_pdf_from_byte_slice(&input.bytes, input.password.as_deref())
        .map_err(|e| {
            let err_str = format!("{e:?}");
            if err_str.contains("Password") || err_str.contains("password") {
                if input.password.is_some() {
                    FilekitError::WrongPassword {
                        name: input.name.clone(),
                    }
                } else {
                    FilekitError::PasswordRequired {
                        name: input.name.clone(),
                    }
                }
            } else {
                FilekitError::CorruptPdf {
                    name: input.name.clone(),
                    detail: err_str,
                }
            }
        })
}

/// Wrap a pdfium editing/saving error with the operation that failed.
pub fn op_error(operation: &str) -> impl Fn(PdfiumError) -> FilekitError + '_ {
    move |e| FilekitError::PdfOperationFailed {
        operation: operation.to_string(),
        detail: format!("{e:?}"),
    }
}
