//! # filekit
//!
//! A personal productivity toolbox: everyday file chores plus a small
//! reading tracker, usable as a library or through the `filekit` binary.
//!
//! ## Tools
//!
//! ```text
//! files     folder tree drawing, flat file listing
//! pdf       merge, split, page extraction, PDF → PNG/JPEG, inspect (pdfium)
//! imaging   batch resize by percent / width / height (Lanczos3)
//! audio     speech-to-text upload + structured AI summary
//! document  DOCX → Markdown through pandoc, with cleanup
//! library   CSV reading list: CRUD, importance score, stats, cover wall
//! ```
//!
//! Multi-file outputs (split PDFs, rendered pages, resized images) are
//! returned as in-memory ZIP archives; see [`archive`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filekit::{render_tree_text, PageSelection, PdfInput, TreeOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     println!("{}", render_tree_text(std::path::Path::new("."), &TreeOptions::default())?);
//!
//!     let pdf = PdfInput::new("report.pdf", std::fs::read("report.pdf")?);
//!     let selection: PageSelection = "1, 3-5".parse()?;
//!     let extracted = filekit::pdf::extract_pages(pdf, selection).await?;
//!     std::fs::write("excerpt.pdf", extracted)?;
//!     Ok(())
//! }
//! ```
//!
//! ## External Requirements
//!
//! | Tool | Needed by | Located via |
//! |------|-----------|-------------|
//! | pdfium shared library | [`pdf`] | `PDFIUM_LIB_PATH`, `./`, system path |
//! | `pandoc` | [`document`] | `PANDOC_PATH` or `PATH` |
//! | OpenAI-compatible API key | [`audio`], [`library::suggest`] | `OPENAI_API_KEY` |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `filekit` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod audio;
pub mod config;
pub mod document;
pub mod error;
pub mod files;
pub mod imaging;
pub mod library;
pub mod llm;
pub mod pdf;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AiConfig, AiConfigBuilder, DocxConfig, MarkdownFlavor, PageSelection, RasterConfig,
    RasterConfigBuilder, RasterFormat, TreeOptions,
};
pub use error::{FilekitError, ItemError};
pub use files::{list_files, render_tree, render_tree_text, FileListing};
pub use imaging::{resize_batch, resize_image, ResizeMode};
pub use library::{Book, Library, ReadingStatus};
pub use pdf::{DocumentMetadata, PdfInput, RasterOutput};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
