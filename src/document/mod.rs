//! Word document conversion.

pub mod pandoc;
pub mod postprocess;

pub use pandoc::{docx_bytes_to_markdown, docx_to_markdown, markdown_name};
pub use postprocess::clean_markdown;
