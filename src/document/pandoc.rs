//! DOCX → Markdown through the `pandoc` executable.

use crate::config::DocxConfig;
use crate::document::postprocess::clean_markdown;
use crate::error::FilekitError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

/// Convert the DOCX file at `path` to Markdown.
pub async fn docx_to_markdown(path: &Path, config: &DocxConfig) -> Result<String, FilekitError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(FilekitError::InvalidInput(format!(
                "{} is not a file",
                path.display()
            )))
        }
        Err(e) => return Err(FilekitError::from_io(path, e)),
    }

    let work_dir = TempDir::new().map_err(|e| FilekitError::Internal(e.to_string()))?;
    let output = work_dir.path().join(markdown_name(path));
    run_pandoc(path, &output, config).await?;
    read_output(&output, config).await
}

/// Convert an in-memory DOCX (e.g. an upload) to Markdown.
pub async fn docx_bytes_to_markdown(
    file_name: &str,
    bytes: &[u8],
    config: &DocxConfig,
) -> Result<String, FilekitError> {
    if !has_docx_extension(file_name) {
        return Err(FilekitError::InvalidInput(format!(
            "'{file_name}' is not a .docx file"
        )));
    }

    let work_dir = TempDir::new().map_err(|e| FilekitError::Internal(e.to_string()))?;
    let input = work_dir.path().join("input.docx");
    tokio::fs::write(&input, bytes)
        .await
        .map_err(|e| FilekitError::OutputWriteFailed {
            path: input.clone(),
            source: e,
        })?;

    let output = work_dir.path().join("output.md");
    run_pandoc(&input, &output, config).await?;
    read_output(&output, config).await
}

/// `report.docx` → `report.md`.
pub fn markdown_name(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    PathBuf::from(format!("{stem}.md"))
}

fn has_docx_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("docx"))
        .unwrap_or(false)
}

async fn run_pandoc(input: &Path, output: &Path, config: &DocxConfig) -> Result<(), FilekitError> {
    let mut cmd = Command::new(&config.pandoc_binary);
    cmd.arg(input).arg("-o").arg(output);
    if let Some(writer) = config.flavor.pandoc_writer() {
        cmd.arg("-t").arg(writer);
    }
    debug!("Running {:?}", cmd);

    let result = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FilekitError::PandocNotFound {
                binary: config.pandoc_binary.display().to_string(),
            }
        } else {
            FilekitError::ConversionFailed {
                stderr: e.to_string(),
            }
        }
    })?;

    if !result.status.success() {
        return Err(FilekitError::ConversionFailed {
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }
    Ok(())
}

async fn read_output(output: &Path, config: &DocxConfig) -> Result<String, FilekitError> {
    let markdown = tokio::fs::read_to_string(output)
        .await
        .map_err(|e| FilekitError::from_io(output, e))?;
    info!("Converted document: {} characters of Markdown", markdown.len());

    if config.clean_output {
        Ok(clean_markdown(&markdown))
    } else {
        Ok(markdown)
    }
}
