//! ZIP bundling for multi-file outputs.
//!
//! Split PDFs, rasterised pages and resized images all leave the tool as a
//! single downloadable archive when there is more than one file. Entries are
//! deflate-compressed and written in the order given.

use crate::error::FilekitError;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A named file destined for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Build an in-memory ZIP archive from `entries`.
pub fn zip_entries<'a, I>(entries: I) -> Result<Vec<u8>, FilekitError>
where
    I: IntoIterator<Item = &'a ArchiveEntry>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut count = 0usize;
    for entry in entries {
        writer
            .start_file(entry.name.as_str(), options)
            .map_err(|e| FilekitError::Archive(format!("{}: {e}", entry.name)))?;
        writer
            .write_all(&entry.bytes)
            .map_err(|e| FilekitError::Archive(format!("{}: {e}", entry.name)))?;
        count += 1;
    }

    let cursor = writer
        .finish()
        .map_err(|e| FilekitError::Archive(e.to_string()))?;
    let bytes = cursor.into_inner();
    debug!("Built archive with {} entries ({} bytes)", count, bytes.len());
    Ok(bytes)
}

/// Rename entries whose name is already taken by an earlier one:
/// the second `x.png` becomes `x_2.png`, the third `x_3.png`.
pub fn dedupe_names(entries: &mut [ArchiveEntry]) {
    let mut taken: HashSet<String> = HashSet::with_capacity(entries.len());
    for entry in entries.iter_mut() {
        if taken.insert(entry.name.clone()) {
            continue;
        }
        let (stem, ext) = match entry.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
            _ => (entry.name.clone(), String::new()),
        };
        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{stem}_{n}{ext}");
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        debug!("Archive entry '{}' renamed to '{}'", entry.name, renamed);
        taken.insert(renamed.clone());
        entry.name = renamed;
    }
}

/// Zero-padded 1-based entry name, e.g. `page_007.png`.
pub fn numbered_name(prefix: &str, index: usize, extension: &str) -> String {
    format!("{prefix}_{:03}.{extension}", index + 1)
}
