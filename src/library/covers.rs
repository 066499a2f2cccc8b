//! Cover wall: match book titles to cover images on disk.
//!
//! Image files are keyed by their name up to the first `.`, with accents
//! stripped and lower-cased, so `Código Limpo.jpg` matches the title
//! "Código Limpo". A title also matches with spaces replaced by
//! underscores (`clean_code.png` for "Clean Code").

use crate::error::FilekitError;
use crate::library::query::BookFilter;
use crate::library::record::Book;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Extensions recognised as cover images.
pub const COVER_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Decompose, drop combining marks and lower-case.
pub fn normalize_title(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Cover files found in one directory, by normalised name.
#[derive(Debug, Clone, Default)]
pub struct CoverIndex {
    files: HashMap<String, PathBuf>,
}

impl CoverIndex {
    /// Index the images in `dir`. A missing directory yields an empty index.
    pub fn scan(dir: &Path) -> Result<Self, FilekitError> {
        let mut index = Self::default();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Cover directory {} does not exist", dir.display());
                return Ok(index);
            }
            Err(e) => return Err(FilekitError::from_io(dir, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| FilekitError::from_io(dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            index.insert(&name, entry.path());
        }
        debug!("Indexed {} covers in {}", index.len(), dir.display());
        Ok(index)
    }

    /// Register `file_name` (at `path`) if it has an image extension.
    pub fn insert(&mut self, file_name: &str, path: PathBuf) {
        let lower = file_name.to_lowercase();
        if !COVER_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(&format!(".{ext}")))
        {
            return;
        }
        let stem = file_name.split('.').next().unwrap_or(file_name);
        self.files.insert(normalize_title(stem), path);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Cover for `title`: exact normalised match, then with underscores.
    pub fn find(&self, title: &str) -> Option<&Path> {
        let norm = normalize_title(title).trim().to_string();
        self.files
            .get(&norm)
            .or_else(|| self.files.get(&norm.replace(' ', "_")))
            .map(PathBuf::as_path)
    }
}

/// A book with its cover, if one was found.
#[derive(Debug, Clone, Serialize)]
pub struct MuralCard<'a> {
    pub book: &'a Book,
    pub cover: Option<PathBuf>,
}

/// The cover wall for the books `filter` selects, best rated first.
#[derive(Debug, Clone, Serialize)]
pub struct Mural<'a> {
    pub cards: Vec<MuralCard<'a>>,
    pub covers_found: usize,
}

pub fn build_mural<'a>(
    books: &'a [Book],
    index: &CoverIndex,
    filter: &BookFilter,
) -> Mural<'a> {
    // The wall always orders by rating, even for a to-read-only filter.
    let rating_order = BookFilter {
        statuses: Vec::new(),
        ..filter.clone()
    };
    let cards: Vec<MuralCard<'a>> = rating_order
        .apply(books)
        .into_iter()
        .filter(|b| filter.matches(b))
        .map(|book| MuralCard {
            book,
            cover: index.find(&book.title).map(Path::to_path_buf),
        })
        .collect();
    let covers_found = cards.iter().filter(|c| c.cover.is_some()).count();
    Mural {
        cards,
        covers_found,
    }
}
