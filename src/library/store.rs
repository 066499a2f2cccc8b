//! CSV-backed reading list: load, edit and save.
//!
//! The file is read whole and rewritten whole. Saves go to a temporary file
//! in the same directory that is then renamed over the original, so a crash
//! never leaves a half-written list. There is no locking: two processes
//! editing the same file concurrently will lose one side's changes.

use crate::error::FilekitError;
use crate::library::record::{
    columns, validate_rating, validate_read_date, Book, ReadingStatus,
};
use crate::library::score::{category_names, importance_score};
use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Availability values always offered when adding a book.
pub const DEFAULT_AVAILABILITY: [&str; 3] = ["Estante", "Kindle", "NA"];

/// A status change for [`Library::update_status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: ReadingStatus,
    /// Applied when moving to [`ReadingStatus::Read`].
    pub rating: Option<u8>,
    /// `YYYY/MM`, applied when moving to [`ReadingStatus::Read`].
    pub read_date: Option<String>,
    /// Applied when moving to [`ReadingStatus::Reading`].
    pub availability: Option<String>,
}

/// The reading list held in memory.
#[derive(Debug, Clone, Default)]
pub struct Library {
    path: Option<PathBuf>,
    headers: Vec<String>,
    books: Vec<Book>,
    /// Rows with no title: hidden from every view, written back on save.
    untitled: Vec<Book>,
}

impl Library {
    /// Read and validate the CSV at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FilekitError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| FilekitError::from_io(path, e))?;
        let mut library = Self::parse(file, path)?;
        library.path = Some(path.to_path_buf());
        info!("Loaded {} books from {}", library.books.len(), path.display());
        Ok(library)
    }

    /// Parse a reading list from any reader. The result has no backing file;
    /// use [`Library::save_to`] to persist it.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FilekitError> {
        Self::parse(reader, Path::new("<memory>"))
    }

    fn parse<R: Read>(reader: R, source: &Path) -> Result<Self, FilekitError> {
        let csv_err = |e: csv::Error| FilekitError::Csv {
            path: source.to_path_buf(),
            source: e,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let missing: Vec<String> = columns::REQUIRED
            .iter()
            .filter(|c| **c != columns::ORDER && !headers.iter().any(|h| h == *c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(FilekitError::MissingColumns {
                path: source.to_path_buf(),
                missing,
                found: headers,
            });
        }
        if !headers.iter().any(|h| h == columns::ORDER) {
            debug!("No '{}' column; planned order left empty", columns::ORDER);
        }

        let mut books = Vec::new();
        let mut untitled = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record.map_err(csv_err)?;
            let cells = headers
                .iter()
                .enumerate()
                .map(|(col, h)| (h.as_str(), record.get(col).unwrap_or("")));
            let mut book = Book::from_cells(cells).map_err(|reason| {
                // Header is line 1, so the first record is line 2.
                FilekitError::InvalidRecord(format!("line {}: {}", i + 2, reason))
            })?;
            if book.title.is_empty() {
                warn!("Line {} has no title; it is kept in the file but not listed", i + 2);
                untitled.push(book);
                continue;
            }
            book.score = importance_score(&book);
            books.push(book);
        }

        Ok(Self {
            path: None,
            headers,
            books,
            untitled,
        })
    }

    /// Backing file, if loaded with [`Library::load`].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Column headers as they will be written.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// First book whose title matches exactly.
    pub fn find(&self, title: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.title == title)
    }

    /// Titles of the books in `status`, in file order, without repeats.
    pub fn titles_with_status(&self, status: ReadingStatus) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.books
            .iter()
            .filter(|b| b.status == status)
            .map(|b| b.title.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    /// Append `book` after validation. Titles are unique ignoring case and
    /// surrounding whitespace.
    pub fn add_book(&mut self, mut book: Book) -> Result<&Book, FilekitError> {
        book.title = book.title.trim().to_string();
        book.author = book.author.trim().to_string();
        if book.title.is_empty() || book.author.is_empty() {
            return Err(FilekitError::InvalidInput(
                "title and author are required".into(),
            ));
        }

        let key = book.title.to_lowercase();
        if self
            .books
            .iter()
            .any(|b| b.title.trim().to_lowercase() == key)
        {
            return Err(FilekitError::DuplicateBook { title: book.title });
        }

        if let Some(rating) = book.rating {
            validate_rating(rating)?;
        }
        if let Some(ref date) = book.read_date {
            book.read_date = Some(validate_read_date(date)?);
        }
        if book.status != ReadingStatus::Read {
            book.rating = None;
            book.read_date = None;
        }

        book.score = importance_score(&book);
        info!("Added '{}' (score {})", book.title, book.score);
        self.books.push(book);
        let idx = self.books.len() - 1;
        Ok(&self.books[idx])
    }

    /// Change the status of the first book titled `title`.
    pub fn update_status(
        &mut self,
        title: &str,
        update: StatusUpdate,
    ) -> Result<&Book, FilekitError> {
        let rating = update.rating.map(validate_rating).transpose()?;
        let read_date = update
            .read_date
            .as_deref()
            .map(validate_read_date)
            .transpose()?;

        let idx = self
            .books
            .iter()
            .position(|b| b.title == title)
            .ok_or_else(|| FilekitError::BookNotFound {
                title: title.to_string(),
            })?;

        let book = &mut self.books[idx];
        book.status = update.status;
        match update.status {
            ReadingStatus::Reading => {
                if let Some(avail) = update.availability.filter(|a| !a.trim().is_empty()) {
                    book.availability = avail.trim().to_string();
                }
            }
            ReadingStatus::Read => {
                if rating.is_some() {
                    book.rating = rating;
                }
                if read_date.is_some() {
                    book.read_date = read_date;
                }
            }
            ReadingStatus::ToRead => {}
        }
        book.score = importance_score(book);
        info!("Updated '{}' → {}", book.title, book.status);
        Ok(&self.books[idx])
    }

    /// Remove every book titled exactly `title`. Returns how many were removed.
    pub fn delete_book(&mut self, title: &str) -> Result<usize, FilekitError> {
        let before = self.books.len();
        self.books.retain(|b| b.title != title);
        let removed = before - self.books.len();
        if removed == 0 {
            return Err(FilekitError::BookNotFound {
                title: title.to_string(),
            });
        }
        info!("Deleted {} book(s) titled '{}'", removed, title);
        Ok(removed)
    }

    /// Existing availability values plus the defaults, sorted and unique.
    pub fn availability_options(&self) -> Vec<String> {
        let mut options: BTreeSet<String> = self
            .books
            .iter()
            .map(|b| b.availability.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        options.extend(DEFAULT_AVAILABILITY.iter().map(|s| s.to_string()));
        options.into_iter().collect()
    }

    /// Existing categories plus every weighted category, sorted and unique.
    pub fn category_options(&self) -> Vec<String> {
        let mut options: BTreeSet<String> = self
            .books
            .iter()
            .map(|b| b.category.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        options.extend(category_names().into_iter().map(str::to_string));
        options.into_iter().collect()
    }

    /// Headers to write: the loaded ones plus any optional column a book now
    /// has a value for.
    fn output_headers(&self) -> Vec<String> {
        let mut headers = if self.headers.is_empty() {
            columns::REQUIRED.iter().map(|c| c.to_string()).collect()
        } else {
            self.headers.clone()
        };

        let optional: [(&str, fn(&Book) -> bool); 3] = [
            (columns::RATING, |b| b.rating.is_some()),
            (columns::READ_DATE, |b| b.read_date.is_some()),
            (columns::MOTIVATION, |b| b.motivation.is_some()),
        ];
        for (column, has_value) in optional {
            if !headers.iter().any(|h| h == column) && self.books.iter().any(has_value) {
                headers.push(column.to_string());
            }
        }
        headers
    }

    /// Serialise the list as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), FilekitError> {
        let target = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("<memory>"));
        let csv_err = |e: csv::Error| FilekitError::Csv {
            path: target.clone(),
            source: e,
        };

        let headers = self.output_headers();
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&headers).map_err(csv_err)?;
        for book in self.books.iter().chain(&self.untitled) {
            wtr.write_record(headers.iter().map(|h| book.cell(h)))
                .map_err(csv_err)?;
        }
        wtr.flush().map_err(|e| FilekitError::OutputWriteFailed {
            path: target.clone(),
            source: e,
        })
    }

    /// Rewrite the backing file.
    pub fn save(&self) -> Result<(), FilekitError> {
        let path = self.path.as_deref().ok_or_else(|| {
            FilekitError::InvalidInput("this reading list has no backing file; use save_to".into())
        })?;
        self.save_to(path)
    }

    /// Write the list to `path` atomically (temp file + rename).
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), FilekitError> {
        let path = path.as_ref();
        let write_err = |e: std::io::Error| FilekitError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        self.write_csv(tmp.as_file_mut())?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        debug!("Saved {} books to {}", self.books.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Título,Autor,Ano,Tipo,Prioridade,Status,Disponivel,Categoria,#,Nota,Data_Leitura,Editora
Clean Code,Robert C. Martin,2008.0,Técnico,4 - Alta,0,Estante,Artesanato de Software (Clean Code),,5,2023/05,Alta Books
Dune,Frank Herbert,1965,Não Técnico,2 - Média,1,Kindle,Épicos & Ficção Reflexiva,2,,,Aleph
Atomic Habits,James Clear,2018,Não Técnico,3 - Média-Alta,2,Estante,Alta Performance & Foco,1,,,
";

    fn sample() -> Library {
        Library::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn loads_rows_and_scores() {
        let lib = sample();
        assert_eq!(lib.len(), 3);
        let clean = lib.find("Clean Code").unwrap();
        assert_eq!(clean.year, Some(2008));
        assert_eq!(clean.status, ReadingStatus::Read);
        assert_eq!(clean.score, 4 + 2 + 10 + 7 + 6);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let csv = "Título,Autor\nA,B\n";
        let err = Library::from_reader(csv.as_bytes()).unwrap_err();
        match err {
            FilekitError::MissingColumns { missing, .. } => {
                assert!(missing.contains(&"Ano".to_string()));
                assert!(!missing.contains(&"#".to_string()));
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn order_column_may_be_absent() {
        let csv = "Título,Autor,Ano,Tipo,Prioridade,Status,Disponivel,Categoria\nA,B,2020,Técnico,1 - Baixa,,NA,X\n";
        let lib = Library::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(lib.books()[0].order, None);
        assert_eq!(lib.books()[0].status, ReadingStatus::ToRead);
    }

    #[test]
    fn bad_status_names_the_line() {
        let csv = "Título,Autor,Ano,Tipo,Prioridade,Status,Disponivel,Categoria,#\nA,B,,,,7,,,\n";
        let err = Library::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "got: {err}");
    }

    #[test]
    fn duplicate_titles_are_rejected_case_insensitively() {
        let mut lib = sample();
        let err = lib
            .add_book(Book {
                title: "  dune ".into(),
                author: "Someone".into(),
                ..Book::default()
            })
            .unwrap_err();
        assert!(matches!(err, FilekitError::DuplicateBook { .. }));
    }

    #[test]
    fn add_requires_title_and_author() {
        let mut lib = sample();
        let err = lib
            .add_book(Book {
                title: "Only title".into(),
                ..Book::default()
            })
            .unwrap_err();
        assert!(matches!(err, FilekitError::InvalidInput(_)));
    }

    #[test]
    fn add_computes_score_and_drops_rating_unless_read() {
        let mut lib = sample();
        let added = lib
            .add_book(Book {
                title: "Designing Data-Intensive Applications".into(),
                author: "Martin Kleppmann".into(),
                year: Some(2017),
                kind: "Técnico".into(),
                priority: "4 - Alta".into(),
                status: ReadingStatus::ToRead,
                availability: "Estante".into(),
                category: "Arquitetura de Sistemas Digitais".into(),
                rating: Some(5),
                ..Book::default()
            })
            .unwrap();
        assert_eq!(added.score, 4 + 2 + 10 + 7 + 5);
        assert_eq!(added.rating, None);
        assert_eq!(lib.len(), 4);
    }

    #[test]
    fn moving_to_reading_sets_availability() {
        let mut lib = sample();
        let book = lib
            .update_status(
                "Dune",
                StatusUpdate {
                    status: ReadingStatus::Reading,
                    availability: Some("Estante".into()),
                    ..StatusUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(book.status, ReadingStatus::Reading);
        assert_eq!(book.availability, "Estante");
    }

    #[test]
    fn finishing_sets_rating_and_date() {
        let mut lib = sample();
        let book = lib
            .update_status(
                "Atomic Habits",
                StatusUpdate {
                    status: ReadingStatus::Read,
                    rating: Some(4),
                    read_date: Some("2025/1".into()),
                    availability: Some("ignored".into()),
                },
            )
            .unwrap();
        assert_eq!(book.rating, Some(4));
        assert_eq!(book.read_date.as_deref(), Some("2025/01"));
        assert_eq!(book.availability, "Estante");
    }

    #[test]
    fn update_unknown_title_fails() {
        let mut lib = sample();
        let err = lib
            .update_status("Nope", StatusUpdate::default())
            .unwrap_err();
        assert!(matches!(err, FilekitError::BookNotFound { .. }));
    }

    #[test]
    fn delete_removes_exact_matches_only() {
        let mut lib = sample();
        assert!(lib.delete_book("dune").is_err());
        assert_eq!(lib.delete_book("Dune").unwrap(), 1);
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn options_include_defaults_and_table() {
        let lib = sample();
        let avail = lib.availability_options();
        assert_eq!(avail, vec!["Estante", "Kindle", "NA"]);
        let cats = lib.category_options();
        assert_eq!(cats.len(), 19);
        assert!(cats.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn titles_with_status_filters() {
        let lib = sample();
        assert_eq!(lib.titles_with_status(ReadingStatus::Reading), vec!["Atomic Habits"]);
    }

    #[test]
    fn write_preserves_unknown_columns_and_appends_new_optional_ones() {
        let csv = "Título,Autor,Ano,Tipo,Prioridade,Status,Disponivel,Categoria,#,Editora\n\
                   A,B,2020,Técnico,1 - Baixa,1,NA,X,,Pub\n";
        let mut lib = Library::from_reader(csv.as_bytes()).unwrap();
        lib.update_status(
            "A",
            StatusUpdate {
                status: ReadingStatus::Read,
                rating: Some(3),
                ..StatusUpdate::default()
            },
        )
        .unwrap();

        let mut out = Vec::new();
        lib.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Título,Autor,Ano,Tipo,Prioridade,Status,Disponivel,Categoria,#,Editora,Nota"
        );
        assert_eq!(
            lines.next().unwrap(),
            "A,B,2020,Técnico,1 - Baixa,0,NA,X,,Pub,3"
        );
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut lib = Library::load(&path).unwrap();
        lib.delete_book("Clean Code").unwrap();
        lib.save().unwrap();

        let again = Library::load(&path).unwrap();
        assert_eq!(again.len(), 2);
        assert!(again.find("Clean Code").is_none());
        assert_eq!(again.find("Dune").unwrap().cell("Editora"), "Aleph");
    }

    #[test]
    fn untitled_rows_survive_unrelated_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        std::fs::write(
            &path,
            "\
Título,Autor,Ano,Tipo,Prioridade,Status,Disponivel,Categoria,#
Dune,Frank Herbert,1965,Não Técnico,2 - Média,0,Kindle,Épicos & Ficção Reflexiva,
,Placeholder Author,,,,0,,,
SICP,Abelson,1985,Técnico,3 - Média-Alta,0,Estante,Fundamentos de Computação,
",
        )
        .unwrap();

        let mut lib = Library::load(&path).unwrap();
        assert_eq!(lib.len(), 2);
        lib.delete_book("SICP").unwrap();
        lib.save().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Placeholder Author"));
        assert!(!written.contains("SICP"));

        let again = Library::load(&path).unwrap();
        assert_eq!(again.len(), 1);
        assert!(again.find("Dune").is_some());
    }
}
