//! The book record and its CSV column names.

use crate::error::FilekitError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Column headers of the reading-list CSV.
pub mod columns {
    pub const TITLE: &str = "Título";
    pub const AUTHOR: &str = "Autor";
    pub const YEAR: &str = "Ano";
    pub const KIND: &str = "Tipo";
    pub const PRIORITY: &str = "Prioridade";
    pub const STATUS: &str = "Status";
    pub const AVAILABILITY: &str = "Disponivel";
    pub const CATEGORY: &str = "Categoria";
    pub const ORDER: &str = "#";
    pub const RATING: &str = "Nota";
    pub const READ_DATE: &str = "Data_Leitura";
    pub const MOTIVATION: &str = "Motivacao";
    pub const SCORE: &str = "Score";

    /// Columns every reading list must have. `#` may be absent.
    pub const REQUIRED: [&str; 9] = [
        TITLE,
        AUTHOR,
        YEAR,
        KIND,
        PRIORITY,
        STATUS,
        AVAILABILITY,
        CATEGORY,
        ORDER,
    ];

    /// Columns the record reads and writes itself; everything else is
    /// carried through untouched.
    pub const KNOWN: [&str; 13] = [
        TITLE,
        AUTHOR,
        YEAR,
        KIND,
        PRIORITY,
        STATUS,
        AVAILABILITY,
        CATEGORY,
        ORDER,
        RATING,
        READ_DATE,
        MOTIVATION,
        SCORE,
    ];
}

/// `Tipo` value for technical books.
pub const KIND_TECHNICAL: &str = "Técnico";
/// `Tipo` value for everything else.
pub const KIND_NON_TECHNICAL: &str = "Não Técnico";

/// Priority labels, lowest first.
pub const PRIORITIES: [&str; 4] = ["1 - Baixa", "2 - Média", "3 - Média-Alta", "4 - Alta"];

/// Date format of the `Data_Leitura` column.
pub const READ_DATE_FORMAT: &str = "%Y/%m";

/// Reading state, stored as an integer code in the `Status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ReadingStatus {
    Read,
    #[default]
    ToRead,
    Reading,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::ToRead,
        ReadingStatus::Reading,
        ReadingStatus::Read,
    ];

    /// Code stored in the CSV: 0 read, 1 to read, 2 reading.
    pub fn code(self) -> u8 {
        match self {
            ReadingStatus::Read => 0,
            ReadingStatus::ToRead => 1,
            ReadingStatus::Reading => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ReadingStatus::Read),
            1 => Some(ReadingStatus::ToRead),
            2 => Some(ReadingStatus::Reading),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReadingStatus::Read => "Read",
            ReadingStatus::ToRead => "To read",
            ReadingStatus::Reading => "Reading",
        }
    }

    /// Parse a CSV cell. Blank means "to read"; `1.0` style floats are accepted.
    fn parse_cell(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(ReadingStatus::ToRead);
        }
        parse_lenient_int(raw)
            .and_then(|n| u8::try_from(n).ok())
            .and_then(Self::from_code)
            .ok_or_else(|| format!("unknown status code '{raw}' (expected 0, 1 or 2)"))
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReadingStatus {
    type Err = FilekitError;

    /// Accepts codes, English names and the Portuguese labels
    /// (`Lido`, `A Ler`, `Lendo`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase().replace(['-', '_'], " ");
        match norm.as_str() {
            "0" | "read" | "lido" => Ok(ReadingStatus::Read),
            "1" | "to read" | "toread" | "a ler" => Ok(ReadingStatus::ToRead),
            "2" | "reading" | "lendo" => Ok(ReadingStatus::Reading),
            _ => Err(FilekitError::InvalidInput(format!(
                "unknown reading status '{s}' (use read, to-read or reading)"
            ))),
        }
    }
}

/// One row of the reading list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub kind: String,
    pub priority: String,
    pub status: ReadingStatus,
    pub availability: String,
    pub category: String,
    /// Planned reading order (`#`).
    pub order: Option<u32>,
    /// Personal rating, 1 to 5.
    pub rating: Option<u8>,
    /// Month the book was finished, as `YYYY/MM`.
    pub read_date: Option<String>,
    pub motivation: Option<String>,
    /// Importance score, recomputed whenever the record changes.
    pub score: u32,
    /// Columns not listed in [`columns::KNOWN`], by header.
    #[serde(skip)]
    pub extra: HashMap<String, String>,
}

impl Book {
    /// First day of the month in `read_date`, if it parses.
    pub fn read_month(&self) -> Option<NaiveDate> {
        self.read_date.as_deref().and_then(parse_read_date)
    }

    /// Value for `header` as written to the CSV.
    pub(crate) fn cell(&self, header: &str) -> String {
        match header {
            columns::TITLE => self.title.clone(),
            columns::AUTHOR => self.author.clone(),
            columns::YEAR => opt_to_cell(self.year),
            columns::KIND => self.kind.clone(),
            columns::PRIORITY => self.priority.clone(),
            columns::STATUS => self.status.code().to_string(),
            columns::AVAILABILITY => self.availability.clone(),
            columns::CATEGORY => self.category.clone(),
            columns::ORDER => opt_to_cell(self.order),
            columns::RATING => opt_to_cell(self.rating),
            columns::READ_DATE => self.read_date.clone().unwrap_or_default(),
            columns::MOTIVATION => self.motivation.clone().unwrap_or_default(),
            columns::SCORE => self.score.to_string(),
            other => self.extra.get(other).cloned().unwrap_or_default(),
        }
    }

    /// Build a record from `(header, value)` pairs of one CSV row.
    ///
    /// Numeric cells are parsed leniently (`2019.0` is 2019); ratings outside
    /// 1–5 and unparseable numbers are treated as missing. The score is left
    /// at zero for the caller to compute.
    pub(crate) fn from_cells<'a, I>(cells: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut book = Book::default();
        for (header, value) in cells {
            let trimmed = value.trim();
            match header {
                columns::TITLE => book.title = trimmed.to_string(),
                columns::AUTHOR => book.author = trimmed.to_string(),
                columns::YEAR => {
                    book.year = parse_lenient_int(trimmed).and_then(|n| i32::try_from(n).ok())
                }
                columns::KIND => book.kind = trimmed.to_string(),
                columns::PRIORITY => book.priority = trimmed.to_string(),
                columns::STATUS => book.status = ReadingStatus::parse_cell(trimmed)?,
                columns::AVAILABILITY => book.availability = trimmed.to_string(),
                columns::CATEGORY => book.category = trimmed.to_string(),
                columns::ORDER => {
                    book.order = parse_lenient_int(trimmed).and_then(|n| u32::try_from(n).ok())
                }
                columns::RATING => {
                    book.rating = parse_lenient_int(trimmed)
                        .and_then(|n| u8::try_from(n).ok())
                        .filter(|r| (1..=5).contains(r))
                }
                columns::READ_DATE => book.read_date = non_empty(trimmed),
                columns::MOTIVATION => book.motivation = non_empty(trimmed),
                columns::SCORE => {}
                other => {
                    book.extra.insert(other.to_string(), value.to_string());
                }
            }
        }
        Ok(book)
    }
}

/// Parse `YYYY/MM` into the first day of that month.
pub fn parse_read_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}/01", raw.trim()), "%Y/%m/%d").ok()
}

/// Check a rating is 1–5.
pub fn validate_rating(rating: u8) -> Result<u8, FilekitError> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(FilekitError::InvalidInput(format!(
            "rating must be between 1 and 5, got {rating}"
        )))
    }
}

/// Check a read date is `YYYY/MM` and return it normalised (zero-padded month).
pub fn validate_read_date(raw: &str) -> Result<String, FilekitError> {
    parse_read_date(raw)
        .map(|d| d.format(READ_DATE_FORMAT).to_string())
        .ok_or_else(|| {
            FilekitError::InvalidInput(format!("read date must look like YYYY/MM, got '{raw}'"))
        })
}

/// Integers written by spreadsheet tools often come back as `2019.0`.
fn parse_lenient_int(raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn opt_to_cell<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
