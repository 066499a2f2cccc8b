//! Filtering and ordering for the book table.

use crate::library::record::{Book, ReadingStatus};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Table filters. Empty lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive substring of the title or author.
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub statuses: Vec<ReadingStatus>,
    pub priorities: Vec<String>,
    /// Inclusive publication-year range. Books without a year are excluded
    /// when set.
    pub year_range: Option<(i32, i32)>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(ref q) = self.search {
            let q = q.trim().to_lowercase();
            if !q.is_empty()
                && !book.title.to_lowercase().contains(&q)
                && !book.author.to_lowercase().contains(&q)
            {
                return false;
            }
        }
        if !self.categories.is_empty() && !self.categories.contains(&book.category) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&book.status) {
            return false;
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&book.priority) {
            return false;
        }
        if let Some((lo, hi)) = self.year_range {
            match book.year {
                Some(y) if y >= lo && y <= hi => {}
                _ => return false,
            }
        }
        true
    }

    /// Whether the only status filter is "to read", which switches the
    /// ordering to the planned reading order.
    pub fn is_reading_queue(&self) -> bool {
        self.statuses == [ReadingStatus::ToRead]
    }

    /// Matching books, ordered.
    ///
    /// The reading queue is sorted by planned order ascending; everything
    /// else by rating descending. Missing values go last and ties keep file
    /// order.
    pub fn apply<'a>(&self, books: &'a [Book]) -> Vec<&'a Book> {
        let mut out: Vec<&Book> = books.iter().filter(|b| self.matches(b)).collect();
        if self.is_reading_queue() {
            out.sort_by(|a, b| none_last(a.order, b.order, |x, y| x.cmp(&y)));
        } else {
            out.sort_by(|a, b| none_last(a.rating, b.rating, |x, y| y.cmp(&x)));
        }
        out
    }
}

fn none_last<T: Copy>(a: Option<T>, b: Option<T>, cmp: impl Fn(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Smallest and largest positive publication year.
pub fn year_bounds(books: &[Book]) -> Option<(i32, i32)> {
    let years = books.iter().filter_map(|b| b.year).filter(|y| *y > 0);
    years.fold(None, |acc, y| match acc {
        None => Some((y, y)),
        Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
    })
}

/// Sorted distinct non-empty categories.
pub fn distinct_categories(books: &[Book]) -> Vec<String> {
    distinct(books.iter().map(|b| b.category.as_str()))
}

/// Sorted distinct non-empty priorities.
pub fn distinct_priorities(books: &[Book]) -> Vec<String> {
    distinct(books.iter().map(|b| b.priority.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
