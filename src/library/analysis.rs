//! Reading statistics: status counts, rating/score summaries, timelines and
//! category/type frequencies.

use crate::library::record::{Book, ReadingStatus};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Counts by status plus the number of distinct categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusOverview {
    pub read: usize,
    pub to_read: usize,
    pub reading: usize,
    pub categories: usize,
}

/// Minimum, mean and maximum of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub count: usize,
}

impl NumericSummary {
    /// `None` when `values` is empty.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            min,
            mean: sum / count as f64,
            max,
            count,
        })
    }
}

/// Period length used to bucket finished books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Granularity {
    /// `YYYY-MM`
    #[default]
    Month,
    /// `YYYY`
    Year,
}

impl Granularity {
    fn format(self) -> &'static str {
        match self {
            Granularity::Month => "%Y-%m",
            Granularity::Year => "%Y",
        }
    }
}

/// Optional second grouping key for the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TimelineGroup {
    #[default]
    Overall,
    Kind,
    Category,
}

/// Books finished in one period (and group, when grouped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub period: String,
    pub group: Option<String>,
    pub count: usize,
}

/// All statistics for the analysis view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryStats {
    pub overview: StatusOverview,
    pub ratings: Option<NumericSummary>,
    pub scores: Option<NumericSummary>,
    pub read_by_category: Vec<(String, usize)>,
    pub all_by_category: Vec<(String, usize)>,
    pub read_by_kind: Vec<(String, usize)>,
    pub all_by_kind: Vec<(String, usize)>,
}

pub fn status_overview(books: &[Book]) -> StatusOverview {
    let mut overview = StatusOverview::default();
    let mut categories = BTreeSet::new();
    for book in books {
        match book.status {
            ReadingStatus::Read => overview.read += 1,
            ReadingStatus::ToRead => overview.to_read += 1,
            ReadingStatus::Reading => overview.reading += 1,
        }
        if !book.category.is_empty() {
            categories.insert(book.category.as_str());
        }
    }
    overview.categories = categories.len();
    overview
}

pub fn rating_summary(books: &[Book]) -> Option<NumericSummary> {
    NumericSummary::from_values(books.iter().filter_map(|b| b.rating.map(f64::from)))
}

pub fn score_summary(books: &[Book]) -> Option<NumericSummary> {
    NumericSummary::from_values(books.iter().map(|b| f64::from(b.score)))
}

/// Finished books per period, sorted by period then group. Books without a
/// parseable read date are left out.
pub fn timeline(
    books: &[Book],
    granularity: Granularity,
    group: TimelineGroup,
) -> Vec<TimelinePoint> {
    let mut buckets: BTreeMap<(String, Option<String>), usize> = BTreeMap::new();
    for book in books {
        let Some(month) = book.read_month() else {
            continue;
        };
        let period = month.format(granularity.format()).to_string();
        let key = match group {
            TimelineGroup::Overall => None,
            TimelineGroup::Kind => Some(book.kind.clone()),
            TimelineGroup::Category => Some(book.category.clone()),
        };
        *buckets.entry((period, key)).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|((period, group), count)| TimelinePoint {
            period,
            group,
            count,
        })
        .collect()
}

/// Frequency of `field` over `books`, most frequent first, ties by name.
/// Empty values are not counted.
pub fn value_counts<'a, F>(
    books: impl IntoIterator<Item = &'a Book>,
    field: F,
) -> Vec<(String, usize)>
where
    F: Fn(&'a Book) -> &'a str,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for book in books {
        let value = field(book);
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Everything the analysis view shows.
pub fn library_stats(books: &[Book]) -> LibraryStats {
    let read = || books.iter().filter(|b| b.status == ReadingStatus::Read);
    LibraryStats {
        overview: status_overview(books),
        ratings: rating_summary(books),
        scores: score_summary(books),
        read_by_category: value_counts(read(), |b| b.category.as_str()),
        all_by_category: value_counts(books, |b| b.category.as_str()),
        read_by_kind: value_counts(read(), |b| b.kind.as_str()),
        all_by_kind: value_counts(books, |b| b.kind.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(
        status: ReadingStatus,
        kind: &str,
        cat: &str,
        rating: Option<u8>,
        date: Option<&str>,
    ) -> Book {
        Book {
            title: format!("{cat}-{kind}"),
            status,
            kind: kind.into(),
            category: cat.into(),
            rating,
            read_date: date.map(str::to_string),
            ..Book::default()
        }
    }

    fn shelf() -> Vec<Book> {
        use ReadingStatus::*;
        const NOIR: &str = "Noir & Engenharia do Mistério";
        const STATS: &str = "Estatística & Incerteza";
        vec![
            book(Read, "Técnico", "Design & UX", Some(4), Some("2024/01")),
            book(Read, "Técnico", "Design & UX", Some(2), Some("2024/01")),
            book(Read, "Não Técnico", NOIR, Some(5), Some("2024/03")),
            book(Read, "Não Técnico", NOIR, None, Some("bad")),
            book(ToRead, "Técnico", STATS, None, None),
            book(Reading, "Técnico", STATS, None, None),
        ]
    }

    #[test]
    fn overview_counts() {
        let o = status_overview(&shelf());
        assert_eq!(
            o,
            StatusOverview {
                read: 4,
                to_read: 1,
                reading: 1,
                categories: 3
            }
        );
    }

    #[test]
    fn rating_summary_ignores_missing() {
        let s = rating_summary(&shelf()).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 5.0);
        assert!((s.mean - 11.0 / 3.0).abs() < 1e-9);
        assert!(rating_summary(&[]).is_none());
    }

    #[test]
    fn monthly_timeline_overall() {
        let t = timeline(&shelf(), Granularity::Month, TimelineGroup::Overall);
        assert_eq!(
            t,
            vec![
                TimelinePoint {
                    period: "2024-01".into(),
                    group: None,
                    count: 2
                },
                TimelinePoint {
                    period: "2024-03".into(),
                    group: None,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn yearly_timeline_by_kind() {
        let t = timeline(&shelf(), Granularity::Year, TimelineGroup::Kind);
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].period, "2024");
        assert_eq!(t[0].group.as_deref(), Some("Não Técnico"));
        assert_eq!(t[0].count, 1);
        assert_eq!(t[1].group.as_deref(), Some("Técnico"));
        assert_eq!(t[1].count, 2);
    }

    #[test]
    fn value_counts_sorted_by_frequency() {
        let books = shelf();
        let stats = library_stats(&books);
        assert_eq!(
            stats.read_by_category,
            vec![
                ("Design & UX".to_string(), 2),
                ("Noir & Engenharia do Mistério".to_string(), 2),
            ]
        );
        assert_eq!(stats.all_by_kind[0], ("Técnico".to_string(), 4));
    }
}
