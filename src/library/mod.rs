//! Reading tracker: a CSV reading list with an importance score,
//! statistics, table filters, a cover wall and AI-assisted entry.

pub mod analysis;
pub mod covers;
pub mod query;
pub mod record;
pub mod score;
pub mod store;
pub mod suggest;

pub use analysis::{library_stats, timeline, Granularity, LibraryStats, TimelineGroup};
pub use covers::{build_mural, CoverIndex, Mural};
pub use query::BookFilter;
pub use record::{Book, ReadingStatus};
pub use score::importance_score;
pub use store::{Library, StatusUpdate};
pub use suggest::{suggest_book_details, BookSuggestion};

/// Environment variable naming the reading-list CSV.
pub const BOOKS_CSV_ENV: &str = "FILEKIT_BOOKS_CSV";
