//! Progress-callback trait for per-item batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] into a batch operation
//! ([`crate::imaging::resize_batch`], or via
//! [`crate::config::RasterConfigBuilder::progress_callback`] for PDF
//! rasterisation) to receive an event as each item is processed.
//!
//! The trait is `Send + Sync` because PDF pages are rendered on the Tokio
//! blocking pool, not on the caller's thread.
//!
//! # Example
//!
//! ```rust
//! use filekit::BatchProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl BatchProgressCallback for Counter {
//!     fn on_item_complete(&self, _index: usize, _total: usize, _name: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by batch operations as they process each item.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Item indices are 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first item.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before an item is processed.
    fn on_item_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when an item was processed successfully.
    fn on_item_complete(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when an item failed; the batch continues.
    fn on_item_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every item has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle stored in configs.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
