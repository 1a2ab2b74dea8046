//! Progress-callback trait for per-page generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::PdfConfigBuilder::progress_callback`] to receive events
//! as the pipeline renders and embeds each page.
//!
//! Callbacks are the least-invasive integration point: callers can forward
//! events to a channel, a progress bar, or a log without the library knowing
//! how the host application communicates. [`crate::stream::generate_stream`]
//! is itself built on top of this trait.
//!
//! # Example
//!
//! ```rust
//! use edgequake_page2pdf::{GenerationProgressCallback, PdfConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     embedded: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, encoded_bytes: usize) {
//!         self.embedded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} embedded ({} bytes)", page_num, total_pages, encoded_bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { embedded: AtomicUsize::new(0) });
//!
//! let config = PdfConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PdfError;
use std::sync::Arc;

/// Called by the generator as it processes each page.
///
/// Pages are processed strictly in order, so events for page N always arrive
/// before events for page N + 1. Implementations must still be `Send + Sync`:
/// the generator may run on any runtime worker thread.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once, after page registration, before any page is rendered.
    fn on_generation_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the render collaborator is invoked for a page.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been embedded into the document.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: total pages
    /// * `encoded_bytes`: compressed image bytes added for this page
    fn on_page_complete(&self, page_num: usize, total_pages: usize, encoded_bytes: usize) {
        let _ = (page_num, total_pages, encoded_bytes);
    }

    /// Called once after the document was written.
    fn on_generation_complete(&self, page_count: usize, file_size: u64) {
        let _ = (page_count, file_size);
    }

    /// Called once when the generation aborts.
    fn on_generation_failed(&self, error: &PdfError) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PdfConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
