//! Progress reporting for pipeline runs.
//!
//! The pipeline calls a [`ProgressCallback`] once per conversation, after the
//! conversation was skipped, analyzed or recorded as failed.
//!
//! # Example
//!
//! ```rust
//! use chatdigest::progress::{Progress, ProgressCallback};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|progress| {
//!     println!("{:.1}%", progress.percentage());
//! });
//!
//! for i in 0..4usize {
//!     callback(Progress::new(i + 1, 4));
//! }
//! ```

use std::sync::Arc;

/// Where a run stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Conversations handled so far, whatever the outcome.
    pub items_processed: usize,

    /// Conversations in the archive.
    pub total_items: usize,
}

impl Progress {
    pub fn new(items_processed: usize, total_items: usize) -> Self {
        Self {
            items_processed,
            total_items,
        }
    }

    /// Returns the progress as a percentage (0.0 - 100.0).
    ///
    /// An empty run counts as complete.
    ///
    /// ```rust
    /// use chatdigest::progress::Progress;
    ///
    /// assert_eq!(Progress::new(1, 4).percentage(), 25.0);
    /// assert_eq!(Progress::new(0, 0).percentage(), 100.0);
    /// ```
    pub fn percentage(&self) -> f64 {
        if self.total_items == 0 {
            100.0
        } else {
            (self.items_processed as f64 / self.total_items as f64) * 100.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.items_processed >= self.total_items
    }

    pub fn remaining(&self) -> usize {
        self.total_items.saturating_sub(self.items_processed)
    }
}

/// Callback type for receiving progress updates.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Creates a no-op progress callback.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Creates a progress callback that prints `[n/total]` lines to stderr.
pub fn stderr_progress() -> ProgressCallback {
    Arc::new(|progress| {
        eprintln!(
            "[{}/{}] {:.1}%",
            progress.items_processed,
            progress.total_items,
            progress.percentage()
        );
    })
}
