//! Debug-only diagnostics
//!
//! Notices about misuse (direct calls that should go through a filter,
//! taxonomies without image support, queries outside a term archive).
//! They are logged only when the debug flag is on and never change the
//! caller's control flow.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Log target for diagnostics
pub const DIAGNOSTICS_TARGET: &str = "taxonomy_images::diagnostics";

/// Request-scoped diagnostics sink
#[derive(Debug, Default)]
pub struct Diagnostics {
    enabled: bool,
    emitted: AtomicUsize,
}

impl Diagnostics {
    /// Create sink; `enabled` is the host debug flag
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            emitted: AtomicUsize::new(0),
        }
    }

    /// Emit a notice attributed to `function`
    pub fn notice(&self, function: &str, message: &str) {
        if !self.enabled {
            return;
        }
        self.emitted.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(target: DIAGNOSTICS_TARGET, function, "{message}");
    }

    /// Direct call to a function that should be reached through a filter
    pub fn use_filter(&self, function: &str, filter: &str) {
        if self.enabled {
            self.notice(
                function,
                &format!("{function} has been called directly. Please use the {filter} filter instead."),
            );
        }
    }

    /// Debug flag state
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Notices emitted so far
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::Relaxed)
    }
}
