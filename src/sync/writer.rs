//! Suppressed clipboard write path.
//!
//! Both clipboard writers in the daemon (the receive pipeline and the
//! restore scheduler) funnel through [`ClipboardWriter::write_if_changed`]:
//! one read to compare, suppression token set, then the write. Equal
//! content is a no-op that perturbs neither suppression nor restoration
//! state — other programs monitor the clipboard too, and an extraneous
//! write would fan out spurious change events to all of them.

use std::sync::Arc;

use crate::clipboard::{ClipboardError, ClipboardPort};

use super::suppress::SuppressSetter;

/// Result of a compare-first clipboard write.
#[derive(Debug, PartialEq)]
pub enum WriteOutcome {
    /// The clipboard already held this text; nothing was written.
    Unchanged,
    /// The text was applied; `previous` is what it overwrote.
    Applied { previous: String },
}

/// Shared suppression-guarded write path.
#[derive(Clone)]
pub struct ClipboardWriter {
    clipboard: Arc<dyn ClipboardPort>,
    suppress: SuppressSetter,
}

impl ClipboardWriter {
    pub fn new(clipboard: Arc<dyn ClipboardPort>, suppress: SuppressSetter) -> Self {
        Self {
            clipboard,
            suppress,
        }
    }

    /// Write `text` to the clipboard unless it is already there.
    ///
    /// The suppression token is set immediately before the write so the
    /// change-watcher tick this write provokes is not re-published as a
    /// fresh local copy.
    ///
    /// # Errors
    ///
    /// Clipboard read/write failures propagate; the caller treats them
    /// as fatal.
    pub fn write_if_changed(&self, text: &str) -> Result<WriteOutcome, ClipboardError> {
        let current = self.clipboard.read()?;
        if current == text {
            return Ok(WriteOutcome::Unchanged);
        }

        self.suppress.set();
        self.clipboard.write(text)?;
        Ok(WriteOutcome::Applied { previous: current })
    }
}
