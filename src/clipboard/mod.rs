//! Clipboard port — system clipboard read/write abstraction.
//!
//! The sync core never touches platform clipboard mechanisms directly;
//! it goes through [`ClipboardPort`]. The shipped implementation shells
//! out to the platform's clipboard tool ([`command::CommandClipboard`]).
//!
//! Clipboard access is a baseline platform guarantee for the process's
//! lifetime: any read/write failure here is fatal to the daemon.

pub mod command;

use std::sync::Arc;

use command::CommandClipboard;

/// Errors from clipboard access.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("{tool} exited with status {status}")]
    ToolFailed {
        tool: String,
        status: std::process::ExitStatus,
    },

    #[error("I/O error talking to {tool}: {source}")]
    Pipe {
        tool: String,
        source: std::io::Error,
    },

    /// The clipboard holds bytes that aren't UTF-8 text.
    #[error("clipboard content is not valid UTF-8 text")]
    NotText,

    #[error("no clipboard integration for this platform")]
    Unsupported,
}

/// Reads and writes the system clipboard.
///
/// `Send + Sync` is required because the receive pipeline and the
/// restore scheduler both invoke clipboard operations from async task
/// contexts.
pub trait ClipboardPort: Send + Sync {
    /// Read the current clipboard text.
    fn read(&self) -> Result<String, ClipboardError>;

    /// Replace the clipboard content with the given text.
    fn write(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Construct the platform clipboard adapter.
///
/// # Errors
///
/// Returns `ClipboardError::Unsupported` on platforms without a known
/// clipboard tool.
pub fn system() -> Result<Arc<dyn ClipboardPort>, ClipboardError> {
    #[cfg(target_os = "linux")]
    {
        Ok(Arc::new(CommandClipboard::xclip()))
    }
    #[cfg(target_os = "macos")]
    {
        Ok(Arc::new(CommandClipboard::pasteboard()))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Err(ClipboardError::Unsupported)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory clipboard fake shared by the sync core tests.

    use std::sync::Mutex;

    use super::{ClipboardError, ClipboardPort};

    /// Clipboard backed by a mutex-guarded string. Records write counts
    /// so tests can assert that equal content is never re-written.
    #[derive(Default)]
    pub struct MemoryClipboard {
        content: Mutex<String>,
        writes: Mutex<u32>,
    }

    impl MemoryClipboard {
        pub fn with_text(text: &str) -> Self {
            Self {
                content: Mutex::new(text.to_string()),
                writes: Mutex::new(0),
            }
        }

        pub fn text(&self) -> String {
            self.content.lock().unwrap().clone()
        }

        pub fn write_count(&self) -> u32 {
            *self.writes.lock().unwrap()
        }
    }

    impl ClipboardPort for MemoryClipboard {
        fn read(&self) -> Result<String, ClipboardError> {
            Ok(self.content.lock().unwrap().clone())
        }

        fn write(&self, text: &str) -> Result<(), ClipboardError> {
            *self.content.lock().unwrap() = text.to_string();
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }
    }
}
