//! Receive pipeline — inbound hub events to local clipboard.
//!
//! Invoked once per hub event, strictly in delivery order (the
//! subscription loop is the sole caller). Applies remote text through
//! the shared suppressed write path and (re)arms the restore scheduler
//! on every actual application.

use tokio::sync::mpsc;

use crate::clipboard::ClipboardError;
use crate::hub::SyncEvent;

use super::restore::{RestoreControl, RestorePolicy};
use super::writer::{ClipboardWriter, WriteOutcome};

pub struct ReceivePipeline {
    device: String,
    writer: ClipboardWriter,
    restore_tx: mpsc::UnboundedSender<RestoreControl>,
    policy: RestorePolicy,
}

impl ReceivePipeline {
    pub fn new(
        device: String,
        writer: ClipboardWriter,
        restore_tx: mpsc::UnboundedSender<RestoreControl>,
        policy: RestorePolicy,
    ) -> Self {
        Self {
            device,
            writer,
            restore_tx,
            policy,
        }
    }

    /// Apply one inbound hub event.
    ///
    /// # Errors
    ///
    /// Clipboard failures propagate; the subscription loop treats them
    /// as fatal.
    pub fn on_remote_event(&self, evt: SyncEvent) -> Result<(), ClipboardError> {
        // The hub shouldn't echo our own events back, but a fanned-out
        // misconfiguration must not turn into a write loop.
        if evt.device == self.device {
            tracing::debug!("ignoring our own event echoed by the hub");
            return Ok(());
        }

        match self.writer.write_if_changed(&evt.text)? {
            WriteOutcome::Unchanged => {
                tracing::debug!(from = %evt.device, "remote event matches clipboard, ignored");
            }
            WriteOutcome::Applied { previous } => {
                tracing::info!(from = %evt.device, bytes = evt.text.len(), "applied remote clipboard");
                let saved = match self.policy {
                    RestorePolicy::Previous => previous,
                    RestorePolicy::Clear | RestorePolicy::Off => String::new(),
                };
                let _ = self.restore_tx.send(RestoreControl::Arm { saved });
            }
        }
        Ok(())
    }
}
