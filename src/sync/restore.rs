//! Restore scheduler — cancellable one-shot revert timer.
//!
//! After a remote event is applied locally, the scheduler arms a timer.
//! If no genuine local copy happens within the idle window, the
//! clipboard is reverted to a remembered value (or cleared, per
//! policy). Any genuine local-change tick cancels the pending revert —
//! the user's own copy must never be yanked out from under them.
//!
//! Channel-based actor: a single task owns the IDLE/ARMED state and is
//! driven by [`RestoreControl`] messages plus its own deadline. The
//! firing write goes through the shared suppressed write path, so a
//! revert is never re-published to the hub and is idempotent against
//! equal content. Cancellation is best-effort: a cancel that races an
//! already-firing timer is harmless for the same two reasons.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::SyncError;
use super::writer::ClipboardWriter;

/// What to put back in the clipboard when the idle window elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RestorePolicy {
    /// Clear the clipboard (write the empty string).
    Clear,
    /// Restore the text the remote event overwrote.
    Previous,
    /// Never revert.
    Off,
}

/// Control messages for the scheduler task.
#[derive(Debug)]
pub enum RestoreControl {
    /// A genuine local copy happened; drop any pending revert.
    Cancel,
    /// A remote event was applied; (re)schedule a revert to `saved`.
    Arm { saved: String },
}

/// Spawn the scheduler task.
///
/// `enabled` is resolved once at startup: restoration requires a
/// working change source (otherwise a revert could fire with no way to
/// detect the user's next copy) and a policy other than `off`. When
/// disabled, `Arm` messages are accepted and ignored.
///
/// The task ends when the control channel closes. A failing revert
/// write is reported through `fatal_tx` — clipboard access is fatal
/// everywhere in this daemon.
pub fn spawn(
    writer: ClipboardWriter,
    mut control_rx: mpsc::UnboundedReceiver<RestoreControl>,
    window: Duration,
    enabled: bool,
    fatal_tx: mpsc::UnboundedSender<SyncError>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut deadline: Option<Instant> = None;
        let mut saved = String::new();

        loop {
            // Disabled branches still evaluate their future expression,
            // so give the sleep a real instant even when idle.
            let sleep_until = deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                ctrl = control_rx.recv() => match ctrl {
                    None => return,
                    Some(RestoreControl::Cancel) => {
                        if deadline.take().is_some() {
                            tracing::debug!("pending restore cancelled by local change");
                        }
                    }
                    Some(RestoreControl::Arm { saved: text }) => {
                        if enabled {
                            saved = text;
                            deadline = Some(Instant::now() + window);
                            tracing::debug!(window_secs = window.as_secs(), "restore armed");
                        }
                    }
                },

                _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                    deadline = None;
                    tracing::info!("idle window elapsed, reverting clipboard");
                    if let Err(e) = writer.write_if_changed(&saved) {
                        let _ = fatal_tx.send(e.into());
                        return;
                    }
                }
            }
        }
    })
}
