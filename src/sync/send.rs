//! Send pipeline — local copy events to hub publishes.
//!
//! Driven by change-source ticks. Each tick either drains a pending
//! suppression token (the change was our own remote apply or revert) or
//! reads the clipboard once and forwards its content to the hub
//! publisher. Publication is fire-and-forget through an unbounded
//! channel; the pipeline never waits on the network.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::clipboard::{ClipboardError, ClipboardPort};
use crate::hub::SyncEvent;
use crate::source::ChangeTick;

use super::SyncError;
use super::restore::RestoreControl;
use super::suppress::SuppressSlot;

/// Texts outside `1..=MAX_TEXT_BYTES` are never published.
///
/// Empty reads usually mean a non-text clipboard owner (an image copy
/// leaves `text/plain` blank); oversized ones are dropped to bound hub
/// traffic.
pub const MAX_TEXT_BYTES: usize = 65536;

/// Handles one local-change tick at a time.
pub struct SendPipeline {
    device: String,
    clipboard: Arc<dyn ClipboardPort>,
    suppress: SuppressSlot,
    restore_tx: mpsc::UnboundedSender<RestoreControl>,
    publish_tx: mpsc::UnboundedSender<SyncEvent>,
}

impl SendPipeline {
    pub fn new(
        device: String,
        clipboard: Arc<dyn ClipboardPort>,
        suppress: SuppressSlot,
        restore_tx: mpsc::UnboundedSender<RestoreControl>,
        publish_tx: mpsc::UnboundedSender<SyncEvent>,
    ) -> Self {
        Self {
            device,
            clipboard,
            suppress,
            restore_tx,
            publish_tx,
        }
    }

    /// Process one detected local clipboard change.
    ///
    /// # Errors
    ///
    /// A clipboard read failure propagates; the caller treats it as
    /// fatal.
    pub fn on_local_change(&mut self) -> Result<(), ClipboardError> {
        // Self-inflicted change: a remote apply or a revert just wrote
        // the clipboard. Drop the tick entirely.
        if self.suppress.consume() {
            tracing::debug!("local change suppressed (own write)");
            return Ok(());
        }

        let text = self.clipboard.read()?;

        // A genuine local copy invalidates any scheduled revert, even
        // when the content itself won't be published.
        let _ = self.restore_tx.send(RestoreControl::Cancel);

        if text.is_empty() || text.len() > MAX_TEXT_BYTES {
            tracing::debug!(bytes = text.len(), "skipping empty/oversized clipboard");
            return Ok(());
        }

        let _ = self.publish_tx.send(SyncEvent {
            text,
            device: self.device.clone(),
        });
        Ok(())
    }
}

/// Drive a [`SendPipeline`] from the change-source tick channel.
///
/// Ends quietly when the tick channel closes; a clipboard failure is
/// reported through `fatal_tx` and ends the task.
pub fn spawn_send_loop(
    mut pipeline: SendPipeline,
    mut ticks: mpsc::UnboundedReceiver<ChangeTick>,
    fatal_tx: mpsc::UnboundedSender<SyncError>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while ticks.recv().await.is_some() {
            if let Err(e) = pipeline.on_local_change() {
                let _ = fatal_tx.send(e.into());
                return;
            }
        }
        tracing::debug!("change source closed, send loop ending");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::MemoryClipboard;
    use crate::sync::suppress;

    struct Fixture {
        pipeline: SendPipeline,
        setter: suppress::SuppressSetter,
        restore_rx: mpsc::UnboundedReceiver<RestoreControl>,
        publish_rx: mpsc::UnboundedReceiver<SyncEvent>,
    }

    fn fixture(clipboard_text: &str) -> Fixture {
        let clip = Arc::new(MemoryClipboard::with_text(clipboard_text));
        let (setter, slot) = suppress::single_slot();
        let (restore_tx, restore_rx) = mpsc::unbounded_channel();
        let (publish_tx, publish_rx) = mpsc::unbounded_channel();
        let pipeline = SendPipeline::new("laptop".into(), clip, slot, restore_tx, publish_tx);
        Fixture {
            pipeline,
            setter,
            restore_rx,
            publish_rx,
        }
    }

    #[tokio::test]
    async fn publishes_local_copy() {
        let mut f = fixture("hello");
        f.pipeline.on_local_change().unwrap();

        let evt = f.publish_rx.try_recv().unwrap();
        assert_eq!(evt.text, "hello");
        assert_eq!(evt.device, "laptop");
        assert!(matches!(
            f.restore_rx.try_recv(),
            Ok(RestoreControl::Cancel)
        ));
    }

    #[tokio::test]
    async fn suppressed_tick_publishes_nothing() {
        let mut f = fixture("hello");
        f.setter.set();
        f.pipeline.on_local_change().unwrap();

        assert!(f.publish_rx.try_recv().is_err());
        // A suppressed tick is not a genuine local event: it must not
        // cancel a pending restore either.
        assert!(f.restore_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_clipboard_is_not_published_but_cancels_restore() {
        let mut f = fixture("");
        f.pipeline.on_local_change().unwrap();

        assert!(f.publish_rx.try_recv().is_err());
        assert!(matches!(
            f.restore_rx.try_recv(),
            Ok(RestoreControl::Cancel)
        ));
    }

    #[tokio::test]
    async fn oversized_clipboard_is_not_published() {
        let big = "x".repeat(MAX_TEXT_BYTES + 1);
        let mut f = fixture(&big);
        f.pipeline.on_local_change().unwrap();
        assert!(f.publish_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn max_sized_clipboard_is_published() {
        let exact = "x".repeat(MAX_TEXT_BYTES);
        let mut f = fixture(&exact);
        f.pipeline.on_local_change().unwrap();
        assert_eq!(f.publish_rx.try_recv().unwrap().text, exact);
    }

    #[tokio::test]
    async fn suppression_lasts_one_tick() {
        let mut f = fixture("hello");
        f.setter.set();
        f.pipeline.on_local_change().unwrap();
        assert!(f.publish_rx.try_recv().is_err());

        // The next tick is genuine again.
        f.pipeline.on_local_change().unwrap();
        assert_eq!(f.publish_rx.try_recv().unwrap().text, "hello");
    }
}
