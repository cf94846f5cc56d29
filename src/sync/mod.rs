//! Sync coordinator — the concurrency core of the daemon.
//!
//! Mediates between three event sources: local "clipboard changed"
//! ticks, the hub's remote event stream, and the restore timer. One
//! tokio task per component; the only shared state is the single-slot
//! echo suppressor and the restore scheduler's control channel.
//!
//! Echo loops are the central hazard: a remote apply provokes a local
//! change tick, which must not be re-published as a fresh copy. Every
//! clipboard write funnels through [`writer::ClipboardWriter`], which
//! sets the suppression token first; the send pipeline drains the token
//! and drops the corresponding tick.

pub mod recv;
pub mod restore;
pub mod send;
pub mod suppress;
pub mod writer;

use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

use crate::clipboard::{self, ClipboardError};
use crate::hub::{HubClient, HubError};
use crate::source;

use recv::ReceivePipeline;
use restore::RestorePolicy;
use send::SendPipeline;
use writer::ClipboardWriter;

/// Immutable runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Hub base URL, e.g. `https://hub.example.net`.
    pub url: String,
    /// This device's identity; stamped on outbound events and used to
    /// discard our own echoes.
    pub device: String,
    pub restore_policy: RestorePolicy,
    pub restore_after: Duration,
}

/// Fatal coordinator errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("clipboard: {0}")]
    Clipboard(#[from] ClipboardError),

    #[error("hub: {0}")]
    Hub(#[from] HubError),

    #[error("change source: {0}")]
    Source(#[from] source::SourceError),

    /// The hub closed the event stream. There is no resubscription
    /// logic; the process restarts instead.
    #[error("hub event stream ended")]
    StreamEnded,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the coordinator until a fatal error or a shutdown signal.
///
/// # Errors
///
/// Returns the first fatal condition: clipboard access failure, a
/// watcher that exhausted its retries, or a terminated hub stream.
pub async fn run(config: SyncConfig) -> Result<(), SyncError> {
    let clipboard = clipboard::system()?;
    let hub = HubClient::new(&config.url)?;

    // Shared primitives: the suppression slot pair and the restore
    // control channel. Nothing else crosses task boundaries.
    let (suppress_tx, suppress_slot) = suppress::single_slot();
    let (restore_tx, restore_rx) = mpsc::unbounded_channel();
    let (publish_tx, publish_rx) = mpsc::unbounded_channel();
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<SyncError>();

    let writer = ClipboardWriter::new(clipboard.clone(), suppress_tx);

    // Local change detection. When unavailable, the daemon runs
    // receive-only and restoration stays disabled: a revert without
    // change detection could clobber a copy we'd never see.
    let change_source = source::spawn();
    let restore_enabled =
        change_source.is_some() && config.restore_policy != RestorePolicy::Off;

    tracing::info!(
        device = %config.device,
        url = %config.url,
        sending = change_source.is_some(),
        restore = restore_enabled,
        "starting sync"
    );

    restore::spawn(
        writer.clone(),
        restore_rx,
        config.restore_after,
        restore_enabled,
        fatal_tx.clone(),
    );
    crate::hub::spawn_publisher(hub.clone(), publish_rx);

    if let Some(src) = change_source {
        let pipeline = SendPipeline::new(
            config.device.clone(),
            clipboard,
            suppress_slot,
            restore_tx.clone(),
            publish_tx,
        );
        send::spawn_send_loop(pipeline, src.ticks, fatal_tx.clone());

        // Escalate watcher retry exhaustion to a fatal error.
        let ftx = fatal_tx.clone();
        tokio::spawn(async move {
            if let Ok(Err(e)) = src.handle.await {
                let _ = ftx.send(e.into());
            }
        });
    }

    let receiver = ReceivePipeline::new(
        config.device.clone(),
        writer,
        restore_tx,
        config.restore_policy,
    );

    // The subscription is consumed here in the foreground so remote
    // events are applied strictly in delivery order.
    let receive = async {
        let mut events = hub.events().await?;
        loop {
            match events.next_event().await? {
                Some(evt) => receiver.on_remote_event(evt)?,
                None => return Err::<(), SyncError>(SyncError::StreamEnded),
            }
        }
    };
    tokio::pin!(receive);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        res = &mut receive => res,
        Some(err) = fatal_rx.recv() => Err(err),
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM, shutting down");
            Ok(())
        }
        _ = sigint.recv() => {
            tracing::info!("received SIGINT, shutting down");
            Ok(())
        }
    }
}
