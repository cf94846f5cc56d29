//! Echo suppressor — single-slot, non-blocking signal.
//!
//! The receive pipeline (and the restore scheduler, which writes through
//! the same path) sets a token immediately before writing the clipboard.
//! The send pipeline consumes it at the start of the next local-change
//! tick and drops that tick: the change was self-inflicted, not a user
//! copy.
//!
//! Both ends are non-blocking. The setter runs on the remote-event path
//! and must not stall behind a slow consumer; the consumer runs on the
//! local-tick path and must not wait for a token that may never come.
//! At most one token is buffered: a second `set` while one is pending is
//! silently dropped.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Create a connected setter/slot pair.
pub fn single_slot() -> (SuppressSetter, SuppressSlot) {
    let (tx, rx) = mpsc::channel(1);
    (SuppressSetter { tx }, SuppressSlot { rx })
}

/// Producer half. Cloneable — held by every clipboard writer.
#[derive(Clone)]
pub struct SuppressSetter {
    tx: mpsc::Sender<()>,
}

impl SuppressSetter {
    /// Enqueue a suppression token. No-op if one is already pending.
    pub fn set(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Consumer half. Owned by the send pipeline.
pub struct SuppressSlot {
    rx: mpsc::Receiver<()>,
}

impl SuppressSlot {
    /// Take the pending token if there is one. Never blocks.
    pub fn consume(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn consume_without_set_is_absent() {
        let (_setter, mut slot) = single_slot();
        assert!(!slot.consume());
    }

    #[tokio::test]
    async fn set_then_consume() {
        let (setter, mut slot) = single_slot();
        setter.set();
        assert!(slot.consume());
        assert!(!slot.consume());
    }

    #[tokio::test]
    async fn burst_of_sets_yields_one_token() {
        let (setter, mut slot) = single_slot();
        setter.set();
        setter.set();
        setter.set();
        assert!(slot.consume());
        // The slot must be empty after the single consume.
        assert!(!slot.consume());
    }

    #[tokio::test]
    async fn setters_are_cloneable() {
        let (setter, mut slot) = single_slot();
        let other = setter.clone();
        other.set();
        assert!(slot.consume());
    }
}
