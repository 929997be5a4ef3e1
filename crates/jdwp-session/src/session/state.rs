//! Session state machine and the state shared between the session handle
//! and its two loops.
//!
//! The state field and the correlation table live behind one
//! `std::sync::Mutex` so a state change and the table it guards can never
//! be observed half-done.  The lock is only ever held for a few map
//! operations and never across an `.await`.  The loops poll an atomic copy
//! of the state instead of taking the lock.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use jdwp_core::{ReplyFrame, ReplyPacket, SequenceCounter};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use crate::error::SessionError;
use crate::session::pending::CorrelationTable;

/// Lifecycle of a [`Session`](crate::Session).
///
/// ```text
///  Closed ──start()──▶ Handshaking ──ok──▶ Open ──stop()──▶ Closed
///                           │               │
///                           └──error──▶ Failed ◀──I/O or framing error
/// ```
///
/// A session that has left `Open` cannot be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Closed = 0,
    Handshaking = 1,
    Open = 2,
    Failed = 3,
}

impl SessionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SessionState::Handshaking,
            2 => SessionState::Open,
            3 => SessionState::Failed,
            _ => SessionState::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Closed => "closed",
            SessionState::Handshaking => "handshaking",
            SessionState::Open => "open",
            SessionState::Failed => "failed",
        })
    }
}

// ── Shared state ──────────────────────────────────────────────────────────────

pub(crate) struct Inner {
    state: SessionState,
    pending: CorrelationTable,
}

/// Everything the session handle, the loops, and outstanding reply slots
/// need to agree on.
pub(crate) struct Shared {
    inner: Mutex<Inner>,
    /// Lock-free copy of `inner.state`, written only while holding the lock.
    snapshot: AtomicU8,
    sequence: SequenceCounter,
    /// Flips to `true` once the session is closed or failed; both loops
    /// select on it.
    stop: watch::Sender<bool>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            inner: Mutex::new(Inner {
                state: SessionState::Closed,
                pending: CorrelationTable::default(),
            }),
            snapshot: AtomicU8::new(SessionState::Closed as u8),
            sequence: SequenceCounter::new(),
            stop,
        }
    }

    /// Current state, read without taking the lock.
    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.snapshot.load(Ordering::Acquire))
    }

    pub(crate) fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop.subscribe()
    }

    /// Moves `from` → `to`, or reports the state that blocked the move.
    pub(crate) fn transition(
        &self,
        operation: &'static str,
        from: SessionState,
        to: SessionState,
    ) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.state != from {
            return Err(SessionError::InvalidState {
                operation,
                state: inner.state,
            });
        }
        self.set_state(&mut inner, to);
        Ok(())
    }

    /// Marks an open session as failed.
    ///
    /// Returns `false` when the session had already left `Open`, so a racing
    /// `stop()` is never overwritten.
    pub(crate) fn fail_if_open(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != SessionState::Open {
            return false;
        }
        self.set_state(&mut inner, SessionState::Failed);
        true
    }

    /// Allocates an id and registers `slot` under it.
    ///
    /// Ids still in flight are skipped, so a wrapped counter never
    /// overwrites a live entry.
    pub(crate) fn register(
        &self,
        slot: oneshot::Sender<ReplyPacket>,
    ) -> Result<u32, SessionError> {
        let mut inner = self.lock();
        if inner.state != SessionState::Open {
            return Err(SessionError::InvalidState {
                operation: "submit a command",
                state: inner.state,
            });
        }
        let id = loop {
            let id = self.sequence.next();
            if !inner.pending.contains(id) {
                break id;
            }
            debug!("skipping id {id}: still in flight");
        };
        inner.pending.insert(id, slot);
        Ok(id)
    }

    /// Delivers a reply to the caller waiting on its id.
    pub(crate) fn complete(&self, frame: ReplyFrame) -> Result<(), SessionError> {
        self.lock().pending.complete(frame.id, frame.packet)
    }

    /// Forgets a pending request; its slot resolves as closed.
    pub(crate) fn cancel(&self, id: u32) -> bool {
        self.lock().pending.remove(id)
    }

    /// Closes every pending slot without a value and returns how many there were.
    pub(crate) fn release_pending(&self) -> usize {
        self.lock().pending.drain()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Resolves once the stop signal has been raised, including when it was
    /// raised before this call.
    pub(crate) async fn stopped(stop: &mut watch::Receiver<bool>) {
        // An error means the sender is gone, which only happens when the
        // shared state itself is being dropped.
        let _ = stop.wait_for(|stopped| *stopped).await;
    }

    /// Wakes both loops without touching the state.
    pub(crate) fn signal_stop(&self) {
        self.stop.send_replace(true);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // No code path panics while holding the lock, but a poisoned map is
        // still consistent: every operation on it is a single insert/remove.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, inner: &mut Inner, to: SessionState) {
        let from = inner.state;
        inner.state = to;
        self.snapshot.store(to as u8, Ordering::Release);
        if from != to {
            info!("session {from} -> {to}");
        }
        if matches!(to, SessionState::Closed | SessionState::Failed) {
            self.stop.send_replace(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_shared() -> Shared {
        let shared = Shared::new();
        shared
            .transition("start", SessionState::Closed, SessionState::Handshaking)
            .unwrap();
        shared
            .transition("start", SessionState::Handshaking, SessionState::Open)
            .unwrap();
        shared
    }

    #[test]
    fn test_new_shared_state_is_closed() {
        assert_eq!(Shared::new().state(), SessionState::Closed);
    }

    #[test]
    fn test_transition_from_wrong_state_is_rejected() {
        // Arrange
        let shared = Shared::new();

        // Act
        let result = shared.transition("stop", SessionState::Open, SessionState::Closed);

        // Assert
        assert!(matches!(
            result,
            Err(SessionError::InvalidState {
                operation: "stop",
                state: SessionState::Closed
            })
        ));
        assert_eq!(shared.state(), SessionState::Closed);
    }

    #[test]
    fn test_fail_if_open_does_not_overwrite_closed() {
        // Arrange – a stop() won the race
        let shared = open_shared();
        shared
            .transition("stop", SessionState::Open, SessionState::Closed)
            .unwrap();

        // Act
        let failed = shared.fail_if_open();

        // Assert
        assert!(!failed);
        assert_eq!(shared.state(), SessionState::Closed);
    }

    #[test]
    fn test_fail_if_open_signals_stop() {
        let shared = open_shared();
        let stop = shared.subscribe_stop();

        assert!(shared.fail_if_open());

        assert_eq!(shared.state(), SessionState::Failed);
        assert!(*stop.borrow());
    }

    #[test]
    fn test_register_requires_open_state() {
        let shared = Shared::new();
        let (tx, _rx) = oneshot::channel();
        assert!(matches!(
            shared.register(tx),
            Err(SessionError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_register_issues_ids_from_one() {
        let shared = open_shared();
        let ids: Vec<u32> = (0..3)
            .map(|_| {
                let (tx, _rx) = oneshot::channel();
                shared.register(tx).unwrap()
            })
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(shared.pending_len(), 3);
    }

    #[test]
    fn test_register_skips_ids_still_in_flight() {
        // Arrange – id 1 is pending and the counter is about to wrap back to it
        let mut shared = open_shared();
        let (tx, _rx1) = oneshot::channel();
        assert_eq!(shared.register(tx).unwrap(), 1);
        shared.sequence = SequenceCounter::starting_after(u32::MAX);

        // Act – next() yields 0 (free) and then 1 (taken) on the following call
        let (tx0, _rx0) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        let zero = shared.register(tx0).unwrap();
        let after = shared.register(tx2).unwrap();

        // Assert
        assert_eq!(zero, 0);
        assert_eq!(after, 2);
    }

    #[tokio::test]
    async fn test_release_pending_closes_slots() {
        // Arrange
        let shared = open_shared();
        let (tx, rx) = oneshot::channel();
        shared.register(tx).unwrap();

        // Act
        let released = shared.release_pending();

        // Assert
        assert_eq!(released, 1);
        assert!(rx.await.is_err(), "slot must resolve without a value");
    }
}
