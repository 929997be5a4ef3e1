//! Correlation of in-flight requests with their replies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jdwp_core::ReplyPacket;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::SessionError;
use crate::session::state::Shared;

/// Maps the id of each in-flight request to the slot its caller waits on.
///
/// Every entry leaves the table exactly once: when its reply arrives, when
/// its caller gives up, or when the session ends.  Removing an entry drops
/// its sender, which is how a waiting caller learns the session is gone.
#[derive(Debug, Default)]
pub(crate) struct CorrelationTable {
    slots: HashMap<u32, oneshot::Sender<ReplyPacket>>,
}

impl CorrelationTable {
    pub(crate) fn contains(&self, id: u32) -> bool {
        self.slots.contains_key(&id)
    }

    /// Registers `slot` under `id`.  Returns `false`, leaving the existing
    /// entry untouched, if the id is already taken.
    pub(crate) fn insert(&mut self, id: u32, slot: oneshot::Sender<ReplyPacket>) -> bool {
        if self.slots.contains_key(&id) {
            return false;
        }
        self.slots.insert(id, slot);
        true
    }

    /// Removes the entry for `id` and hands it `reply`.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownCorrelation`] when nothing is registered under `id`.
    pub(crate) fn complete(&mut self, id: u32, reply: ReplyPacket) -> Result<(), SessionError> {
        let slot = self
            .slots
            .remove(&id)
            .ok_or(SessionError::UnknownCorrelation(id))?;
        if slot.send(reply).is_err() {
            debug!("caller for reply {id} stopped waiting");
        }
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: u32) -> bool {
        self.slots.remove(&id).is_some()
    }

    /// Drops every slot without a value.
    pub(crate) fn drain(&mut self) -> usize {
        let count = self.slots.len();
        self.slots.clear();
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Removes a freshly registered request again unless [`keep`](Self::keep)
/// is called.
pub(crate) struct Registration<'a> {
    shared: &'a Shared,
    id: Option<u32>,
}

impl<'a> Registration<'a> {
    pub(crate) fn new(shared: &'a Shared, id: u32) -> Self {
        Self {
            shared,
            id: Some(id),
        }
    }

    pub(crate) fn keep(mut self) {
        self.id = None;
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            debug!("unregistering request {id} that was never queued");
            self.shared.cancel(id);
        }
    }
}

// ── ReplySlot ─────────────────────────────────────────────────────────────────

/// The caller's end of a pending request.
///
/// Returned by [`Session::submit_command`](crate::Session::submit_command)
/// once the request has been queued.  Resolve it with [`wait`](Self::wait)
/// or [`wait_timeout`](Self::wait_timeout).
pub struct ReplySlot {
    id: u32,
    rx: oneshot::Receiver<ReplyPacket>,
    shared: Arc<Shared>,
}

impl ReplySlot {
    pub(crate) fn new(id: u32, rx: oneshot::Receiver<ReplyPacket>, shared: Arc<Shared>) -> Self {
        Self { id, rx, shared }
    }

    /// The sequence id assigned to the request.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Waits for the reply.
    ///
    /// # Errors
    ///
    /// [`SessionError::ChannelClosed`] if the session stopped or failed first.
    pub async fn wait(self) -> Result<ReplyPacket, SessionError> {
        self.rx.await.map_err(|_| SessionError::ChannelClosed)
    }

    /// Waits for the reply for at most `deadline`.
    ///
    /// On expiry the request is removed from the correlation table, so a
    /// reply that arrives later is logged and dropped like any other reply
    /// with an unknown id.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Timeout`] if `deadline` elapsed first.
    /// - [`SessionError::ChannelClosed`] if the session stopped or failed first.
    pub async fn wait_timeout(mut self, deadline: Duration) -> Result<ReplyPacket, SessionError> {
        match tokio::time::timeout(deadline, &mut self.rx).await {
            Ok(result) => result.map_err(|_| SessionError::ChannelClosed),
            Err(_) => {
                self.shared.cancel(self.id);
                // The reply may have landed between the timer firing and the
                // cancel taking the lock.
                match self.rx.try_recv() {
                    Ok(reply) => Ok(reply),
                    Err(_) => {
                        debug!("request {} timed out after {deadline:?}", self.id);
                        Err(SessionError::Timeout(deadline))
                    }
                }
            }
        }
    }
}

impl fmt::Debug for ReplySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplySlot")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(data: &[u8]) -> ReplyPacket {
        ReplyPacket {
            error_code: 0,
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_complete_delivers_to_registered_slot() {
        // Arrange
        let mut table = CorrelationTable::default();
        let (tx, rx) = oneshot::channel();
        assert!(table.insert(7, tx));

        // Act
        table.complete(7, reply(&[1, 2])).unwrap();

        // Assert
        assert_eq!(rx.await.unwrap().data, vec![1, 2]);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_complete_unknown_id_is_reported() {
        let mut table = CorrelationTable::default();
        let result = table.complete(99, reply(&[]));
        assert!(matches!(result, Err(SessionError::UnknownCorrelation(99))));
    }

    #[test]
    fn test_insert_refuses_duplicate_id() {
        let mut table = CorrelationTable::default();
        let (a, _ra) = oneshot::channel();
        let (b, _rb) = oneshot::channel();
        assert!(table.insert(1, a));
        assert!(!table.insert(1, b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_complete_after_caller_dropped_still_removes_entry() {
        let mut table = CorrelationTable::default();
        let (tx, rx) = oneshot::channel();
        table.insert(3, tx);
        drop(rx);

        assert!(table.complete(3, reply(&[])).is_ok());
        assert!(!table.contains(3));
    }

    #[tokio::test]
    async fn test_drain_closes_all_slots() {
        // Arrange
        let mut table = CorrelationTable::default();
        let (a, ra) = oneshot::channel();
        let (b, rb) = oneshot::channel();
        table.insert(1, a);
        table.insert(2, b);

        // Act
        let drained = table.drain();

        // Assert
        assert_eq!(drained, 2);
        assert!(ra.await.is_err());
        assert!(rb.await.is_err());
    }
}
