//! Authoritative memory list with a request-sequence guard
//!
//! Every `refresh()` is tagged with a monotonically increasing sequence
//! number. Only the response to the most recently issued fetch may touch the
//! list; anything older that resolves late is dropped, so a slow response can
//! never overwrite a newer one. Clearing the list also advances the
//! sequence, so a fetch still in flight at logout or unmount is dropped.

use crate::{
    errors::Result,
    session::SessionGate,
    transport::GalleryTransport,
    types::{Memory, SequenceId},
};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// What a refresh did to the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The list was replaced
    Applied {
        /// Number of memories now held
        len: usize,
    },
    /// A newer fetch was issued meanwhile; the response was dropped
    Stale,
}

struct StoreInner {
    memories: RwLock<Vec<Memory>>,
    issued: AtomicU64,
    transport: Arc<dyn GalleryTransport>,
    gate: SessionGate,
}

/// Ordered list of memories shared by the gallery components
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new(transport: Arc<dyn GalleryTransport>, gate: SessionGate) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                memories: RwLock::new(Vec::new()),
                issued: AtomicU64::new(0),
                transport,
                gate,
            }),
        }
    }

    /// Fetch the full list and replace the local copy
    ///
    /// A missing token or a failed fetch invalidates the session (token
    /// cleared, navigation redirected to login) and empties the list. Both
    /// outcomes are skipped when a newer refresh has been issued since.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let token = self.inner.gate.require_token().inspect_err(|_| self.clear())?;

        let seq = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Fetching memories (request #{})", seq);

        let result = self.inner.transport.fetch_memories(&token).await;

        let latest = self.inner.issued.load(Ordering::SeqCst);
        if seq != latest {
            debug!(
                "Dropping response to request #{} (latest is #{})",
                seq, latest
            );
            return Ok(RefreshOutcome::Stale);
        }

        match result {
            Ok(memories) => {
                let len = memories.len();
                *self.inner.memories.write() = memories;
                info!("Loaded {} memories (request #{})", len, seq);
                Ok(RefreshOutcome::Applied { len })
            },
            Err(e) => {
                self.clear();
                Err(self
                    .inner
                    .gate
                    .invalidate(format!("memory list fetch failed: {e}")))
            },
        }
    }

    /// Copy of the current list
    pub fn snapshot(&self) -> Vec<Memory> {
        self.inner.memories.read().clone()
    }

    /// Memory with the given sequence id
    pub fn get(&self, sid: SequenceId) -> Option<Memory> {
        self.inner
            .memories
            .read()
            .iter()
            .find(|m| m.sequence_id == sid)
            .cloned()
    }

    /// Memory at `index`
    pub fn get_index(&self, index: usize) -> Option<Memory> {
        self.inner.memories.read().get(index).cloned()
    }

    /// Number of memories held
    pub fn len(&self) -> usize {
        self.inner.memories.read().len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.inner.memories.read().is_empty()
    }

    /// Mutate one record in place; returns false if `sid` is not held
    pub(crate) fn update<F>(&self, sid: SequenceId, f: F) -> bool
    where
        F: FnOnce(&mut Memory),
    {
        let mut memories = self.inner.memories.write();
        match memories.iter_mut().find(|m| m.sequence_id == sid) {
            Some(memory) => {
                f(memory);
                true
            },
            None => false,
        }
    }

    /// Discard the list and supersede any fetch in flight
    pub fn clear(&self) {
        self.inner.issued.fetch_add(1, Ordering::SeqCst);
        self.inner.memories.write().clear();
    }

    /// Latest sequence number, advanced by every fetch and every clear
    pub fn sequence(&self) -> u64 {
        self.inner.issued.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Route, SessionContext};
    use crate::transport::{Endpoint, MockTransport};

    fn memories() -> Vec<Memory> {
        vec![
            Memory::new("a", 1, "First", "2023-01-01", "img/1.jpg"),
            Memory::new("b", 2, "Second", "2023-02-01", "img/2.jpg"),
        ]
    }

    #[tokio::test]
    async fn test_refresh_replaces_list() {
        let (transport, handle) = MockTransport::pair(memories());
        let gate = SessionGate::new(SessionContext::in_memory());
        gate.set_token(&handle.issue_token()).unwrap();
        let store = MemoryStore::new(transport, gate);

        assert_eq!(
            store.refresh().await.unwrap(),
            RefreshOutcome::Applied { len: 2 }
        );
        assert_eq!(store.get(2).unwrap().title, "Second");

        handle.set_memories(vec![Memory::new("c", 3, "Third", "d", "img/3.jpg")]);
        store.refresh().await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(1).is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_invalidates_session() {
        let (transport, handle) = MockTransport::pair(memories());
        let gate = SessionGate::new(SessionContext::in_memory());
        gate.set_token(&handle.issue_token()).unwrap();
        gate.navigator().navigate(Route::Memories);
        let store = MemoryStore::new(transport, gate.clone());
        store.refresh().await.unwrap();

        handle.fail_next(Endpoint::Memories, 1);
        let err = store.refresh().await.unwrap_err();

        assert!(err.is_fatal());
        assert!(store.is_empty());
        assert!(gate.token().is_none());
        assert_eq!(gate.navigator().current(), Route::Login);
        // Not retried
        assert_eq!(handle.requests_to(Endpoint::Memories).len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_without_token_sends_nothing() {
        let (transport, handle) = MockTransport::pair(memories());
        let store = MemoryStore::new(transport, SessionGate::new(SessionContext::in_memory()));

        assert!(store.refresh().await.is_err());
        assert!(handle.requests().is_empty());
    }

    #[tokio::test]
    async fn test_clear_drops_fetch_in_flight() {
        let (transport, handle) = MockTransport::pair(memories());
        let gate = SessionGate::new(SessionContext::in_memory());
        gate.set_token(&handle.issue_token()).unwrap();
        let store = MemoryStore::new(transport, gate.clone());
        handle.hold_fetches(true);

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.refresh().await }
        });
        while handle.pending_fetches() < 1 {
            tokio::task::yield_now().await;
        }

        let before = store.sequence();
        store.clear();
        assert_eq!(store.sequence(), before + 1);

        assert!(handle.release_fetch(0));
        assert_eq!(pending.await.unwrap().unwrap(), RefreshOutcome::Stale);
        assert!(store.is_empty());
        assert!(gate.token().is_some());
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let (transport, handle) = MockTransport::pair(memories());
        let gate = SessionGate::new(SessionContext::in_memory());
        gate.set_token(&handle.issue_token()).unwrap();
        let store = MemoryStore::new(transport, gate);
        store.refresh().await.unwrap();

        assert!(store.update(2, |m| m.reaction = Some("🤩".into())));
        assert!(!store.update(42, |m| m.reaction = Some("🤩".into())));
        assert_eq!(store.get(2).unwrap().reaction.as_deref(), Some("🤩"));
        assert!(store.get(1).unwrap().reaction.is_none());
    }
}
