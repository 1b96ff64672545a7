//! Comment threads and the detail view that edits them

use crate::{
    errors::{GalleryError, Result, WriteAction},
    notify::{COMMENT_FAILED, COMMENT_POSTED, Notifier},
    session::SessionGate,
    store::MemoryStore,
    transport::GalleryTransport,
    types::{CommentRequest, Memory, SequenceId},
};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a comment submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    /// Blank text; no request was sent
    Ignored,
    /// The store confirmed the comment and it was appended
    Appended {
        /// Memory commented on
        sid: SequenceId,
        /// Thread length after the append
        thread_len: usize,
    },
    /// The store confirmed, but the memory is no longer held locally
    Detached {
        /// Memory commented on
        sid: SequenceId,
    },
}

/// Sends comments and appends them once confirmed
#[derive(Clone)]
pub struct CommentService {
    transport: Arc<dyn GalleryTransport>,
    gate: SessionGate,
    store: MemoryStore,
    notifier: Notifier,
}

impl CommentService {
    /// Wire the service to the shared components
    pub fn new(
        transport: Arc<dyn GalleryTransport>,
        gate: SessionGate,
        store: MemoryStore,
        notifier: Notifier,
    ) -> Self {
        Self {
            transport,
            gate,
            store,
            notifier,
        }
    }

    /// Post `text` on memory `sid`
    ///
    /// Whitespace-only text is ignored. The text is sent and stored exactly
    /// as typed.
    pub async fn add_comment(&self, sid: SequenceId, text: &str) -> Result<CommentOutcome> {
        if text.trim().is_empty() {
            return Ok(CommentOutcome::Ignored);
        }
        let token = self.gate.require_token()?;

        let request = CommentRequest {
            sid,
            comment: text.to_string(),
        };

        match self.transport.post_comment(&token, &request).await {
            Ok(()) => {
                let mut thread_len = 0;
                let held = self.store.update(sid, |m| {
                    m.comments.push(request.comment.clone());
                    thread_len = m.comments.len();
                });
                if !held {
                    debug!("Comment on memory {} confirmed after it left the list", sid);
                    return Ok(CommentOutcome::Detached { sid });
                }
                self.notifier.success(COMMENT_POSTED);
                info!("Comment added to memory {}", sid);
                Ok(CommentOutcome::Appended { sid, thread_len })
            },
            Err(e) => {
                warn!("Comment on memory {} failed: {}", sid, e);
                self.notifier.error(COMMENT_FAILED);
                Err(GalleryError::action_failure(
                    WriteAction::Comment,
                    e.to_string(),
                ))
            },
        }
    }
}

/// What the detail modal shows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailState {
    /// Local copy of the selected memory
    pub selected: Option<Memory>,
    /// Comment input buffer
    pub input: String,
}

/// Detail modal for one memory, independent of the carousel
#[derive(Clone)]
pub struct DetailView {
    state: Arc<RwLock<DetailState>>,
    comments: CommentService,
}

impl DetailView {
    /// Closed detail view
    pub fn new(comments: CommentService) -> Self {
        Self {
            state: Arc::new(RwLock::new(DetailState::default())),
            comments,
        }
    }

    /// Show `memory`
    pub fn open(&self, memory: Memory) {
        self.state.write().selected = Some(memory);
    }

    /// Hide the modal
    pub fn close(&self) {
        self.state.write().selected = None;
    }

    /// Replace the input buffer
    pub fn set_input(&self, text: impl Into<String>) {
        self.state.write().input = text.into();
    }

    /// Current state
    pub fn state(&self) -> DetailState {
        self.state.read().clone()
    }

    /// Memory currently shown
    pub fn selected(&self) -> Option<Memory> {
        self.state.read().selected.clone()
    }

    /// Post the input buffer on the selected memory
    ///
    /// On success the comment is appended to the local copy and the buffer
    /// is cleared; on failure the buffer is kept for a manual retry.
    pub async fn submit(&self) -> Result<CommentOutcome> {
        let (sid, text) = {
            let state = self.state.read();
            match &state.selected {
                Some(memory) => (memory.sequence_id, state.input.clone()),
                None => return Ok(CommentOutcome::Ignored),
            }
        };

        let outcome = self.comments.add_comment(sid, &text).await?;

        if let CommentOutcome::Appended { .. } = outcome {
            let mut state = self.state.write();
            if let Some(memory) = state.selected.as_mut().filter(|m| m.sequence_id == sid) {
                memory.comments.push(text.clone());
            }
            if state.input == text {
                state.input.clear();
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionContext;
    use crate::transport::{Endpoint, MockTransport, MockTransportHandle};
    use std::time::Duration;

    async fn setup() -> (DetailView, MemoryStore, Notifier, MockTransportHandle) {
        let (transport, handle) = MockTransport::pair(vec![
            Memory::new("a", 1, "First", "d", "img/1.jpg"),
            Memory::new("b", 2, "Second", "d", "img/2.jpg"),
        ]);
        let gate = SessionGate::new(SessionContext::in_memory());
        gate.set_token(&handle.issue_token()).unwrap();

        let store = MemoryStore::new(transport.clone(), gate.clone());
        store.refresh().await.unwrap();
        let notifier = Notifier::new(Duration::from_millis(2000));
        let service = CommentService::new(transport, gate, store.clone(), notifier.clone());
        (DetailView::new(service), store, notifier, handle)
    }

    #[tokio::test]
    async fn test_blank_comment_sends_nothing() {
        let (detail, store, _, handle) = setup().await;
        detail.open(store.get(1).unwrap());

        for blank in ["", "   ", "\n\t"] {
            detail.set_input(blank);
            assert_eq!(detail.submit().await.unwrap(), CommentOutcome::Ignored);
        }
        assert!(handle.requests_to(Endpoint::Comment).is_empty());
        assert!(store.get(1).unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_comment_is_appended_everywhere() {
        let (detail, store, notifier, handle) = setup().await;
        detail.open(store.get(2).unwrap());
        detail.set_input("what a day");

        let outcome = detail.submit().await.unwrap();
        assert_eq!(
            outcome,
            CommentOutcome::Appended {
                sid: 2,
                thread_len: 1
            }
        );

        let state = detail.state();
        assert!(state.input.is_empty());
        assert_eq!(state.selected.unwrap().comments, vec!["what a day"]);
        assert_eq!(store.get(2).unwrap().comments, vec!["what a day"]);
        assert_eq!(notifier.last().unwrap().title, COMMENT_POSTED);

        let sent = handle.requests_to(Endpoint::Comment);
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].body,
            serde_json::json!({"sid": 2, "comment": "what a day"})
        );
    }

    #[tokio::test]
    async fn test_failed_comment_keeps_input() {
        let (detail, store, notifier, handle) = setup().await;
        detail.open(store.get(1).unwrap());
        detail.set_input("try me");
        handle.fail_next(Endpoint::Comment, 1);

        let err = detail.submit().await.unwrap_err();
        assert!(matches!(
            err,
            GalleryError::ActionFailure {
                action: WriteAction::Comment,
                ..
            }
        ));
        assert_eq!(detail.state().input, "try me");
        assert!(detail.selected().unwrap().comments.is_empty());
        assert!(store.get(1).unwrap().comments.is_empty());
        assert_eq!(notifier.last().unwrap().title, COMMENT_FAILED);

        // Manual retry
        detail.submit().await.unwrap();
        assert_eq!(store.get(1).unwrap().comments, vec!["try me"]);
    }

    #[tokio::test]
    async fn test_comment_confirmed_after_clear_is_detached() {
        let (detail, store, notifier, handle) = setup().await;
        detail.open(store.get(1).unwrap());
        detail.set_input("late");
        handle.hold(Endpoint::Comment, true);

        let pending = tokio::spawn({
            let detail = detail.clone();
            async move { detail.submit().await }
        });
        while handle.pending(Endpoint::Comment) < 1 {
            tokio::task::yield_now().await;
        }
        store.clear();

        assert!(handle.release(Endpoint::Comment, 0));
        assert_eq!(
            pending.await.unwrap().unwrap(),
            CommentOutcome::Detached { sid: 1 }
        );
        assert!(store.is_empty());
        assert!(notifier.last().is_none());
        assert!(detail.selected().unwrap().comments.is_empty());
    }

        #[tokio::test]
    async fn test_submit_without_selection_is_ignored() {
        let (detail, _, _, handle) = setup().await;
        detail.set_input("orphan");
        assert_eq!(detail.submit().await.unwrap(), CommentOutcome::Ignored);
        assert!(handle.requests_to(Endpoint::Comment).is_empty());
    }
}
