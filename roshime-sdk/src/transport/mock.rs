//! In-memory fake memory store for testing and demos
//!
//! `MockTransport` behaves like the remote store: it checks credentials,
//! issues tokens, serves the list and applies confirmed writes. The paired
//! `MockTransportHandle` lets tests seed data, inject failures, hold calls
//! to force out-of-order completion and inspect every request sent.

use super::{Endpoint, GalleryTransport};
use crate::{
    errors::{GalleryError, Result},
    types::{
        CommentRequest, LoginRequest, LoginResponse, Memory, ReactionRequest, SessionToken,
    },
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::oneshot;

/// A request observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Endpoint hit
    pub endpoint: Endpoint,
    /// Token sent, if any
    pub token: Option<String>,
    /// JSON body, `Null` for the list fetch
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Times(usize),
    Always,
}

#[derive(Default)]
struct MockState {
    memories: Vec<Memory>,
    credentials: HashMap<String, String>,
    valid_tokens: HashSet<String>,
    issued: u64,
    failures: HashMap<Endpoint, Failure>,
    requests: Vec<RecordedRequest>,
    holding: HashSet<Endpoint>,
    held: HashMap<Endpoint, Vec<Option<oneshot::Sender<()>>>>,
}

impl MockState {
    fn record(&mut self, endpoint: Endpoint, token: Option<&SessionToken>, body: serde_json::Value) {
        self.requests.push(RecordedRequest {
            endpoint,
            token: token.map(|t| t.as_str().to_string()),
            body,
        });
    }

    fn take_failure(&mut self, endpoint: Endpoint) -> Option<GalleryError> {
        let fail = match self.failures.get_mut(&endpoint) {
            Some(Failure::Always) => true,
            Some(Failure::Times(n)) if *n > 0 => {
                *n -= 1;
                true
            },
            _ => false,
        };
        fail.then(|| GalleryError::Network(format!("injected failure on {endpoint}")))
    }

    fn authorize(&self, token: &SessionToken) -> Result<()> {
        if self.valid_tokens.contains(token.as_str()) {
            Ok(())
        } else {
            Err(GalleryError::Status {
                status: 401,
                body: "invalid token".to_string(),
            })
        }
    }

    fn hold(&mut self, endpoint: Endpoint) -> Option<oneshot::Receiver<()>> {
        if !self.holding.contains(&endpoint) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        self.held.entry(endpoint).or_default().push(Some(tx));
        Some(rx)
    }

    fn memory_mut(&mut self, sid: u64) -> Result<&mut Memory> {
        self.memories
            .iter_mut()
            .find(|m| m.sequence_id == sid)
            .ok_or_else(|| GalleryError::Status {
                status: 404,
                body: format!("memory {sid} not found"),
            })
    }
}

/// Handle for interacting with the mock store in tests
#[derive(Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<MockState>>,
}

/// An in-memory store implementing `GalleryTransport`
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a mock store seeded with `memories` and a handle for tests
    pub fn pair(memories: Vec<Memory>) -> (Arc<dyn GalleryTransport>, MockTransportHandle) {
        let state = Arc::new(Mutex::new(MockState {
            memories,
            ..Default::default()
        }));

        let transport = MockTransport {
            state: state.clone(),
        };
        (Arc::new(transport), MockTransportHandle { state })
    }
}

impl MockTransportHandle {
    /// Accept `username` / `password` at login
    pub fn add_user(&self, username: impl Into<String>, password: impl Into<String>) {
        self.state
            .lock()
            .credentials
            .insert(username.into(), password.into());
    }

    /// Mint a valid token without going through login
    pub fn issue_token(&self) -> SessionToken {
        let mut state = self.state.lock();
        state.issued += 1;
        let token = format!("mock-token-{}", state.issued);
        state.valid_tokens.insert(token.clone());
        SessionToken::new(token)
    }

    /// Invalidate every issued token, as if sessions expired server-side
    pub fn expire_tokens(&self) {
        self.state.lock().valid_tokens.clear();
    }

    /// Server-side view of the list
    pub fn memories(&self) -> Vec<Memory> {
        self.state.lock().memories.clone()
    }

    /// Replace the server-side list
    pub fn set_memories(&self, memories: Vec<Memory>) {
        self.state.lock().memories = memories;
    }

    /// Fail the next `times` calls to `endpoint` with a network error
    pub fn fail_next(&self, endpoint: Endpoint, times: usize) {
        self.state
            .lock()
            .failures
            .insert(endpoint, Failure::Times(times));
    }

    /// Fail every call to `endpoint` until `recover` is called
    pub fn fail_always(&self, endpoint: Endpoint) {
        self.state.lock().failures.insert(endpoint, Failure::Always);
    }

    /// Stop injecting failures on `endpoint`
    pub fn recover(&self, endpoint: Endpoint) {
        self.state.lock().failures.remove(&endpoint);
    }

    /// Make calls to `endpoint` wait until released with `release`
    pub fn hold(&self, endpoint: Endpoint, hold: bool) {
        let mut state = self.state.lock();
        if hold {
            state.holding.insert(endpoint);
        } else {
            state.holding.remove(&endpoint);
        }
    }

    /// Number of calls to `endpoint` currently held
    pub fn pending(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .held
            .get(&endpoint)
            .map_or(0, |held| held.iter().filter(|h| h.is_some()).count())
    }

    /// Let the `index`-th held call to `endpoint` (in arrival order) complete
    pub fn release(&self, endpoint: Endpoint, index: usize) -> bool {
        self.take_held(endpoint, index)
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false)
    }

    /// Fail the `index`-th held call to `endpoint` with a network error
    pub fn abort(&self, endpoint: Endpoint, index: usize) -> bool {
        self.take_held(endpoint, index).is_some()
    }

    fn take_held(&self, endpoint: Endpoint, index: usize) -> Option<oneshot::Sender<()>> {
        self.state
            .lock()
            .held
            .get_mut(&endpoint)
            .and_then(|held| held.get_mut(index))
            .and_then(Option::take)
    }

    /// Make list fetches wait until released with `release_fetch`
    pub fn hold_fetches(&self, hold: bool) {
        self.hold(Endpoint::Memories, hold);
    }

    /// Number of list fetches currently held
    pub fn pending_fetches(&self) -> usize {
        self.pending(Endpoint::Memories)
    }

    /// Let the `index`-th held fetch complete
    pub fn release_fetch(&self, index: usize) -> bool {
        self.release(Endpoint::Memories, index)
    }

    /// Fail the `index`-th held fetch
    pub fn abort_fetch(&self, index: usize) -> bool {
        self.abort(Endpoint::Memories, index)
    }

    /// Every request observed so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests observed on one endpoint
    pub fn requests_to(&self, endpoint: Endpoint) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }
}

impl MockTransport {
    fn admit_write(
        &self,
        endpoint: Endpoint,
        token: &SessionToken,
        body: serde_json::Value,
    ) -> Result<Option<oneshot::Receiver<()>>> {
        let mut state = self.state.lock();
        state.record(endpoint, Some(token), body);
        if let Some(err) = state.take_failure(endpoint) {
            return Err(err);
        }
        state.authorize(token)?;
        Ok(state.hold(endpoint))
    }
}

async fn wait_held(gate: Option<oneshot::Receiver<()>>, endpoint: Endpoint) -> Result<()> {
    if let Some(rx) = gate {
        rx.await
            .map_err(|_| GalleryError::Network(format!("held call to {endpoint} aborted")))?;
    }
    Ok(())
}

#[async_trait]
impl GalleryTransport for MockTransport {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let mut state = self.state.lock();
        state.record(Endpoint::Login, None, serde_json::to_value(request)?);
        if let Some(err) = state.take_failure(Endpoint::Login) {
            return Err(err);
        }

        let accepted = state
            .credentials
            .get(&request.username)
            .is_some_and(|password| *password == request.password);
        if !accepted {
            return Err(GalleryError::Status {
                status: 401,
                body: "invalid credentials".to_string(),
            });
        }

        state.issued += 1;
        let token = format!("mock-token-{}", state.issued);
        state.valid_tokens.insert(token.clone());
        Ok(LoginResponse {
            token: SessionToken::new(token),
        })
    }

    async fn fetch_memories(&self, token: &SessionToken) -> Result<Vec<Memory>> {
        let (snapshot, gate) = {
            let mut state = self.state.lock();
            state.record(Endpoint::Memories, Some(token), serde_json::Value::Null);
            if let Some(err) = state.take_failure(Endpoint::Memories) {
                return Err(err);
            }
            state.authorize(token)?;
            (state.memories.clone(), state.hold(Endpoint::Memories))
        };

        wait_held(gate, Endpoint::Memories).await?;
        Ok(snapshot)
    }

    async fn post_reaction(&self, token: &SessionToken, request: &ReactionRequest) -> Result<()> {
        let gate = self.admit_write(Endpoint::Reaction, token, serde_json::to_value(request)?)?;
        wait_held(gate, Endpoint::Reaction).await?;

        self.state.lock().memory_mut(request.sid)?.reaction = Some(request.reaction.clone());
        Ok(())
    }

    async fn post_comment(&self, token: &SessionToken, request: &CommentRequest) -> Result<()> {
        let gate = self.admit_write(Endpoint::Comment, token, serde_json::to_value(request)?)?;
        wait_held(gate, Endpoint::Comment).await?;

        self.state
            .lock()
            .memory_mut(request.sid)?
            .comments
            .push(request.comment.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Memory> {
        vec![Memory::new("a", 1, "First", "2023-01-01", "img/1.jpg")]
    }

    #[tokio::test]
    async fn test_login_checks_credentials() {
        let (transport, handle) = MockTransport::pair(sample());
        handle.add_user("rosh", "secret");

        let ok = transport
            .login(&LoginRequest {
                username: "rosh".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        assert!(transport.fetch_memories(&ok.token).await.is_ok());

        let err = transport
            .login(&LoginRequest {
                username: "rosh".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_injected_failures_are_counted() {
        let (transport, handle) = MockTransport::pair(sample());
        let token = handle.issue_token();
        handle.fail_next(Endpoint::Memories, 1);

        assert!(transport.fetch_memories(&token).await.is_err());
        assert!(transport.fetch_memories(&token).await.is_ok());
        assert_eq!(handle.requests_to(Endpoint::Memories).len(), 2);
    }

    #[tokio::test]
    async fn test_writes_apply_to_server_state() {
        let (transport, handle) = MockTransport::pair(sample());
        let token = handle.issue_token();

        transport
            .post_reaction(
                &token,
                &ReactionRequest {
                    sid: 1,
                    reaction: "😍".into(),
                },
            )
            .await
            .unwrap();
        transport
            .post_comment(
                &token,
                &CommentRequest {
                    sid: 1,
                    comment: "lovely".into(),
                },
            )
            .await
            .unwrap();

        let memories = handle.memories();
        assert_eq!(memories[0].reaction.as_deref(), Some("😍"));
        assert_eq!(memories[0].comments, vec!["lovely"]);

        let missing = transport
            .post_comment(
                &token,
                &CommentRequest {
                    sid: 99,
                    comment: "x".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing, GalleryError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_held_write_applies_on_release() {
        let (transport, handle) = MockTransport::pair(sample());
        let token = handle.issue_token();
        handle.hold(Endpoint::Reaction, true);

        let pending = tokio::spawn({
            let transport = transport.clone();
            let token = token.clone();
            async move {
                transport
                    .post_reaction(
                        &token,
                        &ReactionRequest {
                            sid: 1,
                            reaction: "😊".into(),
                        },
                    )
                    .await
            }
        });
        while handle.pending(Endpoint::Reaction) < 1 {
            tokio::task::yield_now().await;
        }
        assert!(handle.memories()[0].reaction.is_none());

        assert!(handle.release(Endpoint::Reaction, 0));
        pending.await.unwrap().unwrap();
        assert_eq!(handle.memories()[0].reaction.as_deref(), Some("😊"));
    }

    #[tokio::test]
    async fn test_aborted_fetch_fails() {
        let (transport, handle) = MockTransport::pair(sample());
        let token = handle.issue_token();
        handle.hold_fetches(true);

        let pending = tokio::spawn({
            let transport = transport.clone();
            async move { transport.fetch_memories(&token).await }
        });
        while handle.pending_fetches() < 1 {
            tokio::task::yield_now().await;
        }

        assert!(handle.abort_fetch(0));
        assert!(matches!(
            pending.await.unwrap(),
            Err(GalleryError::Network(_))
        ));
        assert_eq!(handle.pending_fetches(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let (transport, handle) = MockTransport::pair(sample());
        let token = handle.issue_token();
        handle.expire_tokens();

        let err = transport.fetch_memories(&token).await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
