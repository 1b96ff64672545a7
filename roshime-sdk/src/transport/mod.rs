//! Transport layer abstractions
//!
//! This module defines the `GalleryTransport` trait, the seam between the
//! gallery core and the auth gateway / remote memory store, together with
//! its HTTP and in-memory implementations.

use crate::{
    errors::Result,
    types::{CommentRequest, LoginRequest, LoginResponse, Memory, ReactionRequest, SessionToken},
};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::{MockTransport, MockTransportHandle};

/// Header carrying the session token on protected requests
pub const AUTH_HEADER: &str = "x-auth-token";
/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Remote endpoints consumed by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /api/auth/login`
    Login,
    /// `GET /api/memories`
    Memories,
    /// `POST /api/memories/reaction`
    Reaction,
    /// `POST /api/memories/comment`
    Comment,
}

impl Endpoint {
    /// Path relative to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Login => "/api/auth/login",
            Endpoint::Memories => "/api/memories",
            Endpoint::Reaction => "/api/memories/reaction",
            Endpoint::Comment => "/api/memories/comment",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Transport trait for talking to the auth gateway and memory store
///
/// Implementations report raw failures (`Network`, `Status`, `Json`); the
/// calling component decides which user-facing error they become.
#[async_trait]
pub trait GalleryTransport: Send + Sync {
    /// Exchange credentials for a session token
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    /// Fetch the full ordered memory list
    async fn fetch_memories(&self, token: &SessionToken) -> Result<Vec<Memory>>;

    /// Record a reaction; success carries no body
    async fn post_reaction(&self, token: &SessionToken, request: &ReactionRequest) -> Result<()>;

    /// Append a comment; success carries no body
    async fn post_comment(&self, token: &SessionToken, request: &CommentRequest) -> Result<()>;
}
