//! Type definitions for the gallery core
//!
//! Wire types mirror the remote store's JSON field names; the Rust field
//! names say what the values mean.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric key used for every server-side write
pub type SequenceId = u64;

/// A memory record as returned by `GET /api/memories`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Opaque identifier used for list keying; never sent in writes
    pub id: String,
    /// Display title
    pub title: String,
    /// Write key
    #[serde(rename = "sid")]
    pub sequence_id: SequenceId,
    /// Display date, kept as the server formats it
    pub date: String,
    /// Image shown on the slide and as the blurred background
    #[serde(rename = "imgurl")]
    pub image_url: String,
    /// Longer text shown in the detail view
    #[serde(default)]
    pub description: String,
    /// Tags, rendering order irrelevant
    #[serde(default)]
    pub tags: Vec<String>,
    /// Recorded emoji reaction, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<String>,
    /// Comment thread in insertion order
    #[serde(default)]
    pub comments: Vec<String>,
}

impl Memory {
    /// Create a memory with the required fields and empty optional ones
    pub fn new(
        id: impl Into<String>,
        sequence_id: SequenceId,
        title: impl Into<String>,
        date: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sequence_id,
            date: date.into(),
            image_url: image_url.into(),
            description: String::new(),
            tags: Vec::new(),
            reaction: None,
            comments: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Check whether the memory carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Opaque credential sent as `x-auth-token`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token string, for headers and persistence
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account name
    pub username: String,
    /// Plain password, only ever sent to the gateway
    pub password: String,
}

/// Response of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Session token
    pub token: SessionToken,
}

/// Body of `POST /api/memories/reaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRequest {
    /// Target memory
    pub sid: SequenceId,
    /// Emoji
    pub reaction: String,
}

/// Body of `POST /api/memories/comment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRequest {
    /// Target memory
    pub sid: SequenceId,
    /// Comment text as typed
    pub comment: String,
}

/// Emojis offered by the reaction bar
pub const REACTION_PALETTE: [&str; 7] = ["😊", "😢", "😍", "❤️", "🤩", "😂", "😠"];
