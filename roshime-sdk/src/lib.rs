//! # Roshime gallery core
//!
//! View-state synchronization for a gated photo-memory gallery: a visitor
//! logs in, then browses a carousel of memories, reacts with emojis and
//! leaves comments. This crate keeps the background image, the active slide,
//! reactions and comment threads consistent with the remote store while
//! network responses arrive asynchronously and possibly out of order.
//!
//! ## Features
//!
//! - **Explicit sessions**: a `SessionContext` is passed to every protected
//!   component; losing the session clears the token and redirects to login
//! - **Ordered refreshes**: list fetches carry a sequence number and late
//!   responses are dropped
//! - **Confirm-then-apply writes**: reactions and comments change local state
//!   only after the store acknowledges them
//! - **Owned timers**: bursts and the welcome banner use cancelable tasks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roshime::{GalleryOptions, HttpTransport, LoginView, MemoriesView, Result, SessionContext};
//! use roshime::session::SessionGate;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let options = GalleryOptions::builder()
//!         .base_url("http://localhost:5000")
//!         .build();
//!     let transport = Arc::new(HttpTransport::new(&options)?);
//!     let ctx = SessionContext::in_memory();
//!
//!     let login = LoginView::new(
//!         transport.clone(),
//!         SessionGate::new(ctx.clone()),
//!         options.welcome_delay,
//!     );
//!     login.submit("rosh", "secret").await?;
//!
//!     let view = MemoriesView::new(transport, ctx, &options);
//!     view.enter().await?;
//!     view.advance_to(1);
//!     view.react("😍").await?;
//!     println!("{:?}", view.snapshot());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod burst;
pub mod carousel;
pub mod comment;
mod errors;
pub mod login;
pub mod notify;
mod options;
pub mod reaction;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod transport;
mod types;
mod view;

// Re-export main types
pub use burst::{BurstFrame, BurstMarker, BurstScheduler};
pub use carousel::{CarouselController, CarouselState};
pub use comment::{CommentOutcome, CommentService, DetailState, DetailView};
pub use errors::{ErrorKind, GalleryError, INVALID_CREDENTIALS_MESSAGE, Result, WriteAction};
pub use login::{LoginState, LoginView};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use options::{GalleryOptions, GalleryOptionsBuilder};
pub use reaction::{ReactionOutcome, ReactionService};
pub use scheduler::DelayedTask;
pub use session::{
    FileTokenStore, InMemoryTokenStore, Navigator, Route, SessionContext, SessionGate, TokenStore,
};
pub use store::{MemoryStore, RefreshOutcome};
pub use transport::{Endpoint, GalleryTransport, HttpTransport, MockTransport};
pub use types::{
    CommentRequest, LoginRequest, LoginResponse, Memory, REACTION_PALETTE, ReactionRequest,
    SequenceId, SessionToken,
};
pub use view::{MemoriesView, ViewSnapshot};
