//! Login form state and the timed move into the gallery

use crate::{
    errors::{GalleryError, INVALID_CREDENTIALS_MESSAGE, Result},
    scheduler::DelayedTask,
    session::{Route, SessionGate},
    transport::GalleryTransport,
    types::LoginRequest,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What the login view shows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginState {
    /// Inline error under the form
    pub error: Option<String>,
    /// Welcome banner shown between login and navigation
    pub welcome_visible: bool,
}

struct LoginInner {
    state: LoginState,
    welcome: Option<DelayedTask>,
}

/// Login view
#[derive(Clone)]
pub struct LoginView {
    transport: Arc<dyn GalleryTransport>,
    gate: SessionGate,
    inner: Arc<Mutex<LoginInner>>,
    welcome_delay: Duration,
}

impl LoginView {
    /// Wire the view to the gateway and session
    pub fn new(transport: Arc<dyn GalleryTransport>, gate: SessionGate, welcome_delay: Duration) -> Self {
        Self {
            transport,
            gate,
            inner: Arc::new(Mutex::new(LoginInner {
                state: LoginState::default(),
                welcome: None,
            })),
            welcome_delay,
        }
    }

    /// Submit credentials
    ///
    /// Every failure reads "Invalid username or password" and leaves the form
    /// usable. Success stores the token, shows the welcome banner and moves
    /// to the gallery once the welcome delay has passed.
    pub async fn submit(&self, username: &str, password: &str) -> Result<()> {
        // A new attempt supersedes any pending welcome
        if let Some(task) = self.inner.lock().welcome.take() {
            task.cancel();
        }

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = match self.transport.login(&request).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e.to_string())),
        };
        if let Err(e) = self.gate.set_token(&response.token) {
            return Err(self.fail(format!("could not persist token: {e}")));
        }
        info!("Logged in as {}", username);

        let gate = self.gate.clone();
        let weak = Arc::downgrade(&self.inner);
        let welcome = DelayedTask::schedule(self.welcome_delay, async move {
            if let Some(inner) = weak.upgrade() {
                inner.lock().state.welcome_visible = false;
            }
            gate.navigator().navigate(Route::Memories);
        });

        let mut inner = self.inner.lock();
        inner.state = LoginState {
            error: None,
            welcome_visible: true,
        };
        inner.welcome = Some(welcome);
        Ok(())
    }

    fn fail(&self, reason: String) -> GalleryError {
        warn!("Login failed: {}", reason);
        self.inner.lock().state = LoginState {
            error: Some(INVALID_CREDENTIALS_MESSAGE.to_string()),
            welcome_visible: false,
        };
        GalleryError::auth_failure(reason)
    }

    /// Current state
    pub fn state(&self) -> LoginState {
        self.inner.lock().state.clone()
    }

    /// Cancel the pending welcome navigation
    pub fn unmount(&self) {
        let mut inner = self.inner.lock();
        if let Some(task) = inner.welcome.take() {
            task.cancel();
        }
        inner.state.welcome_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionContext;
    use crate::transport::{Endpoint, MockTransport, MockTransportHandle};

    fn setup() -> (LoginView, SessionGate, MockTransportHandle) {
        let (transport, handle) = MockTransport::pair(Vec::new());
        handle.add_user("rosh", "hunter2");
        let gate = SessionGate::new(SessionContext::in_memory());
        let view = LoginView::new(transport, gate.clone(), Duration::from_millis(5000));
        (view, gate, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_shows_welcome_then_navigates() {
        let (view, gate, _) = setup();
        view.submit("rosh", "hunter2").await.unwrap();

        assert!(gate.token().is_some());
        assert!(view.state().welcome_visible);
        assert_eq!(gate.navigator().current(), Route::Login);

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(gate.navigator().current(), Route::Login);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(gate.navigator().current(), Route::Memories);
        assert!(!view.state().welcome_visible);
    }

    #[tokio::test]
    async fn test_bad_credentials_show_inline_error() {
        let (view, gate, _) = setup();
        let err = view.submit("rosh", "nope").await.unwrap_err();

        assert_eq!(err.to_string(), INVALID_CREDENTIALS_MESSAGE);
        assert_eq!(
            view.state().error.as_deref(),
            Some(INVALID_CREDENTIALS_MESSAGE)
        );
        assert!(gate.token().is_none());
        assert_eq!(gate.navigator().current(), Route::Login);
    }

    #[tokio::test]
    async fn test_network_failure_reads_the_same() {
        let (view, _, handle) = setup();
        handle.fail_next(Endpoint::Login, 1);

        let err = view.submit("rosh", "hunter2").await.unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS_MESSAGE);

        // Form stays usable
        view.submit("rosh", "hunter2").await.unwrap();
        assert!(view.state().error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_navigation() {
        let (view, gate, _) = setup();
        view.submit("rosh", "hunter2").await.unwrap();
        view.unmount();

        tokio::time::sleep(Duration::from_millis(6000)).await;
        assert_eq!(gate.navigator().current(), Route::Login);
    }
}
