//! Session token storage, navigation state and the session gate
//!
//! Nothing here is global: a [`SessionContext`] bundles the token store and
//! the navigator and is handed to every component that performs protected
//! operations, so tests can inject a fake session per case.

use crate::{
    errors::{GalleryError, Result},
    types::SessionToken,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Key/value store holding the session token across page loads
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; missing keys are not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Token store that forgets everything when dropped
#[derive(Default)]
pub struct InMemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// Token store persisted as a JSON object in a single file
pub struct FileTokenStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileTokenStore {
    /// Use the file at `path`, created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// `<data dir>/roshime/session.json`, if the platform has a data dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("roshime").join("session.json"))
    }

    /// File backing the store
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn load_or_warn(&self) -> HashMap<String, String> {
        self.load().unwrap_or_else(|e| {
            warn!("Failed to read token store {}: {}", self.path.display(), e);
            HashMap::new()
        })
    }

    fn save(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(values)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.read();
        self.load_or_warn().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.write();
        let mut values = self.load_or_warn();
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.write();
        let mut values = self.load_or_warn();
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// Top-level views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Unauthenticated entry view
    Login,
    /// Protected gallery view
    Memories,
}

impl Route {
    /// Whether entering the route needs a session token
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Memories)
    }
}

/// Current top-level view, observable by the renderer
#[derive(Clone)]
pub struct Navigator {
    tx: Arc<watch::Sender<Route>>,
}

impl Navigator {
    /// Start at `initial`
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Switch views
    pub fn navigate(&self, route: Route) {
        info!("Navigating to {:?}", route);
        self.tx.send_replace(route);
    }

    /// Current view
    pub fn current(&self) -> Route {
        *self.tx.borrow()
    }

    /// Observe view changes
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }

    /// Resolve once the current view is `route`
    pub async fn wait_for(&self, route: Route) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|current| *current == route).await;
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}

/// Explicit session handle passed to every protected component
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn TokenStore>,
    navigator: Navigator,
    token_key: String,
}

impl SessionContext {
    /// Bundle a token store and navigator
    pub fn new(store: Arc<dyn TokenStore>, navigator: Navigator, token_key: impl Into<String>) -> Self {
        Self {
            store,
            navigator,
            token_key: token_key.into(),
        }
    }

    /// In-memory session starting on the login view
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryTokenStore::new()),
            Navigator::default(),
            crate::options::DEFAULT_TOKEN_KEY,
        )
    }

    /// Navigation state
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Underlying token store
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }
}

/// Decides whether protected views may load and handles session loss
#[derive(Clone)]
pub struct SessionGate {
    ctx: SessionContext,
}

impl SessionGate {
    /// Gate over `ctx`
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    /// Current token, if any
    pub fn token(&self) -> Option<SessionToken> {
        self.ctx
            .store
            .get(&self.ctx.token_key)
            .filter(|t| !t.is_empty())
            .map(SessionToken::new)
    }

    /// Persist a new token
    pub fn set_token(&self, token: &SessionToken) -> Result<()> {
        self.ctx.store.set(&self.ctx.token_key, token.as_str())
    }

    /// Forget the token
    pub fn clear(&self) {
        if let Err(e) = self.ctx.store.remove(&self.ctx.token_key) {
            // The navigation below still ends the session for this client
            warn!("Failed to remove session token: {}", e);
        }
    }

    /// Whether `route` may be entered right now
    pub fn can_enter(&self, route: Route) -> bool {
        !route.is_protected() || self.token().is_some()
    }

    /// Token for a protected operation, invalidating the session if absent
    pub fn require_token(&self) -> Result<SessionToken> {
        match self.token() {
            Some(token) => Ok(token),
            None => Err(self.invalidate("no session token")),
        }
    }

    /// Clear the token and redirect to login; returns the error to propagate
    pub fn invalidate(&self, reason: impl Into<String>) -> GalleryError {
        let reason = reason.into();
        error!("Session invalidated: {}", reason);
        self.clear();
        self.ctx.navigator.navigate(Route::Login);
        GalleryError::session_invalid(reason)
    }

    /// User-initiated sign out
    pub fn logout(&self) {
        info!("Logging out");
        self.clear();
        self.ctx.navigator.navigate(Route::Login);
    }

    /// Navigation state
    pub fn navigator(&self) -> &Navigator {
        &self.ctx.navigator
    }
}
