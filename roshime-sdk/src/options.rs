//! Tunables shared by the gallery components

use std::time::Duration;

/// Key under which the session token is persisted
pub const DEFAULT_TOKEN_KEY: &str = "token";
/// Markers spawned per successful reaction
pub const DEFAULT_BURST_COUNT: usize = 40;
/// Lifetime of a burst
pub const DEFAULT_BURST_DURATION: Duration = Duration::from_millis(2000);
/// Lifetime of a notification
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(2000);
/// Delay between a successful login and the move to the gallery
pub const DEFAULT_WELCOME_DELAY: Duration = Duration::from_millis(5000);

/// Options for the gallery core
#[derive(Debug, Clone)]
pub struct GalleryOptions {
    /// Base URL of the remote store, without trailing slash
    pub base_url: String,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Token store key
    pub token_key: String,
    /// Markers per burst
    pub burst_count: usize,
    /// How long a burst stays on screen
    pub burst_duration: Duration,
    /// How long a notification stays on screen
    pub toast_duration: Duration,
    /// Welcome banner duration before navigating to the gallery
    pub welcome_delay: Duration,
    /// Re-fetch the list after every confirmed write
    pub reconcile_after_write: bool,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(30),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            burst_count: DEFAULT_BURST_COUNT,
            burst_duration: DEFAULT_BURST_DURATION,
            toast_duration: DEFAULT_TOAST_DURATION,
            welcome_delay: DEFAULT_WELCOME_DELAY,
            reconcile_after_write: true,
        }
    }
}

impl GalleryOptions {
    /// Create a new builder starting from the defaults
    pub fn builder() -> GalleryOptionsBuilder {
        GalleryOptionsBuilder::default()
    }
}

/// Builder for [`GalleryOptions`]
#[derive(Debug, Default)]
pub struct GalleryOptionsBuilder {
    options: GalleryOptions,
}

impl GalleryOptionsBuilder {
    /// Set the remote store base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the HTTP request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = timeout;
        self
    }

    /// Set the token store key
    pub fn token_key(mut self, key: impl Into<String>) -> Self {
        self.options.token_key = key.into();
        self
    }

    /// Set the number of markers per burst
    pub fn burst_count(mut self, count: usize) -> Self {
        self.options.burst_count = count;
        self
    }

    /// Set the burst lifetime
    pub fn burst_duration(mut self, duration: Duration) -> Self {
        self.options.burst_duration = duration;
        self
    }

    /// Set the notification lifetime
    pub fn toast_duration(mut self, duration: Duration) -> Self {
        self.options.toast_duration = duration;
        self
    }

    /// Set the welcome banner delay
    pub fn welcome_delay(mut self, delay: Duration) -> Self {
        self.options.welcome_delay = delay;
        self
    }

    /// Enable or disable the post-write refresh
    pub fn reconcile_after_write(mut self, enabled: bool) -> Self {
        self.options.reconcile_after_write = enabled;
        self
    }

    /// Build the options
    pub fn build(self) -> GalleryOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = GalleryOptions::default();
        assert_eq!(options.token_key, "token");
        assert_eq!(options.burst_count, 40);
        assert_eq!(options.burst_duration, Duration::from_millis(2000));
        assert_eq!(options.welcome_delay, Duration::from_secs(5));
        assert!(options.reconcile_after_write);
    }

    #[test]
    fn test_builder_trims_base_url() {
        let options = GalleryOptions::builder()
            .base_url("https://memories.example/")
            .burst_count(10)
            .reconcile_after_write(false)
            .build();

        assert_eq!(options.base_url, "https://memories.example");
        assert_eq!(options.burst_count, 10);
        assert!(!options.reconcile_after_write);
    }
}
