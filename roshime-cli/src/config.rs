use config::{Config, ConfigError, Environment, File};
use roshime::{FileTokenStore, GalleryOptions};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub backend: BackendConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub token_key: String,
    pub token_file: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GalleryConfig {
    pub burst_count: usize,
    pub burst_duration_ms: u64,
    pub toast_duration_ms: u64,
    pub welcome_delay_ms: u64,
    pub reconcile_after_write: bool,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            burst_count: 40,
            burst_duration_ms: 2000,
            toast_duration_ms: 2000,
            welcome_delay_ms: 5000,
            reconcile_after_write: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config_dir(Path::new("config"))
    }

    pub fn with_config_dir(dir: &Path) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("backend.base_url", "http://localhost:5000")?
            .set_default("backend.timeout_seconds", 30)?
            .set_default("session.token_key", "token")?
            .set_default("gallery.burst_count", 40)?
            .set_default("gallery.burst_duration_ms", 2000)?
            .set_default("gallery.toast_duration_ms", 2000)?
            .set_default("gallery.welcome_delay_ms", 5000)?
            .set_default("gallery.reconcile_after_write", true)?
            .set_default("logging.json", false)?
            .add_source(File::from(dir.join(&run_mode)).required(false))
            .add_source(File::from(dir.join("local")).required(false))
            .add_source(Environment::with_prefix("ROSHIME").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn gallery_options(&self) -> GalleryOptions {
        GalleryOptions::builder()
            .base_url(&self.backend.base_url)
            .request_timeout(Duration::from_secs(self.backend.timeout_seconds))
            .token_key(&self.session.token_key)
            .burst_count(self.gallery.burst_count)
            .burst_duration(Duration::from_millis(self.gallery.burst_duration_ms))
            .toast_duration(Duration::from_millis(self.gallery.toast_duration_ms))
            .welcome_delay(Duration::from_millis(self.gallery.welcome_delay_ms))
            .reconcile_after_write(self.gallery.reconcile_after_write)
            .build()
    }

    pub fn token_file(&self) -> PathBuf {
        self.session
            .token_file
            .as_ref()
            .map(PathBuf::from)
            .or_else(FileTokenStore::default_path)
            .unwrap_or_else(|| PathBuf::from(".roshime/session.json"))
    }
}
