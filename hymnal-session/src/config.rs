//! Configuration for the hymnal session core
//!
//! Single-tier TOML configuration. Every field has a built-in default, so an
//! absent config file (or an absent section) is never an error.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--config, --api-url)
//! 2. Environment variables (HYMNAL_CONFIG, HYMNAL_API_URL)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::error::{Error, Result};
use crate::favorites::ReentryPolicy;
use hymnal_common::time::millis_to_duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Complete session configuration as read from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub presentation: PresentationConfig,

    #[serde(default)]
    pub favorites: FavoritesConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL all endpoint paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub paths: EndpointPaths,
}

/// Endpoint paths relative to `base_url`
///
/// `{user}` in a path is replaced by the percent-encoded user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointPaths {
    #[serde(default = "default_tracks_path")]
    pub tracks: String,

    /// Favorites collection; removal appends the track id
    #[serde(default = "default_favorites_path")]
    pub favorites: String,

    /// Play-started analytics beacon
    #[serde(default = "default_plays_path")]
    pub plays: String,

    #[serde(default = "default_home_path")]
    pub home: String,
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Tracks queued after the anchor when playing from a collection
    #[serde(default = "default_queue_lookahead")]
    pub queue_lookahead: usize,

    /// Send the "play started" analytics beacon
    #[serde(default = "default_true")]
    pub analytics_enabled: bool,
}

/// Full-screen player settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationConfig {
    /// Open the full-screen player automatically after a play action
    #[serde(default)]
    pub auto_open_full_screen: bool,

    /// Settle delay before auto-opening
    #[serde(default = "default_auto_open_delay_ms")]
    pub auto_open_delay_ms: u64,
}

/// Favorites sync settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoritesConfig {
    #[serde(default)]
    pub reentry_policy: ReentryPolicy,
}

/// Home feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Hard bound on the aggregated feed fetch
    #[serde(default = "default_feed_timeout_ms")]
    pub timeout_ms: u64,
}

/// Local persistent storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Session file path (defaults to the platform data dir)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_tracks_path() -> String {
    "hymns".to_string()
}

fn default_favorites_path() -> String {
    "users/{user}/favorites".to_string()
}

fn default_plays_path() -> String {
    "plays".to_string()
}

fn default_home_path() -> String {
    "home".to_string()
}

fn default_queue_lookahead() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_auto_open_delay_ms() -> u64 {
    300
}

fn default_feed_timeout_ms() -> u64 {
    8_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            paths: EndpointPaths::default(),
        }
    }
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            tracks: default_tracks_path(),
            favorites: default_favorites_path(),
            plays: default_plays_path(),
            home: default_home_path(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        millis_to_duration(self.request_timeout_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            queue_lookahead: default_queue_lookahead(),
            analytics_enabled: true,
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            auto_open_full_screen: false,
            auto_open_delay_ms: default_auto_open_delay_ms(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_feed_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SessionConfig {
    /// Load configuration, resolving the file per the priority order above
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = hymnal_common::config::resolve_config_path(
            cli_path,
            hymnal_common::config::CONFIG_ENV_VAR,
        );
        if let Some(path) = &path {
            info!("Loading configuration from {}", path.display());
        }

        let config: SessionConfig = hymnal_common::config::load_toml_or_default(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SessionConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if self.api.request_timeout_ms == 0 {
            return Err(Error::Config("api.request_timeout_ms must be positive".to_string()));
        }
        let paths = &self.api.paths;
        for (name, path) in [
            ("tracks", &paths.tracks),
            ("favorites", &paths.favorites),
            ("plays", &paths.plays),
            ("home", &paths.home),
        ] {
            if path.trim_matches('/').is_empty() {
                return Err(Error::Config(format!("api.paths.{} must not be empty", name)));
            }
        }
        if !paths.favorites.contains("{user}") {
            return Err(Error::Config(
                "api.paths.favorites must contain a {user} placeholder".to_string(),
            ));
        }
        if self.feed.timeout_ms == 0 {
            return Err(Error::Config("feed.timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn feed_timeout(&self) -> Duration {
        millis_to_duration(self.feed.timeout_ms)
    }

    pub fn auto_open_delay(&self) -> Duration {
        millis_to_duration(self.presentation.auto_open_delay_ms)
    }

    /// Session file location, defaulting to the platform data dir
    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| hymnal_common::config::default_data_dir().join("session.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.playback.queue_lookahead, 20);
        assert!(config.playback.analytics_enabled);
        assert!(!config.presentation.auto_open_full_screen);
        assert_eq!(config.feed_timeout(), Duration::from_millis(8000));
        assert_eq!(config.favorites.reentry_policy, ReentryPolicy::Collapse);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config.playback.queue_lookahead, 20);
        assert_eq!(config.auto_open_delay(), Duration::from_millis(300));
    }

    #[test]
    fn test_partial_sections() {
        let config = SessionConfig::from_toml_str(
            r#"
            [playback]
            queue_lookahead = 5

            [favorites]
            reentry_policy = "queue"

            [storage]
            path = "/tmp/hymnal/session.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.playback.queue_lookahead, 5);
        assert!(config.playback.analytics_enabled);
        assert_eq!(config.favorites.reentry_policy, ReentryPolicy::Queue);
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/hymnal/session.json"));
    }

    #[test]
    fn test_endpoint_paths_override() {
        let config = SessionConfig::from_toml_str(
            r#"
            [api]
            request_timeout_ms = 2500

            [api.paths]
            tracks = "v2/catalog"
            favorites = "v2/members/{user}/starred"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.paths.tracks, "v2/catalog");
        assert_eq!(config.api.paths.favorites, "v2/members/{user}/starred");
        assert_eq!(config.api.paths.home, "home");
        assert_eq!(config.api.request_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_favorites_path_needs_user_placeholder() {
        let result = SessionConfig::from_toml_str("[api.paths]\nfavorites = \"favorites\"\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = SessionConfig::from_toml_str("[api.paths]\nhome = \"/\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_feed_timeout_rejected() {
        let result = SessionConfig::from_toml_str("[feed]\ntimeout_ms = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = SessionConfig::from_toml_str("[favorites]\nreentry_policy = \"sometimes\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
