//! Configuration and settings management
//!
//! Loads settings from environment variables (and optional config files) once at startup.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default directory for downloaded media
pub const DEFAULT_DOWNLOAD_DIR: &str = "/tmp/downloads";
/// Default size ceiling for uploads, in MiB (Bot API limit for bot uploads)
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;
/// Upper bound for the ceiling: what a local Bot API server accepts
pub const MAX_FILE_SIZE_MB_LIMIT: u64 = 2000;
/// Default yt-dlp executable, resolved through `PATH`
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
/// Default HTTP timeout for Bot API requests, large enough for a 50 MB upload
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 300;

/// Application settings loaded from environment variables
#[derive(Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    #[serde(default)]
    pub bot_token: String,

    /// Directory where yt-dlp writes its output
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum accepted file size in MiB
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// yt-dlp executable name or path
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,

    /// Netscape cookies file handed to yt-dlp (private Instagram etc.)
    #[serde(default)]
    pub ytdlp_cookies_file: Option<PathBuf>,

    /// Custom Bot API server URL
    #[serde(default)]
    pub telegram_api_url: Option<String>,

    /// Timeout for Bot API requests in seconds
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOAD_DIR)
}

const fn default_max_file_size_mb() -> u64 {
    DEFAULT_MAX_FILE_SIZE_MB
}

fn default_ytdlp_path() -> String {
    DEFAULT_YTDLP_PATH.to_string()
}

const fn default_upload_timeout_secs() -> u64 {
    DEFAULT_UPLOAD_TIMEOUT_SECS
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use clipfetch_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or `BOT_TOKEN` is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg. `APP__MAX_FILE_SIZE_MB=20 ./target/app`
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain variables: BOT_TOKEN -> bot_token. Empty values count as unset.
            .add_source(Environment::default().ignore_empty(true).try_parsing(true))
            .build()?;

        let settings: Self = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "BOT_TOKEN is not set. Export it or put it into .env".to_string(),
            ));
        }
        if self.max_file_size_mb == 0 {
            return Err(ConfigError::Message(
                "MAX_FILE_SIZE_MB must be greater than zero".to_string(),
            ));
        }
        if self.max_file_size_mb > MAX_FILE_SIZE_MB_LIMIT {
            return Err(ConfigError::Message(format!(
                "MAX_FILE_SIZE_MB must not exceed {MAX_FILE_SIZE_MB_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Size ceiling in bytes
    #[must_use]
    pub const fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// HTTP timeout used by the bot client
    #[must_use]
    pub const fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("bot_token", &"[MASKED]")
            .field("download_dir", &self.download_dir)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("ytdlp_path", &self.ytdlp_path)
            .field("ytdlp_cookies_file", &self.ytdlp_cookies_file)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .finish()
    }
}
