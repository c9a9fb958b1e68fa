//! Settings file and the immutable polling snapshot derived from it.
//!
//! The on-disk format is TOML.  A missing file is not an error: every key
//! has a default, so the panel starts (and shows the auth error glyph) until
//! the user fills in a handle and token.
//!
//! ```toml
//! domain = "github.com"
//! handle = "octocat"
//! token = "ghp_..."
//! refresh_interval = 60
//! show_alert = true
//! participating_only = false
//! hide_widget = false
//! hide_count = false
//! # api_url = "https://ghe.example.com/api/v3"
//! ```
//!
//! [`Settings`] is what the file says; [`PollConfig`] and [`DisplayFlags`]
//! are the snapshots handed to the scheduler.  A settings change replaces
//! both snapshots wholesale.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::PollError;

/// Smallest refresh interval accepted from the settings file, in seconds.
pub const MIN_REFRESH_INTERVAL: u64 = 1;

/// Which notifications endpoint to poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathVariant {
    #[default]
    All,
    Participating,
}

impl PathVariant {
    /// Query string appended to the API endpoint, if any.
    pub fn api_query(self) -> Option<&'static str> {
        match self {
            PathVariant::All => None,
            PathVariant::Participating => Some("participating=1"),
        }
    }

    /// Path of the matching page on the web UI.
    pub fn web_path(self) -> &'static str {
        match self {
            PathVariant::All => "/notifications",
            PathVariant::Participating => "/notifications/participating",
        }
    }
}

/// A credential whose `Debug` output never reveals the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Everything the fetcher needs for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Web host, e.g. `github.com`.  The API lives at `api.{domain}`.
    pub domain: String,
    pub handle: String,
    pub token: Secret,
    pub path_variant: PathVariant,
    /// Delay between successful polls, in seconds.
    pub base_interval: u64,
    /// Replaces `https://api.{domain}` when set (GitHub Enterprise).
    pub api_url: Option<String>,
}

impl PollConfig {
    /// Reject configurations that cannot possibly produce a valid request.
    pub fn validate(&self) -> Result<(), PollError> {
        if self.domain.trim().is_empty() {
            return Err(PollError::Config("domain is empty".into()));
        }
        if self.domain.contains(['/', ' ', '@']) {
            return Err(PollError::Config(format!(
                "domain `{}` is not a host name",
                self.domain
            )));
        }
        if self.handle.trim().is_empty() {
            return Err(PollError::Config("handle is empty".into()));
        }
        if self.token.is_empty() {
            return Err(PollError::Config("token is empty".into()));
        }
        Ok(())
    }

    /// The page opened on click-through.
    pub fn web_url(&self) -> String {
        format!("https://{}{}", self.domain, self.path_variant.web_path())
    }
}

/// Presentation switches passed to the reconciler alongside each outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFlags {
    /// Hide the whole panel while there are no notifications.
    pub hide_widget: bool,
    /// Never show the count label.
    pub hide_count: bool,
    /// Raise an alert when the count grows.
    pub show_alert: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            hide_widget: false,
            hide_count: false,
            show_alert: true,
        }
    }
}

/// Contents of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub domain: String,
    pub handle: String,
    pub token: String,
    pub api_url: Option<String>,
    pub hide_widget: bool,
    pub hide_count: bool,
    pub refresh_interval: u64,
    pub show_alert: bool,
    pub participating_only: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            domain: "github.com".into(),
            handle: String::new(),
            token: String::new(),
            api_url: None,
            hide_widget: false,
            hide_count: false,
            refresh_interval: 60,
            show_alert: true,
            participating_only: false,
        }
    }
}

impl Settings {
    /// Read settings from `path`, falling back to defaults when the file
    /// does not exist.  Parse errors are reported, not swallowed.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)
                .with_context(|| format!("failed to parse settings file '{}'", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    event = "config.load.missing",
                    path = %path.display(),
                    "settings file not found, using defaults"
                );
                Ok(Self::default())
            }
            Err(e) => Err(e)
                .with_context(|| format!("failed to read settings file '{}'", path.display())),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Fill an empty token from the environment (usually `GITHUB_TOKEN`).
    pub fn with_env_token(mut self, token: Option<String>) -> Self {
        if self.token.is_empty() {
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                self.token = token;
            }
        }
        self
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            domain: self.domain.trim().to_string(),
            handle: self.handle.trim().to_string(),
            token: Secret::new(self.token.trim()),
            path_variant: if self.participating_only {
                PathVariant::Participating
            } else {
                PathVariant::All
            },
            base_interval: self.refresh_interval.max(MIN_REFRESH_INTERVAL),
            api_url: self
                .api_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(String::from),
        }
    }

    pub fn display_flags(&self) -> DisplayFlags {
        DisplayFlags {
            hide_widget: self.hide_widget,
            hide_count: self.hide_count,
            show_alert: self.show_alert,
        }
    }
}

/// `$XDG_CONFIG_HOME/gh-notify-tui/config.toml` (or the platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gh-notify-tui").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.domain, "github.com");
        assert_eq!(settings.refresh_interval, 60);
        assert!(settings.show_alert);
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "handle = \"octocat\"\ntoken = \"abc\"\nparticipating_only = true\nrefresh_interval = 120\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        let config = settings.poll_config();
        assert_eq!(config.domain, "github.com");
        assert_eq!(config.handle, "octocat");
        assert_eq!(config.token.expose(), "abc");
        assert_eq!(config.path_variant, PathVariant::Participating);
        assert_eq!(config.base_interval, 120);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "refresh_interval = \"soon\"").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let settings = Settings {
            refresh_interval: 0,
            ..Settings::default()
        };
        assert_eq!(settings.poll_config().base_interval, MIN_REFRESH_INTERVAL);
    }

    #[test]
    fn env_token_only_fills_empty_token() {
        let empty = Settings::default().with_env_token(Some("from-env".into()));
        assert_eq!(empty.token, "from-env");

        let set = Settings {
            token: "from-file".into(),
            ..Settings::default()
        }
        .with_env_token(Some("from-env".into()));
        assert_eq!(set.token, "from-file");
    }

    #[test]
    fn secret_debug_is_redacted() {
        let config = Settings {
            handle: "octocat".into(),
            token: "hunter2".into(),
            ..Settings::default()
        }
        .poll_config();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("Secret(***)"));
    }

    #[test]
    fn validate_rejects_missing_credentials() {
        let mut config = Settings::default().poll_config();
        assert!(matches!(config.validate(), Err(PollError::Config(_))));

        config.handle = "octocat".into();
        config.token = Secret::new("abc");
        assert!(config.validate().is_ok());

        config.domain = "github.com/evil".into();
        assert!(matches!(config.validate(), Err(PollError::Config(_))));
    }

    #[test]
    fn web_url_follows_path_variant() {
        let mut config = Settings::default().poll_config();
        assert_eq!(config.web_url(), "https://github.com/notifications");
        config.path_variant = PathVariant::Participating;
        assert_eq!(
            config.web_url(),
            "https://github.com/notifications/participating"
        );
    }
}
