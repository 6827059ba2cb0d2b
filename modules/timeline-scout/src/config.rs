use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::dedup::DedupIdentity;
use crate::error::{Result, ScoutError};

/// Tuning and environment for one scrape run.
///
/// Loaded from an optional TOML file; every key has a default, so an empty
/// file (or no file) is a valid configuration. Credentials are not part of
/// this struct; they come from the environment via [`Credentials`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoutConfig {
    // Collection loop
    pub target_count: usize,
    pub stuck_threshold: u32,
    pub scroll_offset_px: u32,
    pub smooth_scroll: bool,
    pub inter_iteration_delay_ms: u64,
    pub dedup_identity: DedupIdentity,

    // Navigation
    pub base_url: String,
    pub navigation_timeout_ms: u64,
    pub quick_check_timeout_ms: u64,
    pub readiness_timeout_ms: u64,

    // Login
    pub login_check_timeout_ms: u64,
    pub login_step_timeout_ms: u64,

    // Browser
    pub headless: bool,
    pub stealth: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_executable: Option<PathBuf>,

    // Files
    pub cookies_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            target_count: 10,
            stuck_threshold: 5,
            scroll_offset_px: 500,
            smooth_scroll: true,
            inter_iteration_delay_ms: 1000,
            dedup_identity: DedupIdentity::Record,
            base_url: "https://x.com".to_string(),
            navigation_timeout_ms: 5000,
            quick_check_timeout_ms: 2000,
            readiness_timeout_ms: 3000,
            login_check_timeout_ms: 3000,
            login_step_timeout_ms: 10_000,
            headless: false,
            stealth: true,
            viewport_width: 1280,
            viewport_height: 800,
            chrome_executable: None,
            cookies_path: PathBuf::from("cookies").join("twitter_cookies.json"),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ScoutConfig {
    /// Read `path` if given, otherwise start from defaults. `CHROME_BIN`
    /// overrides `chrome_executable` either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    ScoutError::Config(format!("failed to read {}: {e}", path.display()))
                })?;
                Self::from_toml(&content).map_err(|e| match e {
                    ScoutError::Config(msg) => {
                        ScoutError::Config(format!("{}: {msg}", path.display()))
                    }
                    other => other,
                })?
            }
            None => Self::default(),
        };

        if let Some(bin) = std::env::var_os("CHROME_BIN").filter(|v| !v.is_empty()) {
            config.chrome_executable = Some(PathBuf::from(bin));
        }
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ScoutError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_count == 0 {
            return Err(ScoutError::Config("target_count must be at least 1".into()));
        }
        if self.stuck_threshold == 0 {
            return Err(ScoutError::Config(
                "stuck_threshold must be at least 1".into(),
            ));
        }
        self.base_url()?;
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| ScoutError::Config(format!("invalid base_url {:?}: {e}", self.base_url)))
    }

    pub fn inter_iteration_delay(&self) -> Duration {
        Duration::from_millis(self.inter_iteration_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn quick_check_timeout(&self) -> Duration {
        Duration::from_millis(self.quick_check_timeout_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn login_check_timeout(&self) -> Duration {
        Duration::from_millis(self.login_check_timeout_ms)
    }

    pub fn login_step_timeout(&self) -> Duration {
        Duration::from_millis(self.login_step_timeout_ms)
    }

    pub fn launch_options(&self) -> browser_client::LaunchOptions {
        browser_client::LaunchOptions {
            headless: self.headless,
            window_width: self.viewport_width,
            window_height: self.viewport_height,
            stealth: self.stealth,
            executable: self.chrome_executable.clone(),
        }
    }

    pub fn log_summary(&self) {
        info!(
            target_count = self.target_count,
            stuck_threshold = self.stuck_threshold,
            scroll_offset_px = self.scroll_offset_px,
            delay_ms = self.inter_iteration_delay_ms,
            dedup = ?self.dedup_identity,
            base_url = %self.base_url,
            headless = self.headless,
            "Config loaded"
        );
    }
}

/// Login credentials from `TWITTER_EMAIL` / `TWITTER_PASSWORD`.
/// `Debug` never prints the values.
#[derive(Clone, Default)]
pub struct Credentials {
    identifier: Option<String>,
    password: Option<String>,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            password: Some(password.into()),
        }
    }

    /// Reads `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            identifier: read("TWITTER_EMAIL"),
            password: read("TWITTER_PASSWORD"),
        }
    }

    /// Both halves, or `None` if either is missing.
    pub fn pair(&self) -> Option<(&str, &str)> {
        Some((self.identifier.as_deref()?, self.password.as_deref()?))
    }

    pub fn log_presence(&self) {
        fn presence(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "<set>"
            } else {
                "<not set>"
            }
        }
        info!(
            "Credentials: TWITTER_EMAIL={} TWITTER_PASSWORD={}",
            presence(&self.identifier),
            presence(&self.password)
        );
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier.as_ref().map(|_| "<redacted>"))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ScoutConfig::from_toml("").unwrap();
        assert_eq!(config.target_count, 10);
        assert_eq!(config.stuck_threshold, 5);
        assert_eq!(config.scroll_offset_px, 500);
        assert_eq!(config.inter_iteration_delay(), Duration::from_secs(1));
        assert_eq!(config.dedup_identity, DedupIdentity::Record);
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let config = ScoutConfig::from_toml(
            r#"
            target_count = 25
            dedup_identity = "post_id"
            headless = true
            "#,
        )
        .unwrap();
        assert_eq!(config.target_count, 25);
        assert_eq!(config.dedup_identity, DedupIdentity::PostId);
        assert!(config.headless);
        assert_eq!(config.stuck_threshold, 5);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ScoutConfig::from_toml("max_tweets = 3").unwrap_err();
        assert!(matches!(err, ScoutError::Config(_)));
    }

    #[test]
    fn zero_thresholds_are_rejected() {
        assert!(ScoutConfig::from_toml("target_count = 0").is_err());
        assert!(ScoutConfig::from_toml("stuck_threshold = 0").is_err());
    }

    #[test]
    fn bad_base_url_is_rejected() {
        assert!(ScoutConfig::from_toml(r#"base_url = "not a url""#).is_err());
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials::new("me@example.com", "hunter2");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("me@example.com"));
        assert_eq!(creds.pair(), Some(("me@example.com", "hunter2")));
    }

    #[test]
    fn half_credentials_are_no_credentials() {
        let creds = Credentials {
            identifier: Some("me".into()),
            password: None,
        };
        assert!(creds.pair().is_none());
    }
}
