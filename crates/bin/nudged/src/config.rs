//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `nudge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use nudge_app::engine::EngineConfig;
use nudge_domain::id::WebsiteId;
use nudge_domain::page::PageContext;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which website's automations to load.
    pub website: WebsiteConfig,
    /// Network endpoints and mode.
    pub api: ApiConfig,
    /// Engine tunables.
    pub engine: EngineSection,
    /// The simulated page the session runs on.
    pub page: PageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Website selection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebsiteConfig {
    /// Website id (UUID). A random id is minted when absent, which is
    /// fine for offline replay.
    pub id: Option<String>,
}

/// Network configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the nudge API.
    pub base_url: String,
    /// Timeout for acknowledged requests, in seconds.
    pub request_timeout_secs: u64,
    /// Timeout for the unload beacon, in seconds.
    pub beacon_timeout_secs: u64,
    /// Run without network: automations come from `automations_file`,
    /// deliveries are collected in memory.
    pub offline: bool,
    /// JSON file with an `{"automations": [...]}` object, used in offline
    /// mode.
    pub automations_file: Option<String>,
}

/// Engine tunables.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Keep the observed "unknown operator passes" fallback.
    pub permissive_operators: bool,
    /// Buffer flush period, in seconds.
    pub flush_interval_secs: u64,
}

/// The simulated page context.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub url: String,
    pub title: String,
    pub referrer: String,
    pub locale: String,
    pub timezone: String,
    pub user_agent: String,
    pub screen_width: u32,
    pub screen_height: u32,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `nudge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("nudge.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NUDGE_WEBSITE_ID") {
            self.website.id = Some(val);
        }
        if let Ok(val) = std::env::var("NUDGE_API_BASE_URL") {
            self.api.base_url = val;
        }
        if let Ok(val) = std::env::var("NUDGE_OFFLINE") {
            self.api.offline = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Ok(val) = std::env::var("NUDGE_AUTOMATIONS_FILE") {
            self.api.automations_file = Some(val);
        }
        if let Ok(val) = std::env::var("NUDGE_PAGE_URL") {
            self.page.url = val;
        }
        if let Ok(val) = std::env::var("NUDGE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.flush_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "flush interval must be non-zero".to_string(),
            ));
        }
        if let Some(raw) = &self.website.id {
            raw.parse::<WebsiteId>().map_err(|_| {
                ConfigError::Validation(format!("website id `{raw}` is not a UUID"))
            })?;
        }
        url::Url::parse(&self.page.url)
            .map_err(|err| ConfigError::Validation(format!("page url: {err}")))?;
        Ok(())
    }

    /// Resolve the website id, minting one when not configured.
    #[must_use]
    pub fn website_id(&self) -> WebsiteId {
        self.website
            .id
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// Build the page context the session starts on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the page URL is invalid
    /// (already caught by [`load`](Self::load)).
    pub fn page_context(&self) -> Result<PageContext, ConfigError> {
        let url = url::Url::parse(&self.page.url)
            .map_err(|err| ConfigError::Validation(format!("page url: {err}")))?;
        Ok(PageContext {
            url,
            title: self.page.title.clone(),
            referrer: self.page.referrer.clone(),
            locale: self.page.locale.clone(),
            timezone: self.page.timezone.clone(),
            user_agent: self.page.user_agent.clone(),
            screen_width: self.page.screen_width,
            screen_height: self.page.screen_height,
        })
    }

    /// Engine configuration derived from the `[engine]` section.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            permissive_operators: self.engine.permissive_operators,
            flush_interval: std::time::Duration::from_secs(self.engine.flush_interval_secs),
        }
    }

    /// HTTP adapter configuration derived from the `[api]` section.
    #[must_use]
    pub fn http_config(&self) -> nudge_adapter_http_reqwest::HttpConfig {
        nudge_adapter_http_reqwest::HttpConfig {
            base_url: self.api.base_url.clone(),
            request_timeout_secs: self.api.request_timeout_secs,
            beacon_timeout_secs: self.api.beacon_timeout_secs,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".to_string(),
            request_timeout_secs: 10,
            beacon_timeout_secs: 3,
            offline: false,
            automations_file: None,
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            permissive_operators: true,
            flush_interval_secs: 10,
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: "https://example.com/".to_string(),
            title: "Example".to_string(),
            referrer: String::new(),
            locale: "en-US".to_string(),
            timezone: "UTC".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) nudged".to_string(),
            screen_width: 1920,
            screen_height: 1080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "nudged=info,nudge=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
