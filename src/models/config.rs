//! Application configuration structures.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetch behavior for source pages
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Listing pages to watch
    #[serde(default = "defaults::sources")]
    pub sources: Vec<SourceTarget>,

    /// Heuristic rules for turning a page into offers
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Polling loop settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Control surface settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Telegram delivery settings (secrets come from the environment)
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.extraction.normalize();
        Ok(config)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(AppError::validation("fetch.max_concurrent must be > 0"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }
        for source in &self.sources {
            url::Url::parse(&source.url).map_err(|e| {
                AppError::validation(format!("source url '{}' is invalid: {e}", source.url))
            })?;
        }
        url::Url::parse(&self.extraction.origin).map_err(|e| {
            AppError::validation(format!(
                "extraction.origin '{}' is invalid: {e}",
                self.extraction.origin
            ))
        })?;
        if self.extraction.keywords.is_empty() {
            return Err(AppError::validation("No keywords defined"));
        }
        if self.extraction.online_markers.is_empty() {
            return Err(AppError::validation("No online markers defined"));
        }
        if self.extraction.min_price > self.extraction.max_price {
            return Err(AppError::validation(
                "extraction.min_price must be <= extraction.max_price",
            ));
        }
        if self.extraction.scan_limit == 0 {
            return Err(AppError::validation("extraction.scan_limit must be > 0"));
        }
        if self.extraction.title_max_chars == 0 {
            return Err(AppError::validation(
                "extraction.title_max_chars must be > 0",
            ));
        }
        if self.telegram.timeout_secs == 0 {
            return Err(AppError::validation("telegram.timeout_secs must be > 0"));
        }
        if self.monitor.interval_secs == 0 {
            return Err(AppError::validation("monitor.interval_secs must be > 0"));
        }
        Ok(())
    }

    /// Listen address with the `PORT` environment variable applied.
    pub fn listen_address(&self) -> String {
        match env::var("PORT") {
            Ok(port) if !port.trim().is_empty() => {
                let host = self
                    .server
                    .listen_address
                    .rsplit_once(':')
                    .map(|(host, _)| host)
                    .unwrap_or("0.0.0.0");
                format!("{host}:{}", port.trim())
            }
            _ => self.server.listen_address.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            sources: defaults::sources(),
            extraction: ExtractionConfig::default(),
            monitor: MonitorConfig::default(),
            server: ServerConfig::default(),
            telegram: TelegramConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP client settings used for page fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept header
    #[serde(default = "defaults::accept")]
    pub accept: String,

    /// Accept-Language header
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum sources fetched at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept: defaults::accept(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// A listing page and the category label its offers are reported under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceTarget {
    pub url: String,
    pub category: String,
}

/// Heuristic extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Site origin used to resolve site-relative links, also sent as Referer
    #[serde(default = "defaults::origin")]
    pub origin: String,

    /// Selector for each listing card
    #[serde(default = "defaults::card_selector")]
    pub card_selector: String,

    /// Selector for the seller status element within a card
    #[serde(default = "defaults::status_selector")]
    pub status_selector: String,

    /// Selector for the title/description element within a card
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// Selector for the price element within a card
    #[serde(default = "defaults::price_selector")]
    pub price_selector: String,

    /// Status texts meaning the seller is online (case-insensitive)
    #[serde(default = "defaults::online_markers")]
    pub online_markers: Vec<String>,

    /// Title substrings that mark a card as relevant (case-insensitive)
    #[serde(default = "defaults::keywords")]
    pub keywords: Vec<String>,

    /// Lowest accepted price, inclusive
    #[serde(default = "defaults::min_price")]
    pub min_price: u64,

    /// Highest accepted price, inclusive
    #[serde(default = "defaults::max_price")]
    pub max_price: u64,

    /// Maximum cards inspected per page
    #[serde(default = "defaults::scan_limit")]
    pub scan_limit: usize,

    /// Display length of offer titles, in grapheme clusters
    #[serde(default = "defaults::title_max_chars")]
    pub title_max_chars: usize,
}

impl ExtractionConfig {
    /// Lowercase matching lists so the extractor compares like with like.
    pub fn normalize(&mut self) {
        for keyword in &mut self.keywords {
            *keyword = keyword.to_lowercase();
        }
        for marker in &mut self.online_markers {
            *marker = marker.to_lowercase();
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let mut config = Self {
            origin: defaults::origin(),
            card_selector: defaults::card_selector(),
            status_selector: defaults::status_selector(),
            title_selector: defaults::title_selector(),
            price_selector: defaults::price_selector(),
            online_markers: defaults::online_markers(),
            keywords: defaults::keywords(),
            min_price: defaults::min_price(),
            max_price: defaults::max_price(),
            scan_limit: defaults::scan_limit(),
            title_max_chars: defaults::title_max_chars(),
        };
        config.normalize();
        config
    }
}

/// Polling loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Pause after a failed cycle
    #[serde(default = "defaults::error_backoff")]
    pub error_backoff_secs: u64,

    /// Offers shown by status views
    #[serde(default = "defaults::recent_limit")]
    pub recent_limit: usize,

    /// Start the polling session as soon as the server is up
    #[serde(default)]
    pub auto_start: bool,

    /// Currency label used in messages
    #[serde(default = "defaults::currency")]
    pub currency: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            error_backoff_secs: defaults::error_backoff(),
            recent_limit: defaults::recent_limit(),
            auto_start: false,
            currency: defaults::currency(),
        }
    }
}

/// Control surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::listen_address")]
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: defaults::listen_address(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "defaults::telegram_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub disable_web_preview: bool,

    /// Request timeout for Bot API calls, in seconds
    #[serde(default = "defaults::telegram_timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::telegram_api_base(),
            disable_web_preview: false,
            timeout_secs: defaults::telegram_timeout(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Credentials read from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub bot_token: String,
    pub chat_id: String,
}

impl Secrets {
    pub const BOT_TOKEN_VAR: &'static str = "TELEGRAM_BOT_TOKEN";
    pub const CHAT_ID_VAR: &'static str = "TELEGRAM_CHAT_ID";

    /// Read both secrets; either one missing is a startup error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::config(format!("{key} is not set")))
        };
        Ok(Self {
            bot_token: read(Self::BOT_TOKEN_VAR)?,
            chat_id: read(Self::CHAT_ID_VAR)?,
        })
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

mod defaults {
    use super::SourceTarget;

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept() -> String {
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".into()
    }
    pub fn accept_language() -> String {
        "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Source defaults
    pub fn sources() -> Vec<SourceTarget> {
        vec![SourceTarget {
            url: "https://funpay.com/chips/186/".to_string(),
            category: "Black Russia - Вирты".to_string(),
        }]
    }

    // Extraction defaults
    pub fn origin() -> String {
        "https://funpay.com".into()
    }
    pub fn card_selector() -> String {
        ".tc-item".into()
    }
    pub fn status_selector() -> String {
        "div.media-user-status".into()
    }
    pub fn title_selector() -> String {
        "div.tc-desc-text".into()
    }
    pub fn price_selector() -> String {
        "div.tc-price".into()
    }
    pub fn online_markers() -> Vec<String> {
        vec!["Онлайн".into(), "online".into()]
    }
    pub fn keywords() -> Vec<String> {
        vec![
            "black russia".into(),
            "blackrussia".into(),
            "блек раша".into(),
            "блек рашн".into(),
            "блэк раша".into(),
            "br ".into(),
            "бр ".into(),
            "black s".into(),
            "blacks".into(),
        ]
    }
    pub fn min_price() -> u64 {
        10
    }
    pub fn max_price() -> u64 {
        50_000
    }
    pub fn scan_limit() -> usize {
        40
    }
    pub fn title_max_chars() -> usize {
        100
    }

    // Monitor defaults
    pub fn interval() -> u64 {
        60
    }
    pub fn error_backoff() -> u64 {
        30
    }
    pub fn recent_limit() -> usize {
        10
    }
    pub fn currency() -> String {
        "руб.".into()
    }

    // Server defaults
    pub fn listen_address() -> String {
        "0.0.0.0:5000".into()
    }

    // Telegram defaults
    pub fn telegram_api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn telegram_timeout() -> u64 {
        15
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_price_range() {
        let mut config = Config::default();
        config.extraction.min_price = 100;
        config.extraction.max_price = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_telegram_timeout() {
        let mut config = Config::default();
        assert_eq!(config.telegram.timeout_secs, 15);
        config.telegram.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_sources() {
        let mut config = Config::default();
        config.sources.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_keywords_are_lowercase() {
        let config = ExtractionConfig::default();
        assert!(config.keywords.iter().all(|k| k == &k.to_lowercase()));
        assert!(config.online_markers.contains(&"онлайн".to_string()));
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[sources]]
url = "https://example.test/chips/1/"
category = "Test"

[extraction]
keywords = ["Widget"]
max_price = 900

[monitor]
interval_secs = 15

[telegram]
timeout_secs = 5
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].category, "Test");
        assert_eq!(config.extraction.keywords, vec!["widget".to_string()]);
        assert_eq!(config.extraction.max_price, 900);
        assert_eq!(config.extraction.min_price, 10);
        assert_eq!(config.monitor.interval_secs, 15);
        assert_eq!(config.monitor.error_backoff_secs, 30);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.telegram.timeout_secs, 5);
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.sources, defaults::sources());
    }

    #[test]
    fn secrets_require_both_values() {
        let mut env = HashMap::new();
        env.insert(Secrets::BOT_TOKEN_VAR, "123:abc".to_string());
        let missing = Secrets::from_lookup(|k| env.get(k).cloned());
        assert!(matches!(missing, Err(AppError::Config(_))));

        env.insert(Secrets::CHAT_ID_VAR, " 42 ".to_string());
        let secrets = Secrets::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(secrets.chat_id, "42");
        assert!(!format!("{secrets:?}").contains("123:abc"));
    }

    #[test]
    fn secrets_reject_blank_values() {
        let result = Secrets::from_lookup(|_| Some("   ".to_string()));
        assert!(result.is_err());
    }
}
