use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_CHAT_PATH: &str = "/api/chat";
const DEFAULT_VOICE_PATH: &str = "/upload_voice";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?} is not a valid URL ({source})")]
    InvalidUrl {
        key: &'static str,
        value: String,
        source: url::ParseError,
    },
    #[error("invalid {key}: {value:?} is not a positive whole number of seconds")]
    InvalidSeconds { key: &'static str, value: String },
}

/// Backend connection settings, read from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub chat_path: String,
    pub voice_path: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            voice_path: DEFAULT_VOICE_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads `CALMMATE_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!("failed to load .env: {err}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = non_empty(lookup("CALMMATE_BASE_URL")) {
            if let Err(source) = Url::parse(&value) {
                return Err(ConfigError::InvalidUrl {
                    key: "CALMMATE_BASE_URL",
                    value,
                    source,
                });
            }
            config.base_url = value.trim_end_matches('/').to_string();
        }
        if let Some(value) = non_empty(lookup("CALMMATE_CHAT_PATH")) {
            config.chat_path = normalize_path(&value);
        }
        if let Some(value) = non_empty(lookup("CALMMATE_VOICE_PATH")) {
            config.voice_path = normalize_path(&value);
        }
        if let Some(value) = non_empty(lookup("CALMMATE_REQUEST_TIMEOUT_SECS")) {
            config.request_timeout = parse_seconds("CALMMATE_REQUEST_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = non_empty(lookup("CALMMATE_CONNECT_TIMEOUT_SECS")) {
            config.connect_timeout = parse_seconds("CALMMATE_CONNECT_TIMEOUT_SECS", value)?;
        }

        Ok(config)
    }

    #[cfg(test)]
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn normalize_path(raw: &str) -> String {
    format!("/{}", raw.trim_start_matches('/'))
}

fn parse_seconds(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    match value.parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ConfigError::InvalidSeconds { key, value }),
    }
}
