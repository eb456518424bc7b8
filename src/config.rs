// Runtime configuration from the environment (and an optional .env file)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::downloader::NetworkConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set")]
    MissingToken,

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub bot_username: String,
    pub ledger_path: PathBuf,
    /// Requests allowed in the acquire/transcode stage at once
    pub max_concurrent_jobs: usize,
    /// Wall-clock bound on acquire + transcode for one request
    pub request_timeout: Duration,
    /// Budget for the whole strategy loop
    pub acquire_timeout: Duration,
    pub transcode_timeout: Duration,
    /// Bound on a single backend process
    pub backend_timeout: Duration,
    /// Deliver the raw download when the transcode fails
    pub fallback_to_raw: bool,
    pub ytdlp_path: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub network: NetworkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            bot_username: "eyysavebot".to_string(),
            ledger_path: default_ledger_path(),
            max_concurrent_jobs: 4,
            request_timeout: Duration::from_secs(420),
            acquire_timeout: Duration::from_secs(240),
            transcode_timeout: Duration::from_secs(120),
            backend_timeout: Duration::from_secs(180),
            fallback_to_raw: true,
            ytdlp_path: None,
            ffmpeg_path: None,
            network: NetworkConfig::default(),
        }
    }
}

impl Config {
    /// Load from process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.bot_token = get("BOT_TOKEN").ok_or(ConfigError::MissingToken)?;

        if let Some(name) = get("BOT_USERNAME") {
            config.bot_username = name.trim_start_matches('@').to_string();
        }
        if let Some(path) = get("SAVEBOT_LEDGER_PATH") {
            config.ledger_path = PathBuf::from(path);
        }
        if let Some(v) = get("SAVEBOT_MAX_JOBS") {
            config.max_concurrent_jobs = parse::<usize>("SAVEBOT_MAX_JOBS", &v)?.max(1);
        }
        if let Some(v) = get("SAVEBOT_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = secs("SAVEBOT_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SAVEBOT_ACQUIRE_TIMEOUT_SECS") {
            config.acquire_timeout = secs("SAVEBOT_ACQUIRE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SAVEBOT_TRANSCODE_TIMEOUT_SECS") {
            config.transcode_timeout = secs("SAVEBOT_TRANSCODE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SAVEBOT_BACKEND_TIMEOUT_SECS") {
            config.backend_timeout = secs("SAVEBOT_BACKEND_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SAVEBOT_FALLBACK_TO_RAW") {
            config.fallback_to_raw = parse_bool("SAVEBOT_FALLBACK_TO_RAW", &v)?;
        }
        config.ytdlp_path = get("YTDLP_PATH");
        config.ffmpeg_path = get("FFMPEG_PATH");

        Ok(config)
    }
}

fn default_ledger_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("savebot")
        .join("usage.json")
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn secs(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match parse::<u64>(key, value)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
        n => Ok(Duration::from_secs(n)),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_token_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingToken)));
        assert!(matches!(load(&[("BOT_TOKEN", "  ")]), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.bot_username, "eyysavebot");
        assert_eq!(config.max_concurrent_jobs, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(420));
        assert_eq!(config.acquire_timeout, Duration::from_secs(240));
        assert!(config.fallback_to_raw);
        assert!(config.ledger_path.ends_with("savebot/usage.json"));
        assert_eq!(config.network.socket_timeout, 30);
        assert_eq!(config.network.retries, 3);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BOT_TOKEN", "123:abc"),
            ("BOT_USERNAME", "@otherbot"),
            ("SAVEBOT_MAX_JOBS", "8"),
            ("SAVEBOT_TRANSCODE_TIMEOUT_SECS", "60"),
            ("SAVEBOT_FALLBACK_TO_RAW", "off"),
            ("FFMPEG_PATH", "/opt/ffmpeg"),
        ])
        .unwrap();
        assert_eq!(config.bot_username, "otherbot");
        assert_eq!(config.max_concurrent_jobs, 8);
        assert_eq!(config.transcode_timeout, Duration::from_secs(60));
        assert!(!config.fallback_to_raw);
        assert_eq!(config.ffmpeg_path.as_deref(), Some("/opt/ffmpeg"));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("BOT_TOKEN", "t"), ("SAVEBOT_MAX_JOBS", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SAVEBOT_MAX_JOBS", .. }));

        let err = load(&[("BOT_TOKEN", "t"), ("SAVEBOT_REQUEST_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = load(&[("BOT_TOKEN", "t"), ("SAVEBOT_FALLBACK_TO_RAW", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
