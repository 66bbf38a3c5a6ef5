use crate::domain::tts::TextLimits;
use crate::infrastructure::repositories::{FptSettings, PollBackoff};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Longest text a single provider call accepts
pub const MAX_TEXT_LIMIT: usize = 4096;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Unset runs the artifact store in process
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub environment: Environment,
    pub log_format: LogFormat,
    // OpenAI
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_timeout_secs: u64,
    // FPT.AI
    pub fpt_api_key: String,
    pub fpt_base_url: String,
    pub fpt_request_timeout_secs: u64,
    pub fpt_poll_base_delay_ms: u64,
    pub fpt_poll_growth_factor: f64,
    pub fpt_poll_max_delay_ms: u64,
    pub fpt_poll_max_attempts: u32,
    pub fpt_min_audio_bytes: usize,
    pub synthesis_timeout_secs: u64,
    // Audio cache
    pub cache_backend: CacheBackend,
    pub cache_dir: PathBuf,
    pub cache_memory_max_bytes: u64,
    // Artifact retention
    pub artifact_retention_hours: i64,
    pub reaper_interval_secs: u64,
    pub reaper_batch_size: usize,
    // Text limits per caller tier
    pub text_limit_guest: usize,
    pub text_limit_free: usize,
    pub text_limit_pro: usize,
    pub text_limit_premium: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Filesystem,
    Memory,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Read `name`, falling back to `default` when unset. A set but malformed value is an error.
fn var_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: var_or("PORT", 8080)?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_hours: var_or("JWT_EXPIRATION_HOURS", 1)?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            openai_api_key: env::var("OPENAI_API_KEY")?,
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            openai_timeout_secs: var_or("OPENAI_TIMEOUT_SECS", 60)?,
            fpt_api_key: env::var("FPT_API_KEY")?,
            fpt_base_url: env::var("FPT_BASE_URL")
                .unwrap_or_else(|_| "https://api.fpt.ai/hmi/tts/v5".to_string()),
            fpt_request_timeout_secs: var_or("FPT_REQUEST_TIMEOUT_SECS", 30)?,
            fpt_poll_base_delay_ms: var_or("FPT_POLL_BASE_DELAY_MS", 500)?,
            fpt_poll_growth_factor: var_or("FPT_POLL_GROWTH_FACTOR", 1.5)?,
            fpt_poll_max_delay_ms: var_or("FPT_POLL_MAX_DELAY_MS", 5000)?,
            fpt_poll_max_attempts: var_or("FPT_POLL_MAX_ATTEMPTS", 20)?,
            fpt_min_audio_bytes: var_or("FPT_MIN_AUDIO_BYTES", 1024)?,
            synthesis_timeout_secs: var_or("SYNTHESIS_TIMEOUT_SECS", 120)?,
            cache_backend: match env::var("CACHE_BACKEND")
                .unwrap_or_else(|_| "filesystem".to_string())
                .as_str()
            {
                "filesystem" => CacheBackend::Filesystem,
                "memory" => CacheBackend::Memory,
                other => {
                    return Err(ConfigError::InvalidValue {
                        name: "CACHE_BACKEND",
                        value: other.to_string(),
                    }
                    .into())
                }
            },
            cache_dir: env::var("CACHE_DIR")
                .unwrap_or_else(|_| "./audio-cache".to_string())
                .into(),
            cache_memory_max_bytes: var_or("CACHE_MEMORY_MAX_BYTES", 256 * 1024 * 1024)?,
            artifact_retention_hours: var_or("ARTIFACT_RETENTION_HOURS", 24)?,
            reaper_interval_secs: var_or("REAPER_INTERVAL_SECS", 600)?,
            reaper_batch_size: var_or("REAPER_BATCH_SIZE", 100)?,
            text_limit_guest: var_or("TEXT_LIMIT_GUEST", 500)?,
            text_limit_free: var_or("TEXT_LIMIT_FREE", 1000)?,
            text_limit_pro: var_or("TEXT_LIMIT_PRO", 2500)?,
            text_limit_premium: var_or("TEXT_LIMIT_PREMIUM", 4000)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fpt_poll_growth_factor >= 1.0) {
            return Err(ConfigError::Invalid(
                "FPT_POLL_GROWTH_FACTOR must be at least 1.0".to_string(),
            ));
        }
        if self.fpt_poll_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "FPT_POLL_MAX_ATTEMPTS must be greater than 0".to_string(),
            ));
        }
        if self.fpt_poll_base_delay_ms > self.fpt_poll_max_delay_ms {
            return Err(ConfigError::Invalid(
                "FPT_POLL_BASE_DELAY_MS must not exceed FPT_POLL_MAX_DELAY_MS".to_string(),
            ));
        }
        if self.artifact_retention_hours <= 0 {
            return Err(ConfigError::Invalid(
                "ARTIFACT_RETENTION_HOURS must be positive".to_string(),
            ));
        }
        if self.reaper_interval_secs == 0 || self.reaper_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "REAPER_INTERVAL_SECS and REAPER_BATCH_SIZE must be positive".to_string(),
            ));
        }
        if self.text_limits().max() > MAX_TEXT_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "text limits must not exceed {} characters",
                MAX_TEXT_LIMIT
            )));
        }
        Ok(())
    }

    pub fn text_limits(&self) -> TextLimits {
        TextLimits {
            guest: self.text_limit_guest,
            free: self.text_limit_free,
            pro: self.text_limit_pro,
            premium: self.text_limit_premium,
        }
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }

    pub fn artifact_retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.artifact_retention_hours)
    }

    pub fn fpt_settings(&self) -> FptSettings {
        FptSettings {
            api_key: self.fpt_api_key.clone(),
            submit_url: self.fpt_base_url.clone(),
            request_timeout: Duration::from_secs(self.fpt_request_timeout_secs),
            backoff: PollBackoff {
                base_delay: Duration::from_millis(self.fpt_poll_base_delay_ms),
                growth_factor: self.fpt_poll_growth_factor,
                max_delay: Duration::from_millis(self.fpt_poll_max_delay_ms),
                max_attempts: self.fpt_poll_max_attempts,
            },
            min_audio_bytes: self.fpt_min_audio_bytes,
        }
    }
}
