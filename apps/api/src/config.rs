use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::retry::RetryPolicy;

const DEFAULT_DATABASE_URL: &str = "sqlite://resume_analyzer.db";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_MAX_RESUME_CHARS: usize = 30_000;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    pub max_resume_chars: usize,
    pub llm_retries: u32,
    pub llm_initial_delay_secs: f64,
    pub llm_backoff_factor: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Config {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            anthropic_api_key: get("ANTHROPIC_API_KEY").with_context(|| {
                "Required environment variable 'ANTHROPIC_API_KEY' is not set"
            })?,
            port: parse_or(&get, "PORT", 8000)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_resume_chars: parse_or(&get, "MAX_RESUME_CHARS", DEFAULT_MAX_RESUME_CHARS)?,
            llm_retries: parse_or(&get, "LLM_RETRIES", 3)?,
            llm_initial_delay_secs: parse_or(&get, "LLM_INITIAL_DELAY_SECS", 2.0)?,
            llm_backoff_factor: parse_or(&get, "LLM_BACKOFF_FACTOR", 2.0)?,
        };

        if config.llm_retries == 0 {
            bail!("LLM_RETRIES must be at least 1");
        }
        if !(config.llm_initial_delay_secs.is_finite() && config.llm_initial_delay_secs >= 0.0) {
            bail!("LLM_INITIAL_DELAY_SECS must be a non-negative number");
        }
        if !(config.llm_backoff_factor.is_finite() && config.llm_backoff_factor >= 1.0) {
            bail!("LLM_BACKOFF_FACTOR must be a number >= 1");
        }

        Ok(config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.llm_retries,
            initial_delay: Duration::from_secs_f64(self.llm_initial_delay_secs),
            backoff_factor: self.llm_backoff_factor,
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
