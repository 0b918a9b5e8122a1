use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client;

/// Which answer-generation backend, if any, backs the fallback resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerBackendConfig {
    Disabled,
    Anthropic { api_key: String, api_url: String },
    LocalQa { url: String },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a selected backend is missing its settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub profile_path: PathBuf,
    pub screenshot_dir: PathBuf,
    pub answer_backend: AnswerBackendConfig,
    pub answer_timeout: Duration,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: env_or("DATABASE_URL", "sqlite://data/applications.db"),
            profile_path: env_or("PROFILE_PATH", "data/user_profile.json").into(),
            screenshot_dir: env_or("SCREENSHOT_DIR", "data/screenshots").into(),
            answer_backend: answer_backend_from_env()?,
            answer_timeout: Duration::from_secs(
                env_or("ANSWER_TIMEOUT_SECS", "60")
                    .parse::<u64>()
                    .context("ANSWER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            headless: parse_bool(&env_or("HEADLESS", "false"))
                .context("HEADLESS must be true or false")?,
            chrome_path: std::env::var("CHROME_PATH").ok().map(PathBuf::from),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn answer_backend_from_env() -> Result<AnswerBackendConfig> {
    let kind = env_or("ANSWER_BACKEND", "none").to_lowercase();
    match kind.as_str() {
        "none" | "" => Ok(AnswerBackendConfig::Disabled),
        "anthropic" => Ok(AnswerBackendConfig::Anthropic {
            api_key: require_env("ANTHROPIC_API_KEY")?,
            api_url: env_or("ANTHROPIC_API_URL", llm_client::DEFAULT_API_URL),
        }),
        "local" => Ok(AnswerBackendConfig::LocalQa {
            url: require_env("LOCAL_QA_URL")?,
        }),
        other => bail!("ANSWER_BACKEND must be one of none, anthropic, local (got '{other}')"),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
