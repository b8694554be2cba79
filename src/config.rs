use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::util::redact;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_RETRY_JITTER: Duration = Duration::from_millis(500);

/// Settings for the query interpreter.
///
/// Only the API key comes from the environment; the rest are tunables
/// set through the builder methods.
#[derive(Clone)]
pub struct InterpreterConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Upper bound for a single completion attempt
    pub timeout: Duration,
    /// Extra attempts allowed after a transient failure
    pub max_retries: u32,
    /// Retry delay is drawn uniformly from `0..retry_jitter`
    pub retry_jitter: Duration,
}

impl InterpreterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: 1,
            retry_jitter: DEFAULT_RETRY_JITTER,
        }
    }

    /// Load `OPENAI_API_KEY`, reading a `.env` file first if one exists
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY environment variable not set")?;

        let config = Self::new(api_key);
        info!(api_key = %redact(&config.api_key), model = %config.model, "Config loaded");
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_jitter(mut self, jitter: Duration) -> Self {
        self.retry_jitter = jitter;
        self
    }
}

impl std::fmt::Debug for InterpreterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpreterConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_jitter", &self.retry_jitter)
            .finish()
    }
}
