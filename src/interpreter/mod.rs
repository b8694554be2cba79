pub mod openai;
pub mod prompt;
pub mod traits;
pub mod types;
pub mod validate;

pub use openai::OpenAiTransport;
pub use traits::CompletionTransport;
pub use types::{CompletionRequest, TransportError};

use anyhow::Result;
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::InterpreterConfig;
use crate::models::SearchResult;
use crate::util::{extract_json_object, strip_code_fences};

/// Shown when the model extracted filters but did not say anything about them
pub const FALLBACK_MESSAGE: &str = "Searching for matches based on your description.";

/// Turns free-text car searches into `CarFilters` via a hosted completion model.
///
/// Stateless apart from read-only settings, so one instance can serve any
/// number of concurrent `parse` calls.
#[derive(Clone)]
pub struct QueryInterpreter {
    transport: Arc<dyn CompletionTransport>,
    system_prompt: String,
    timeout: Duration,
    max_retries: u32,
    retry_jitter: Duration,
}

impl QueryInterpreter {
    /// Create an interpreter backed by the OpenAI transport
    pub fn new(config: &InterpreterConfig) -> Result<Self> {
        let transport = OpenAiTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Create an interpreter over any completion transport
    pub fn with_transport(
        transport: Arc<dyn CompletionTransport>,
        config: &InterpreterConfig,
    ) -> Self {
        Self {
            transport,
            system_prompt: prompt::system_prompt(),
            timeout: config.timeout,
            max_retries: config.max_retries,
            retry_jitter: config.retry_jitter,
        }
    }

    /// Interpret one search phrase.
    ///
    /// Never fails: any transport or parse problem degrades to
    /// `SearchResult::empty()` so the caller falls back to an unfiltered search.
    pub async fn parse(&self, query: &str) -> SearchResult {
        let query = query.trim();
        if query.is_empty() {
            debug!("Empty search query, skipping interpretation");
            return SearchResult::empty();
        }

        let request = CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            user_prompt: query.to_string(),
        };

        let content = match self.complete_with_retry(&request).await {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    provider = self.transport.provider_name(),
                    error = %e,
                    "Query interpretation failed, falling back to unfiltered search"
                );
                return SearchResult::empty();
            }
        };

        match interpret_reply(&content) {
            Some(result) => {
                info!(
                    query,
                    filters = result.filters.to_query_pairs().len(),
                    "Interpreted search query"
                );
                result
            }
            None => {
                warn!(
                    response_len = content.len(),
                    "Model reply lacked the expected shape, falling back to unfiltered search"
                );
                SearchResult::empty()
            }
        }
    }

    async fn complete_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, TransportError> {
        let mut attempt = 0;
        loop {
            let outcome = tokio::time::timeout(self.timeout, self.transport.complete(request))
                .await
                .unwrap_or(Err(TransportError::Timeout));

            match outcome {
                Ok(content) => return Ok(content),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.jitter();
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient completion failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn jitter(&self) -> Duration {
        let max = self.retry_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max))
    }
}

/// Map the model's raw text to a validated `SearchResult`.
///
/// `None` unless the reply is a JSON object carrying a `filters` object or a
/// usable `message`; anything else has lost the expected shape.
pub fn interpret_reply(content: &str) -> Option<SearchResult> {
    let value = parse_json_object(content)?;
    let reply = value.as_object()?;

    let filters = reply.get("filters").filter(|f| f.is_object());
    let message = validate::validate_message(reply.get("message"));
    if filters.is_none() && message.is_none() {
        return None;
    }

    Some(SearchResult {
        filters: filters.map(validate::validate_filters).unwrap_or_default(),
        message: message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
    })
}

fn parse_json_object(content: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(content) {
        return Some(value);
    }

    // one defensive pass: drop code fences, then fall back to the outer {...} span
    let stripped = strip_code_fences(content);
    serde_json::from_str::<Value>(stripped)
        .ok()
        .or_else(|| extract_json_object(stripped).and_then(|s| serde_json::from_str(s).ok()))
}
