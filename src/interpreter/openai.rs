use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::InterpreterConfig;

use super::traits::CompletionTransport;
use super::types::{ChatRequest, ChatResponse, CompletionRequest, TransportError};

/// OpenAI-compatible chat completion transport
pub struct OpenAiTransport {
    client: Client,
    headers: HeaderMap,
    base_url: String,
    model: String,
}

impl OpenAiTransport {
    pub fn new(config: &InterpreterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .context("API key is not a valid header value")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            headers,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionTransport for OpenAiTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest::json_mode(&self.model, request);

        debug!(model = %self.model, %url, "OpenAI chat request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "OpenAI returned an error status");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;
        chat.into_content().ok_or(TransportError::EmptyCompletion)
    }

    fn provider_name(&self) -> &'static str {
        "OpenAI"
    }
}
