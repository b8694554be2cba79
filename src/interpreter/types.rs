use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Provider-agnostic request
// =============================================================================

/// One completion: a fixed system instruction plus the user's raw text
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode provider response: {0}")]
    Decode(String),
    #[error("completion contained no content")]
    EmptyCompletion,
}

impl TransportError {
    /// Worth one more attempt: timeouts, connection trouble, 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Timeout | TransportError::Network(_) => true,
            TransportError::Status { status, .. } => *status >= 500,
            TransportError::Decode(_) | TransportError::EmptyCompletion => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_decode() || err.is_body() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

// =============================================================================
// Chat completion wire format
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl ChatRequest {
    pub fn json_mode(model: &str, request: &CompletionRequest) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                WireMessage::system(&request.system_prompt),
                WireMessage::user(&request.user_prompt),
            ],
            temperature: 0.0,
            response_format: ResponseFormat::json_object(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    pub fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::Network("refused".into()).is_transient());
        assert!(TransportError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!TransportError::Status { status: 401, body: String::new() }.is_transient());
        assert!(!TransportError::Decode("bad".into()).is_transient());
        assert!(!TransportError::EmptyCompletion.is_transient());
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let request = CompletionRequest {
            system_prompt: "sys".to_string(),
            user_prompt: "red ute".to_string(),
        };
        let json = serde_json::to_value(ChatRequest::json_mode("gpt-4o-mini", &request)).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "red ute");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_chat_response_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"filters\":{}}"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_content().as_deref(), Some("{\"filters\":{}}"));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.into_content().is_none());
    }
}
