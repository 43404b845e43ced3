//! Chat-completion wire format
//!
//! Request and response bodies of an OpenAI-compatible chat-completions
//! endpoint, plus the pure parts of talking to it: pulling the completion text
//! out of a response body and turning an error body into a readable message.

use serde::{Deserialize, Serialize};

/// Why a completion call failed.
///
/// The retry loop treats every variant the same way; the distinction only
/// matters for logs and messages.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Completion endpoint returned status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Malformed completion response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

/// Build a request body holding a system and a user message.
pub fn build_chat_request(
    model: &str,
    system_prompt: &str,
    user_prompt: &str,
    temperature: f32,
    max_tokens: u32,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            },
        ],
        temperature,
        max_tokens,
    }
}

/// Extract `choices[0].message.content` from a raw response body.
pub fn extract_completion_text(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::Malformed(format!("invalid JSON body: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            CompletionError::Malformed("response has no choices[0].message.content".to_string())
        })
}

/// Turn an upstream error body into a one-line message.
///
/// Understands the OpenAI-style `{"error": {"message", "type", "code"}}`
/// envelope and falls back to the raw body.
pub fn extract_api_error(body: &str) -> String {
    #[derive(Debug, Deserialize)]
    struct ErrorEnvelope {
        error: Option<ApiError>,
    }

    #[derive(Debug, Deserialize)]
    struct ApiError {
        message: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
        code: Option<serde_json::Value>,
    }

    if let Ok(ErrorEnvelope { error: Some(err) }) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = err.message.unwrap_or_else(|| "unknown error".to_string());
        let kind = err.kind.unwrap_or_else(|| "unknown".to_string());
        let code = match err.code {
            Some(serde_json::Value::String(code)) => code,
            Some(other) if !other.is_null() => other.to_string(),
            _ => "none".to_string(),
        };
        return format!("{message} (type={kind}, code={code})");
    }

    body.trim().to_string()
}
