use promptforge_core::completion::{
    build_chat_request, extract_api_error, extract_completion_text, CompletionError,
};
use promptforge_core::prompt::preview;
use color_eyre::eyre::{eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

/// Default OpenAI-compatible chat-completions endpoint (Groq).
pub const DEFAULT_COMPLETION_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";

const PREVIEW_CHARS: usize = 500;

/// Something that turns a system + user prompt pair into text.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, CompletionError>;
}

/// Completion endpoint settings.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionOptions {
    /// API key sent as a bearer token
    #[clap(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Chat-completions endpoint URL
    #[clap(long, env = "PROMPTFORGE_COMPLETION_URL", default_value = DEFAULT_COMPLETION_URL)]
    pub completion_url: String,

    /// Model name
    #[clap(long, env = "PROMPTFORGE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature
    #[clap(long, env = "PROMPTFORGE_TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    /// Maximum tokens in a completion
    #[clap(long, env = "PROMPTFORGE_MAX_TOKENS", default_value = "4000")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[clap(long, env = "PROMPTFORGE_TIMEOUT_SECS", default_value = "120")]
    pub timeout_secs: u64,
}

/// [`CompletionClient`] for OpenAI-compatible chat-completions endpoints.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpCompletionClient {
    /// Fails only on configuration problems, never on the network.
    pub fn new(options: &CompletionOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", options.api_key))
            .map_err(|_| eyre!("API key contains characters not allowed in an HTTP header"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            url: options.completion_url.clone(),
            model: options.model.clone(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        })
    }
}

#[async_trait::async_trait]
impl CompletionClient for HttpCompletionClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CompletionError> {
        let request = build_chat_request(
            &self.model,
            system_prompt,
            user_prompt,
            self.temperature,
            self.max_tokens,
        );

        log::info!(
            "Calling completion endpoint with model {} (prompt: {})",
            self.model,
            preview(user_prompt, 100)
        );

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Completion request failed: {e}");
                CompletionError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Network(format!("Failed to read response body: {e}")))?;

        if !status.is_success() {
            let message = extract_api_error(&body);
            log::error!("Completion endpoint returned {status}: {message}");
            return Err(CompletionError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let text = extract_completion_text(&body)?;
        log::info!("Raw completion: {}", preview(&text, PREVIEW_CHARS));

        Ok(text)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn options(url: &str) -> CompletionOptions {
        CompletionOptions {
            api_key: "secret".to_string(),
            completion_url: url.to_string(),
            model: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 100,
            timeout_secs: 2,
        }
    }

    #[test]
    fn test_client_exposes_model_name() {
        let client = HttpCompletionClient::new(&options(DEFAULT_COMPLETION_URL)).unwrap();
        assert_eq!(client.model_name(), "test-model");
    }

    #[test]
    fn test_invalid_api_key_is_configuration_error() {
        let mut options = options(DEFAULT_COMPLETION_URL);
        options.api_key = "sk-abc\ndef".to_string();

        let err = HttpCompletionClient::new(&options).unwrap_err();
        assert!(err.to_string().contains("API key"));
        assert!(!err.to_string().contains("sk-abc"));
    }

    /// Serve `router` on an ephemeral port and return its chat URL.
    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1/chat/completions")
    }

    fn upstream(status: u16, body: &'static str) -> axum::Router {
        use axum::http::StatusCode;
        use axum::routing::post;

        axum::Router::new().route(
            "/v1/chat/completions",
            post(move |headers: axum::http::HeaderMap| async move {
                let authorized = headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer secret");
                if !authorized {
                    return (StatusCode::UNAUTHORIZED, "missing bearer token");
                }
                (StatusCode::from_u16(status).unwrap(), body)
            }),
        )
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let url = serve(upstream(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"```src/App.js\nx\n```"}}]}"#,
        ))
        .await;

        let client = HttpCompletionClient::new(&options(&url)).unwrap();
        let text = client.complete("sys", "user").await.unwrap();
        assert_eq!(text, "```src/App.js\nx\n```");
    }

    #[tokio::test]
    async fn test_error_status_is_http_error() {
        let url = serve(upstream(
            429,
            r#"{"error":{"message":"Rate limit reached","type":"tokens","code":"rate_limit_exceeded"}}"#,
        ))
        .await;

        let client = HttpCompletionClient::new(&options(&url)).unwrap();
        let err = client.complete("sys", "user").await.unwrap_err();
        assert_eq!(
            err,
            CompletionError::Http {
                status: 429,
                message: "Rate limit reached (type=tokens, code=rate_limit_exceeded)".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_body_without_choices_is_malformed() {
        let url = serve(upstream(200, r#"{"id":"abc","choices":[]}"#)).await;

        let client = HttpCompletionClient::new(&options(&url)).unwrap();
        let err = client.complete("sys", "user").await.unwrap_err();
        assert!(matches!(err, CompletionError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = HttpCompletionClient::new(&options("http://127.0.0.1:9/v1/chat")).unwrap();
        let err = client.complete("sys", "user").await.unwrap_err();
        assert!(matches!(err, CompletionError::Network(_)));
    }
}
