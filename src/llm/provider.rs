//! HTTP completion service
//!
//! Implements `CompletionService` over any OpenAI-compatible
//! `/v1/chat/completions` endpoint.

use super::traits::{CompletionRequest, CompletionService};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// HTTP-based completion service.
///
/// Thread-safe and cheaply cloneable (shares the reqwest client internally).
#[derive(Clone)]
pub struct HttpCompletionService {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl HttpCompletionService {
    /// Create a service for `url` (the full chat-completions endpoint).
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl CompletionService for HttpCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut req = self.client.post(&self.url).json(request);

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req
            .send()
            .await
            .with_context(|| format!("Failed to connect to completion API at {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(detail) = err.error {
                    anyhow::bail!(
                        "Completion API error ({}): {}",
                        status.as_u16(),
                        detail.message
                    );
                }
            }
            anyhow::bail!("Completion API returned {}: {}", status.as_u16(), body);
        }

        let resp: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse completion API response")?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("Completion API returned no content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ConversationTurn;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4".into(),
            messages: vec![
                ConversationTurn::system("rules"),
                ConversationTurn::user("What are the top 5 side effects reported?"),
            ],
            temperature: 0.0,
            max_tokens: 1000,
        }
    }

    fn service(server: &MockServer, key: Option<&str>) -> HttpCompletionService {
        HttpCompletionService::new(
            format!("{}/v1/chat/completions", server.uri()),
            key.map(String::from),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4",
                "temperature": 0.0,
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "rules"},
                    {"role": "user", "content": "What are the top 5 side effects reported?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "MATCH (n) RETURN n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = service(&server, Some("sk-test"))
            .complete(&request())
            .await
            .unwrap();
        assert_eq!(text, "MATCH (n) RETURN n");
    }

    #[tokio::test]
    async fn test_complete_surfaces_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = service(&server, Some("bad"))
            .complete(&request())
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = service(&server, None)
            .complete(&request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no content"));
    }

    #[tokio::test]
    async fn test_complete_does_not_retry_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = service(&server, None)
            .complete(&request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let svc = HttpCompletionService::new(
            "http://localhost/v1/chat/completions".into(),
            Some(String::new()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(svc.api_key.is_none());
    }
}
