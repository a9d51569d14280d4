//! Relay to the external generative-text provider.
//!
//! The provider credential stays server-side; requests carry it in a
//! header, never in the URL, and provider failures are never forwarded
//! to clients verbatim.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;

/// Reply sent to the client whenever the provider call fails.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Upper bound on relayed message length, to bound upstream cost.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Bound on the wait for the upstream provider.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum ChatError {
    /// No API key configured; the provider is unreachable by definition.
    Unconfigured,
    Http(reqwest::Error),
    Status(reqwest::StatusCode),
    /// The provider answered 200 with a body carrying no reply text.
    Shape,
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Unconfigured => write!(f, "chat provider API key is not configured"),
            ChatError::Http(e) => write!(f, "chat provider request failed: {}", e),
            ChatError::Status(status) => write!(f, "chat provider returned {}", status),
            ChatError::Shape => write!(f, "chat provider returned an unexpected response shape"),
        }
    }
}

impl std::error::Error for ChatError {}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Stateless client for the provider's generate endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, reqwest::Error> {
        if config.api_key.is_none() {
            tracing::warn!("CHAT_API_KEY is not set; chat relay will always fall back");
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Forward `message` to the provider and return the first textual
    /// candidate. Transient transport failures are retried once; HTTP
    /// error statuses are not.
    pub async fn relay(&self, message: &str) -> Result<String, ChatError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ChatError::Unconfigured)?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: message }],
            }],
        };

        let response = match self.send(api_key, &request).await {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                tracing::warn!("Chat provider request failed, retrying once: {}", e);
                self.send(api_key, &request)
                    .await
                    .map_err(ChatError::Http)?
            }
            Err(e) => return Err(ChatError::Http(e)),
        };

        if !response.status().is_success() {
            return Err(ChatError::Status(response.status()));
        }

        let body: GenerateResponse = response.json().await.map_err(ChatError::Http)?;
        first_text(&body).ok_or(ChatError::Shape)
    }

    async fn send(
        &self,
        api_key: &str,
        request: &GenerateRequest<'_>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .post(&self.config.api_url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
    }
}

fn first_text(response: &GenerateResponse) -> Option<String> {
    response
        .candidates
        .first()?
        .content
        .as_ref()?
        .parts
        .first()?
        .text
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_first_candidate_text() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "Spend less than you earn."}]}},
                    {"content": {"parts": [{"text": "second candidate"}]}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            first_text(&body).as_deref(),
            Some("Spend less than you earn.")
        );
    }

    #[test]
    fn test_empty_body_has_no_text() {
        let body: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(first_text(&body).is_none());

        let body: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(first_text(&body).is_none());
    }

    #[test]
    fn test_candidate_without_text_has_no_text() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": [{}]}}]}"#).unwrap();
        assert!(first_text(&body).is_none());

        let body: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{}]}"#).unwrap();
        assert!(first_text(&body).is_none());
    }

    #[tokio::test]
    async fn test_relay_without_api_key_is_unconfigured() {
        let client = ChatClient::new(ChatConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            api_key: None,
        })
        .unwrap();
        assert!(matches!(
            client.relay("hello").await,
            Err(ChatError::Unconfigured)
        ));
    }
}
