//! Analysis provider trait and HTTP implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::AiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BODY_CHARS: usize = 24_000;

const SYSTEM_PROMPT: &str = "You are an Azure infrastructure analyst. Given a resource's raw \
properties, summarize its purpose, flag cost and security concerns, and suggest concrete \
improvements. Be brief and concrete; use markdown headings and bullet lists.";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("provider response carried no content")]
    Empty,
}

/// Opaque text-in/text-out analysis provider
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Analyze `body` (raw resource JSON) for the resource named `subject`
    async fn analyze(&self, subject: &str, body: &str) -> Result<String, AiError>;
}

/// OpenAI-compatible chat-completions provider
pub struct HttpAnalyst {
    http: Client,
    endpoint: String,
    key: String,
    model: String,
}

impl HttpAnalyst {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            model: config.model.clone(),
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl Analyst for HttpAnalyst {
    async fn analyze(&self, subject: &str, body: &str) -> Result<String, AiError> {
        debug!(%subject, body_len = body.len(), "HttpAnalyst::analyze");
        let mut body = body.to_string();
        if body.len() > MAX_BODY_CHARS {
            body.truncate(MAX_BODY_CHARS);
            body.push_str("\n[truncated]");
        }

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("Resource: {}\n\n{}", subject, body) },
            ],
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or(AiError::Empty)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Scripted analyst for tests
    pub struct MockAnalyst {
        responses: Mutex<Vec<Result<String, String>>>,
    }

    impl MockAnalyst {
        pub fn new(responses: Vec<Result<String, String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl Analyst for MockAnalyst {
        async fn analyze(&self, _subject: &str, _body: &str) -> Result<String, AiError> {
            let next = self.responses.lock().unwrap().pop();
            match next {
                Some(Ok(text)) => Ok(text),
                Some(Err(body)) => Err(AiError::Api { status: 500, body }),
                None => Err(AiError::Empty),
            }
        }
    }

    #[tokio::test]
    async fn test_mock_analyst_scripts_responses() {
        let analyst = MockAnalyst::new(vec![Ok("looks healthy".to_string())]);
        let text = analyst.analyze("vm1", "{}").await.unwrap();
        assert_eq!(text, "looks healthy");
        assert!(analyst.analyze("vm1", "{}").await.is_err());
    }
}
