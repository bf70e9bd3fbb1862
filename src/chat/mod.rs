//! Chat assistant backed by a hosted completion API.
//!
//! One completion call per user message, no retries. When the call fails the assistant
//! answers with a message pointing to the human contact channel instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::errors::ClientError;

/// `generate(prompt) -> text`
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ClientError>;
}

/// Provider speaking the `models/{model}:generateContent` API.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiProvider {
    pub fn new(config: &ChatConfig) -> Result<Self, ClientError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ClientError::ExternalService("no chat API key configured (SITE_CHAT_API_KEY)".to_string())
        })?;
        Ok(Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::ExternalService(format!(
                "{}: {}",
                status,
                body.trim()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClientError::ExternalService(e.to_string()))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ClientError::ExternalService(
                "empty completion".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    /// The assistant reply was substituted because the completion failed.
    pub is_fallback: bool,
}

/// One chat session: the transcript plus the provider answering it.
pub struct ChatAssistant<P> {
    provider: P,
    contact_email: String,
    transcript: Vec<ChatMessage>,
}

impl<P: CompletionProvider> ChatAssistant<P> {
    pub fn new(provider: P, contact_email: impl Into<String>) -> Self {
        Self {
            provider,
            contact_email: contact_email.into(),
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Reply used when the completion API is unavailable.
    pub fn fallback_reply(&self) -> String {
        format!(
            "Sorry, I can't answer right now. Please reach out to us at {} and someone from the team will get back to you.",
            self.contact_email
        )
    }

    /// Send a user message and return the assistant's reply. Blank messages are ignored.
    pub async fn send(&mut self, message: &str) -> Option<ChatMessage> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage {
            role: ChatRole::User,
            text: message.to_string(),
            is_fallback: false,
        });

        let reply = match self.provider.generate(message).await {
            Ok(text) => ChatMessage {
                role: ChatRole::Assistant,
                text,
                is_fallback: false,
            },
            Err(err) => {
                tracing::warn!("Chat completion failed: {}", err);
                ChatMessage {
                    role: ChatRole::Assistant,
                    text: self.fallback_reply(),
                    is_fallback: true,
                }
            }
        };

        self.transcript.push(reply.clone());
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl CompletionProvider for Echo {
        async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
            Ok(format!("You said: {}", prompt))
        }
    }

    struct Down;

    #[async_trait]
    impl CompletionProvider for Down {
        async fn generate(&self, _prompt: &str) -> Result<String, ClientError> {
            Err(ClientError::ExternalService("503".to_string()))
        }
    }

    #[tokio::test]
    async fn test_reply_is_recorded() {
        let mut chat = ChatAssistant::new(Echo, "hello@example.com");
        let reply = chat.send("  pricing? ").await.unwrap();
        assert_eq!(reply.text, "You said: pricing?");
        assert!(!reply.is_fallback);
        assert_eq!(chat.transcript().len(), 2);
        assert_eq!(chat.transcript()[0].role, ChatRole::User);
    }

    #[tokio::test]
    async fn test_failure_substitutes_contact_message() {
        let mut chat = ChatAssistant::new(Down, "hello@example.com");
        let reply = chat.send("hi").await.unwrap();
        assert!(reply.is_fallback);
        assert_eq!(reply.role, ChatRole::Assistant);
        assert!(reply.text.contains("hello@example.com"));
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let mut chat = ChatAssistant::new(Echo, "hello@example.com");
        assert!(chat.send("   ").await.is_none());
        assert!(chat.transcript().is_empty());
    }

    #[test]
    fn test_provider_requires_key() {
        let config = ChatConfig {
            api_url: "https://example.invalid/v1beta".to_string(),
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
        };
        assert!(matches!(
            GeminiProvider::new(&config),
            Err(ClientError::ExternalService(_))
        ));
    }
}
