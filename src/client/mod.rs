//! Typed fetch wrapper for the data service.
//!
//! One JSON request per call: no retries, no timeout override, no response caching (the
//! query cache sits above this layer). Non-2xx responses become [`ClientError::Network`]
//! carrying the response body as the message.

mod collections;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::auth::API_KEY_HEADER;
use crate::errors::{ClientError, ErrorResponse};
use crate::session::AuthState;

/// How requests are authorized.
#[derive(Clone)]
enum Credentials {
    Anonymous,
    /// Service key, used by operational commands such as admin seeding.
    ServiceKey(String),
    /// A fixed bearer token.
    Bearer(String),
    /// Whatever session the auth context currently holds.
    Session(watch::Receiver<AuthState>),
}

/// HTTP client for the data service's REST-like endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: Credentials::Anonymous,
        }
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.credentials = Credentials::ServiceKey(key.into());
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.credentials = Credentials::Bearer(token.into());
        self
    }

    /// Authorize every request with the session the auth context holds at send time.
    pub fn with_session(mut self, auth: watch::Receiver<AuthState>) -> Self {
        self.credentials = Credentials::Session(auth);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Anonymous => builder,
            Credentials::ServiceKey(key) => builder.header(API_KEY_HEADER, key),
            Credentials::Bearer(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            Credentials::Session(auth) => {
                let token = auth.borrow().token().map(str::to_string);
                match token {
                    Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
                    None => builder,
                }
            }
        }
    }

    /// Send one JSON request and decode the JSON response.
    ///
    /// An empty 2xx body decodes as `null`, so `T = ()` works for deletes.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ClientError> {
        let mut builder = self
            .http
            .request(method.clone(), self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = self.authorize(builder).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &text);
            tracing::debug!("{} {} failed with {}: {}", method, path, status, message);
            return Err(ClientError::Network {
                status: Some(status.as_u16()),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Message for a failed response: the envelope's message when the body is the service's error
/// envelope, otherwise the raw body, otherwise the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorResponse>(body) {
        return envelope.error.message;
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_envelope() {
        let body = r#"{"success":false,"error":{"code":"NOT_FOUND","message":"Record abc not found"}}"#;
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, body),
            "Record abc not found"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_body_text() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "upstream down"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/api/services"), "http://localhost:8080/api/services");
    }
}
