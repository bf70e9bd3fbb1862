//! Client-side failures.

use thiserror::Error;

/// Failure of a client-side action. Every variant degrades to a visible message at the view
/// that triggered it; none of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request could not complete, or the service answered with a non-2xx status.
    #[error("{message}")]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// Required form fields are empty; nothing was sent.
    #[error("Please fill in: {}", .fields.join(", "))]
    Validation { fields: Vec<&'static str> },

    /// No session, or the session expired.
    #[error("Authentication required: {0}")]
    Auth(String),

    /// The hosted chat completion API failed.
    #[error("Chat service unavailable: {0}")]
    ExternalService(String),

    /// The response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn validation(fields: Vec<&'static str>) -> Self {
        ClientError::Validation { fields }
    }

    /// HTTP status of a failed request, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Network { status, .. } => *status,
            _ => None,
        }
    }

    /// True when the service rejected the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Auth(_)) || self.status() == Some(401)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        ClientError::Network {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
