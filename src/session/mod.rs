//! Auth context.
//!
//! An explicitly constructed holder of the admin session, created once at startup and passed to
//! whatever needs identity: the auth guard, the fetch wrapper (for bearer tokens) and the
//! mutation executor (to report rejected sessions). Observers get a `watch` receiver and see
//! every change, including expiry detected elsewhere.

mod guard;

pub use guard::*;

use std::rc::Rc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::watch;

use crate::client::ApiClient;
use crate::errors::ClientError;

/// A signed-in admin session as issued by `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Answer of `GET /auth/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// What the guard and views read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// The initial session check has not finished yet.
    pub loading: bool,
    pub session: Option<Session>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        !self.loading
            && self
                .session
                .as_ref()
                .is_some_and(|session| session.expires_at > Utc::now())
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }
}

/// Process-wide auth context. Clones share the same state.
#[derive(Clone)]
pub struct AuthContext {
    client: ApiClient,
    state: Rc<watch::Sender<AuthState>>,
}

impl AuthContext {
    /// Start in the loading state; call [`AuthContext::restore`] to settle it.
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(AuthState {
            loading: true,
            session: None,
        });
        Self {
            client,
            state: Rc::new(state),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Client that authorizes requests with the current session.
    pub fn authorized_client(&self) -> ApiClient {
        self.client.clone().with_session(self.subscribe())
    }

    /// Validate a persisted token with the service and settle the loading state.
    pub async fn restore(&self, token: Option<String>) -> AuthState {
        let session = match token {
            Some(token) => {
                let result: Result<SessionInfo, ClientError> = self
                    .client
                    .clone()
                    .with_bearer(token.clone())
                    .request(Method::GET, "/auth/session", None)
                    .await;
                match result {
                    Ok(info) => Some(Session {
                        token,
                        email: info.email,
                        expires_at: info.expires_at,
                    }),
                    Err(err) => {
                        tracing::warn!("Stored session is no longer valid: {}", err);
                        None
                    }
                }
            }
            None => None,
        };

        self.state.send_replace(AuthState {
            loading: false,
            session,
        });
        self.state()
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let mut missing = Vec::new();
        if email.trim().is_empty() {
            missing.push("email");
        }
        if password.is_empty() {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(ClientError::validation(missing));
        }

        let body = json!({ "email": email.trim(), "password": password });
        let result: Result<Session, ClientError> = self
            .client
            .request(Method::POST, "/auth/login", Some(&body))
            .await;

        match result {
            Ok(session) => {
                tracing::info!("Signed in as {}", session.email);
                self.state.send_replace(AuthState {
                    loading: false,
                    session: Some(session.clone()),
                });
                Ok(session)
            }
            Err(err) if err.status() == Some(401) => Err(ClientError::Auth(err.to_string())),
            Err(err) => Err(err),
        }
    }

    /// End the session locally and, best effort, on the service.
    pub async fn logout(&self) {
        if self.state.borrow().session.is_some() {
            let result: Result<(), ClientError> = self
                .authorized_client()
                .request(Method::POST, "/auth/logout", None)
                .await;
            if let Err(err) = result {
                tracing::warn!("Logout request failed: {}", err);
            }
        }
        self.clear();
    }

    /// The service rejected the session; drop it so guarded views redirect.
    pub fn expire(&self) {
        if self.state.borrow().session.is_some() {
            tracing::info!("Session expired");
        }
        self.clear();
    }

    fn clear(&self) {
        self.state.send_replace(AuthState {
            loading: false,
            session: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: Duration) -> Session {
        Session {
            token: "t".to_string(),
            email: "admin@example.com".to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn test_loading_is_never_authenticated() {
        let state = AuthState {
            loading: true,
            session: Some(session(Duration::hours(1))),
        };
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_expired_session_is_not_authenticated() {
        let state = AuthState {
            loading: false,
            session: Some(session(Duration::seconds(-5))),
        };
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_expire_clears_session() {
        let auth = AuthContext::new(ApiClient::new("http://127.0.0.1:9"));
        auth.state.send_replace(AuthState {
            loading: false,
            session: Some(session(Duration::hours(1))),
        });
        let receiver = auth.subscribe();
        assert!(receiver.borrow().is_authenticated());

        auth.expire();
        assert!(!receiver.borrow().is_authenticated());
        assert!(!receiver.borrow().loading);
    }

    #[tokio::test]
    async fn test_login_validates_before_sending() {
        let auth = AuthContext::new(ApiClient::new("http://127.0.0.1:9"));
        let err = auth.login(" ", "").await.unwrap_err();
        assert_eq!(err, ClientError::validation(vec!["email", "password"]));
    }

    #[tokio::test]
    async fn test_restore_without_token_settles_anonymous() {
        let auth = AuthContext::new(ApiClient::new("http://127.0.0.1:9"));
        assert!(auth.state().loading);
        let state = auth.restore(None).await;
        assert!(!state.loading);
        assert!(state.session.is_none());
    }
}
