//! Auth guard for admin routes.

use tokio::sync::watch;

use super::AuthState;

pub const ADMIN_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";

/// What to show for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session check still running: show a placeholder, do not navigate.
    Placeholder,
    /// Navigate to the given path instead.
    Redirect(String),
    /// Render the requested content unchanged.
    Render,
}

/// Decides whether a path may be rendered for a given auth state.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    admin_prefix: String,
    login_path: String,
}

impl Default for AuthGuard {
    fn default() -> Self {
        Self::new(ADMIN_PREFIX, LOGIN_PATH)
    }
}

impl AuthGuard {
    pub fn new(admin_prefix: impl Into<String>, login_path: impl Into<String>) -> Self {
        Self {
            admin_prefix: admin_prefix.into().trim_end_matches('/').to_string(),
            login_path: login_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Paths under the admin prefix, except the login page itself.
    pub fn is_protected(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let under_prefix = path == self.admin_prefix
            || path
                .strip_prefix(&self.admin_prefix)
                .is_some_and(|rest| rest.starts_with('/'));
        under_prefix && path != self.login_path
    }

    pub fn evaluate(&self, path: &str, auth: &AuthState) -> GuardDecision {
        if auth.loading {
            return GuardDecision::Placeholder;
        }
        if self.is_protected(path) && !auth.is_authenticated() {
            return GuardDecision::Redirect(self.login_path.clone());
        }
        GuardDecision::Render
    }
}

/// Tracks the current path and re-runs the guard on every navigation and every auth change.
pub struct GuardedNavigator {
    guard: AuthGuard,
    auth: watch::Receiver<AuthState>,
    current: String,
    decision: GuardDecision,
}

impl GuardedNavigator {
    pub fn new(guard: AuthGuard, auth: watch::Receiver<AuthState>, path: &str) -> Self {
        let mut navigator = Self {
            guard,
            auth,
            current: String::new(),
            decision: GuardDecision::Placeholder,
        };
        navigator.navigate(path);
        navigator
    }

    pub fn current_path(&self) -> &str {
        &self.current
    }

    pub fn decision(&self) -> &GuardDecision {
        &self.decision
    }

    /// Go to `path`. A redirect moves the current path to the redirect target.
    pub fn navigate(&mut self, path: &str) -> GuardDecision {
        let auth = self.auth.borrow_and_update().clone();
        self.current = path.to_string();
        self.apply(&auth)
    }

    /// Wait for the next auth change and re-evaluate the current path.
    /// Returns `None` once the auth context is gone.
    pub async fn auth_changed(&mut self) -> Option<GuardDecision> {
        self.auth.changed().await.ok()?;
        let auth = self.auth.borrow_and_update().clone();
        Some(self.apply(&auth))
    }

    fn apply(&mut self, auth: &AuthState) -> GuardDecision {
        let decision = self.guard.evaluate(&self.current, auth);
        if let GuardDecision::Redirect(target) = &decision {
            tracing::debug!("Redirecting {} to {}", self.current, target);
            self.current = target.clone();
        }
        self.decision = decision.clone();
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use chrono::{Duration, Utc};

    fn signed_in() -> AuthState {
        AuthState {
            loading: false,
            session: Some(Session {
                token: "t".to_string(),
                email: "admin@example.com".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            }),
        }
    }

    fn anonymous() -> AuthState {
        AuthState {
            loading: false,
            session: None,
        }
    }

    #[test]
    fn test_protected_paths() {
        let guard = AuthGuard::default();
        assert!(guard.is_protected("/admin"));
        assert!(guard.is_protected("/admin/activity"));
        assert!(guard.is_protected("/admin/events?tab=past"));
        assert!(!guard.is_protected("/admin/login"));
        assert!(!guard.is_protected("/administrator"));
        assert!(!guard.is_protected("/services"));
    }

    #[test]
    fn test_loading_shows_placeholder() {
        let guard = AuthGuard::default();
        let loading = AuthState {
            loading: true,
            session: None,
        };
        assert_eq!(guard.evaluate("/admin", &loading), GuardDecision::Placeholder);
        assert_eq!(guard.evaluate("/", &loading), GuardDecision::Placeholder);
    }

    #[test]
    fn test_unauthenticated_admin_paths_redirect() {
        let guard = AuthGuard::default();
        for path in ["/admin", "/admin/team", "/admin/applications"] {
            assert_eq!(
                guard.evaluate(path, &anonymous()),
                GuardDecision::Redirect(LOGIN_PATH.to_string())
            );
        }
        assert_eq!(guard.evaluate("/projects", &anonymous()), GuardDecision::Render);
        assert_eq!(guard.evaluate(LOGIN_PATH, &anonymous()), GuardDecision::Render);
    }

    #[test]
    fn test_authenticated_never_redirects() {
        let guard = AuthGuard::default();
        for path in ["/", "/admin", "/admin/team", LOGIN_PATH] {
            assert_eq!(guard.evaluate(path, &signed_in()), GuardDecision::Render);
        }
    }

    #[tokio::test]
    async fn test_navigator_follows_auth_changes() {
        let (tx, rx) = watch::channel(AuthState {
            loading: true,
            session: None,
        });
        let mut navigator = GuardedNavigator::new(AuthGuard::default(), rx, "/admin/events");
        assert_eq!(navigator.decision(), &GuardDecision::Placeholder);
        assert_eq!(navigator.current_path(), "/admin/events");

        tx.send_replace(signed_in());
        assert_eq!(navigator.auth_changed().await, Some(GuardDecision::Render));
        assert_eq!(navigator.current_path(), "/admin/events");

        // External expiry sends the user to the login page.
        tx.send_replace(anonymous());
        assert_eq!(
            navigator.auth_changed().await,
            Some(GuardDecision::Redirect(LOGIN_PATH.to_string()))
        );
        assert_eq!(navigator.current_path(), LOGIN_PATH);

        drop(tx);
        assert_eq!(navigator.auth_changed().await, None);
    }
}
