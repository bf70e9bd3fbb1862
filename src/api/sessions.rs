//! Admin account and session endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password, AdminSession};
use crate::errors::AppError;
use crate::session::{Session, SessionInfo};
use crate::AppState;

/// Minimum accepted length of a new admin password.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedAdmin {
    pub id: String,
    pub email: String,
}

/// POST /auth/login - Exchange credentials for a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<Credentials>,
) -> Result<Json<Session>, AppError> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let admin = state.repo.find_admin(email).await?;
    let verified = match &admin {
        Some(admin) => verify_password(&request.password, &admin.password_hash)?,
        None => false,
    };
    let Some(admin) = admin.filter(|_| verified) else {
        tracing::warn!("Rejected login for {}", email);
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    let ttl = Duration::try_hours(state.config.session_ttl_hours).ok_or_else(|| {
        AppError::Internal(format!(
            "Session lifetime of {} hours is out of range",
            state.config.session_ttl_hours
        ))
    })?;
    let session = state.repo.create_session(&admin.email, ttl).await?;
    tracing::info!("Admin {} signed in", admin.email);

    Ok(Json(Session {
        token: session.token,
        email: session.email,
        expires_at: session.expires_at,
    }))
}

/// GET /auth/session - Describe the session behind the bearer token.
pub async fn current_session(admin: AdminSession) -> Json<SessionInfo> {
    Json(SessionInfo {
        email: admin.email,
        expires_at: admin.expires_at,
    })
}

/// POST /auth/logout - End the session behind the bearer token.
pub async fn logout(
    State(state): State<AppState>,
    admin: AdminSession,
) -> Result<StatusCode, AppError> {
    state.repo.delete_session(&admin.token).await?;
    tracing::info!("Admin {} signed out", admin.email);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/admin/users - Create an admin account (service key only).
pub async fn create_admin(
    State(state): State<AppState>,
    Json(request): Json<Credentials>,
) -> Result<(StatusCode, Json<CreatedAdmin>), AppError> {
    let email = request.email.trim();
    if !email.contains('@') {
        return Err(AppError::Validation(format!(
            "'{}' is not an email address",
            email
        )));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let hash = hash_password(&request.password)?;
    let admin = state.repo.create_admin(email, &hash).await?;
    tracing::info!("Created admin {}", admin.email);

    Ok((
        StatusCode::CREATED,
        Json(CreatedAdmin {
            id: admin.id,
            email: admin.email,
        }),
    ))
}
