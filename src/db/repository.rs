//! Database repository for CRUD operations.
//!
//! Records are returned as JSON objects in the wire shape: the stored fields plus `id` and
//! `createdAt`.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::Collection;

/// Fields assigned by the service; never taken from a request body.
pub const SERVICE_FIELDS: [&str; 2] = ["id", "createdAt"];

/// An admin account.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: String,
    pub email: String,
    pub password_hash: String,
}

/// A persisted admin session.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== RECORD OPERATIONS ====================

    /// List a collection in insertion order.
    pub async fn list_records(&self, collection: Collection) -> Result<Vec<Value>, AppError> {
        let rows = sqlx::query(
            "SELECT id, body, created_at FROM records WHERE collection = ? ORDER BY seq",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Get a record by ID.
    pub async fn get_record(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Value>, AppError> {
        let row = sqlx::query(
            "SELECT id, body, created_at FROM records WHERE collection = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    /// Validate and insert a new record. The service assigns `id` and `createdAt`.
    pub async fn create_record(
        &self,
        collection: Collection,
        mut fields: Map<String, Value>,
    ) -> Result<Value, AppError> {
        strip_service_fields(&mut fields);
        let body = Value::Object(fields);
        collection.validate_draft(&body).map_err(AppError::Validation)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        sqlx::query("INSERT INTO records (collection, id, body, created_at) VALUES (?, ?, ?, ?)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(body.to_string())
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(with_service_fields(body, &id, &now))
    }

    /// Merge `patch` over the stored fields. The merged record must still be valid.
    pub async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        mut patch: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let row = sqlx::query("SELECT body, created_at FROM records WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} record {} not found", collection, id)))?;

        let created_at: String = row.get("created_at");
        let mut fields = stored_fields(&row)?;
        strip_service_fields(&mut patch);
        fields.extend(patch);

        let body = Value::Object(fields);
        collection.validate_draft(&body).map_err(AppError::Validation)?;

        let result = sqlx::query("UPDATE records SET body = ? WHERE collection = ? AND id = ?")
            .bind(body.to_string())
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} record {} not found", collection, id)));
        }

        Ok(with_service_fields(body, id, &created_at))
    }

    /// Delete a record.
    pub async fn delete_record(&self, collection: Collection, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} record {} not found", collection, id)));
        }
        Ok(())
    }

    // ==================== ADMIN OPERATIONS ====================

    /// Create an admin account from an already hashed password.
    pub async fn create_admin(&self, email: &str, password_hash: &str) -> Result<Admin, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let email = normalize_email(email);

        let result = sqlx::query(
            "INSERT INTO admins (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(password_hash)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Admin {
                id,
                email,
                password_hash: password_hash.to_string(),
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AppError::Conflict(
                format!("Admin {} already exists", email),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Find an admin by email (case-insensitive).
    pub async fn find_admin(&self, email: &str) -> Result<Option<Admin>, AppError> {
        let row = sqlx::query("SELECT id, email, password_hash FROM admins WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Admin {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
        }))
    }

    // ==================== SESSION OPERATIONS ====================

    /// Open a session for `email` that expires after `ttl`. Expired sessions are pruned first.
    pub async fn create_session(
        &self,
        email: &str,
        ttl: Duration,
    ) -> Result<StoredSession, AppError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal(format!("Session lifetime {} is out of range", ttl)))?;

        self.prune_expired_sessions().await?;

        let session = StoredSession {
            token: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            expires_at,
        };

        sqlx::query("INSERT INTO sessions (token, email, expires_at) VALUES (?, ?, ?)")
            .bind(&session.token)
            .bind(&session.email)
            .bind(session_timestamp(session.expires_at))
            .execute(&self.pool)
            .await?;

        Ok(session)
    }

    /// Look up a live session. Expired sessions are removed and reported as absent.
    pub async fn find_session(&self, token: &str) -> Result<Option<StoredSession>, AppError> {
        let row = sqlx::query("SELECT token, email, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_raw: String = row.get("expires_at");
        let expires_at = DateTime::parse_from_rfc3339(&expires_raw)
            .map_err(|e| AppError::Internal(format!("Corrupt session expiry: {}", e)))?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            tracing::debug!("Session for {} expired at {}", row.get::<String, _>("email"), expires_at);
            self.delete_session(token).await?;
            return Ok(None);
        }

        Ok(Some(StoredSession {
            token: row.get("token"),
            email: row.get("email"),
            expires_at,
        }))
    }

    /// Delete every session whose expiry has passed. Returns how many were removed.
    pub async fn prune_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(session_timestamp(Utc::now()))
            .execute(&self.pool)
            .await?;

        let pruned = result.rows_affected();
        if pruned > 0 {
            tracing::debug!("Pruned {} expired session(s)", pruned);
        }
        Ok(pruned)
    }

    /// Remove a session. Unknown tokens are ignored.
    pub async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// Fixed width so stored expiries compare correctly as text.
fn session_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn strip_service_fields(fields: &mut Map<String, Value>) {
    for name in SERVICE_FIELDS {
        fields.remove(name);
    }
}

fn with_service_fields(body: Value, id: &str, created_at: &str) -> Value {
    let mut object = match body {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    object.insert("id".to_string(), Value::String(id.to_string()));
    object.insert("createdAt".to_string(), Value::String(created_at.to_string()));
    Value::Object(object)
}

fn stored_fields(row: &sqlx::sqlite::SqliteRow) -> Result<Map<String, Value>, AppError> {
    let body: String = row.get("body");
    match serde_json::from_str(&body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(AppError::Internal("Stored record is not an object".to_string())),
        Err(e) => Err(AppError::Internal(format!("Corrupt stored record: {}", e))),
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Value, AppError> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    let fields = stored_fields(row)?;
    Ok(with_service_fields(Value::Object(fields), &id, &created_at))
}
