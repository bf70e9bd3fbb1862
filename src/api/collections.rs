//! Collection API endpoints.
//!
//! Reads are public; every write needs an admin session.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::{object_body, parse_collection};
use crate::auth::AdminSession;
use crate::errors::AppError;
use crate::AppState;

/// GET /api/{collection} - List a collection in insertion order.
pub async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let collection = parse_collection(&collection)?;
    Ok(Json(state.repo.list_records(collection).await?))
}

/// GET /api/{collection}/{id} - Get a single record.
pub async fn get_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let collection = parse_collection(&collection)?;
    state
        .repo
        .get_record(collection, &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} record {} not found", collection, id)))
}

/// POST /api/{collection} - Create a record.
pub async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    admin: AdminSession,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let collection = parse_collection(&collection)?;
    let fields = object_body(payload)?;

    let record = state.repo.create_record(collection, fields).await?;
    tracing::info!(
        "{} created {} record {}",
        admin.email,
        collection,
        record["id"].as_str().unwrap_or_default()
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/{collection}/{id} - Merge fields into a record.
pub async fn update_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    admin: AdminSession,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let collection = parse_collection(&collection)?;
    let patch = object_body(payload)?;

    let record = state.repo.update_record(collection, &id, patch).await?;
    tracing::info!("{} updated {} record {}", admin.email, collection, id);
    Ok(Json(record))
}

/// DELETE /api/{collection}/{id} - Delete a record.
pub async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    admin: AdminSession,
) -> Result<StatusCode, AppError> {
    let collection = parse_collection(&collection)?;
    state.repo.delete_record(collection, &id).await?;
    tracing::info!("{} deleted {} record {}", admin.email, collection, id);
    Ok(StatusCode::NO_CONTENT)
}
