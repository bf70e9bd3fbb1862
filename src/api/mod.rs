//! REST API module.
//!
//! Handlers for the stand-in data service. Successful responses are the bare JSON payload;
//! failures use the error envelope of [`crate::errors::ErrorResponse`].

mod collections;
mod sessions;

pub use collections::*;
pub use sessions::*;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::Collection;

/// Resolve the `{collection}` path segment. Unknown names are 404s.
fn parse_collection(name: &str) -> Result<Collection, AppError> {
    name.parse().map_err(AppError::NotFound)
}

/// Unwrap a JSON object body, turning extractor rejections into the error envelope.
fn object_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    match body {
        Value::Object(fields) => Ok(fields),
        _ => Err(AppError::Validation(
            "Request body must be a JSON object".to_string(),
        )),
    }
}
