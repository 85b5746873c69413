use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

pub mod catalog;
pub mod films;
pub mod reviews;
pub mod users;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
