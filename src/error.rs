//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` enum for all error conditions and implements Axum's
//! `IntoResponse` to automatically convert errors to appropriate HTTP responses
//! with JSON error bodies.
//!
//! "No result" outcomes (no merge base, empty log, no diff) are not errors;
//! git queries report them as `Ok(None)`.
//!
//! Error mappings:
//! - `RepoNotFound`, `RefNotFound`, `BranchNotFound` → 404
//! - `InvalidRange` → 400
//! - `Git`, `Persistence`, `Internal` → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Reference not found: {0}")]
    RefNotFound(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Failed to persist comparison state: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Git(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::RepoNotFound(path) => {
                (StatusCode::NOT_FOUND, format!("Repository not found: {}", path))
            }
            AppError::RefNotFound(reference) => {
                (StatusCode::NOT_FOUND, format!("Reference not found: {}", reference))
            }
            AppError::BranchNotFound(name) => {
                (StatusCode::NOT_FOUND, format!("Branch not found: {}", name))
            }
            AppError::InvalidRange(expr) => {
                (StatusCode::BAD_REQUEST, format!("Invalid range: {}", expr))
            }
            AppError::Persistence(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
