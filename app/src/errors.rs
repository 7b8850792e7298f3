// app/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bookstore::BookstoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Invalid request method.")]
  MethodNotAllowed,

  /// A request body that could not be decoded. The detail is logged, never returned.
  #[error("Invalid payload: {0}")]
  InvalidPayload(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<BookstoreError> for AppError {
  fn from(err: BookstoreError) -> Self {
    match err {
      BookstoreError::Validation(m) => AppError::Validation(m),
      BookstoreError::Auth(m) => AppError::Auth(m),
      BookstoreError::Conflict(m) => AppError::Conflict(m),
      err @ BookstoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
      BookstoreError::Store { source } => AppError::Sqlx(source),
      BookstoreError::Internal(m) => AppError::Internal(m),
    }
  }
}

// Bootstrap code works in anyhow; keep database errors recognisable when they come back.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }

    let body = match self {
      AppError::Validation(m) | AppError::Auth(m) | AppError::NotFound(m) | AppError::Conflict(m) => json!({"error": m}),
      AppError::MethodNotAllowed => json!({"error": "Invalid request method."}),
      AppError::InvalidPayload(_) => json!({"error": "Invalid cart payload."}),
      AppError::Config(_) => json!({"error": "Configuration issue"}),
      AppError::Sqlx(_) => json!({"error": "Database operation failed"}),
      AppError::Internal(_) => json!({"error": "An internal error occurred"}),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
