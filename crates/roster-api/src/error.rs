//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A domain error raised by the ledger, possibly from inside a store
  /// transaction.
  #[error("{message}")]
  Domain {
    status:  StatusCode,
    code:    &'static str,
    message: String,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify an error coming back from a store. Domain errors are found
  /// anywhere in the source chain; everything else is a store failure.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = cause {
      if let Some(core) = e.downcast_ref::<roster_core::Error>() {
        return Self::from(core);
      }
      cause = e.source();
    }
    Self::Store(Box::new(err))
  }
}

impl From<&roster_core::Error> for ApiError {
  fn from(err: &roster_core::Error) -> Self {
    use roster_core::Error as E;
    let status = match err {
      E::Validation(_) | E::InvalidMonth(_) | E::InvalidBackup(_) => StatusCode::BAD_REQUEST,
      E::StudentNotFound(_) | E::PaymentNotFound(_) => StatusCode::NOT_FOUND,
      E::DuplicatePayment { .. } => StatusCode::CONFLICT,
      E::NothingToPay { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      E::RevisionMismatch { .. } => StatusCode::PRECONDITION_FAILED,
      E::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Self::Domain { status, code: err.code(), message: err.to_string() }
  }
}

impl From<roster_core::Error> for ApiError {
  fn from(err: roster_core::Error) -> Self { Self::from(&err) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
      ApiError::Domain { status, code, message } => (*status, *code, message.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, "store", e.to_string()),
    };
    (status, Json(json!({ "error": message, "code": code }))).into_response()
  }
}
