//! Relay error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
  #[error(
    "SMS not configured. Set TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN, and TWILIO_PHONE_NUMBER."
  )]
  Unavailable,

  #[error("Invalid mobile number.")]
  InvalidNumber,

  #[error("Message body is required.")]
  MissingBody,

  /// The request body was not a JSON object.
  #[error("{message}")]
  Malformed { status: StatusCode, message: String },

  /// The provider refused the message. `status` is the provider's HTTP
  /// status when it reported one.
  #[error("{message}")]
  Rejected { status: Option<u16>, message: String },
}

impl RelayError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
      Self::InvalidNumber | Self::MissingBody => StatusCode::BAD_REQUEST,
      Self::Malformed { status, .. } => *status,
      Self::Rejected { status, .. } => status
        .filter(|s| *s >= 400)
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    }
  }
}

impl From<JsonRejection> for RelayError {
  fn from(rejection: JsonRejection) -> Self {
    Self::Malformed { status: rejection.status(), message: rejection.body_text() }
  }
}

impl IntoResponse for RelayError {
  fn into_response(self) -> Response {
    let status = self.status();
    (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
  }
}
