//! Outbound SMS relay.
//!
//! One endpoint, `POST /send-sms` with `{"to": "...", "body": "..."}`,
//! forwarded to an [`SmsProvider`]. Failures are reported, never retried.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_relay::relay_router(provider))
//! ```

pub mod error;
pub mod provider;
pub mod twilio;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{State, rejection::JsonRejection},
  routing::post,
};
use roster_core::phone::normalize_phone;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

pub use error::RelayError;
pub use provider::{ProviderError, SmsProvider};
pub use twilio::{SmsConfig, TwilioProvider};

/// Request body for `POST /send-sms`. Both fields are loosely typed so that
/// malformed input gets the relay's own error messages.
#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
  #[serde(default)]
  pub to:   Value,
  #[serde(default)]
  pub body: Value,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
  pub success: bool,
  pub sid:     String,
}

/// `None` when no provider is configured; every request then gets 503.
pub struct RelayState<P> {
  pub provider: Option<Arc<P>>,
}

impl<P> Clone for RelayState<P> {
  fn clone(&self) -> Self { Self { provider: self.provider.clone() } }
}

pub fn relay_router<P>(provider: Option<Arc<P>>) -> Router<()>
where
  P: SmsProvider + 'static,
{
  Router::new()
    .route("/send-sms", post(send_sms::<P>))
    .with_state(RelayState { provider })
}

/// `POST /send-sms`
pub async fn send_sms<P>(
  State(state): State<RelayState<P>>,
  payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, RelayError>
where
  P: SmsProvider,
{
  let provider = state.provider.ok_or(RelayError::Unavailable)?;
  let Json(request) = payload?;

  let to = match &request.to {
    Value::String(s) => normalize_phone(s),
    Value::Number(n) => normalize_phone(&n.to_string()),
    _ => None,
  }
  .ok_or(RelayError::InvalidNumber)?;
  let body = match request.body {
    Value::String(s) if !s.is_empty() => s,
    _ => return Err(RelayError::MissingBody),
  };

  match provider.send(&to, &body).await {
    Ok(sid) => {
      info!(%sid, "sms accepted");
      Ok(Json(SendResponse { success: true, sid }))
    }
    Err(e) => {
      warn!(status = ?e.status, error = %e.message, "sms rejected by provider");
      Err(RelayError::Rejected { status: e.status, message: e.message })
    }
  }
}
