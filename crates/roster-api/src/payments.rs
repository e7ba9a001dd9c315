//! Handlers for `/payments`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/payments` | Newest first; optional `?q=` search |
//! | `POST` | `/payments` | Body: `PaymentRequest`; 201 with the canonical entry |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  payment::{Payment, PaymentRequest},
  store::RecordStore,
};
use serde::Deserialize;
use tracing::info;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub q: Option<String>,
}

/// `GET /payments[?q=<text>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Payment>>, ApiError>
where
  S: RecordStore,
{
  let record = state.store.load().await.map_err(ApiError::store)?;
  Ok(Json(
    record
      .list_payments(params.q.as_deref())
      .into_iter()
      .cloned()
      .collect(),
  ))
}

/// `POST /payments`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<PaymentRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let payment = state
    .store
    .record_payment(body)
    .await
    .map_err(ApiError::store)?;
  info!(
    receipt = %payment.receipt_no,
    student = %payment.student_id,
    months = payment.months_covered.as_ref().map_or(1, Vec::len),
    "payment recorded"
  );
  Ok((StatusCode::CREATED, Json(payment)))
}
