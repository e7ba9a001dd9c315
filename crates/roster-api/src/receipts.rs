//! Handlers for `/receipts/{id}`, where `id` is a payment id.

use axum::{
  Json,
  extract::{Path, State},
};
use roster_core::{receipt::Receipt, store::RecordStore};
use serde::Serialize;

use crate::{ApiState, error::ApiError};

async fn load_receipt<S>(state: &ApiState<S>, id: &str) -> Result<Receipt, ApiError>
where
  S: RecordStore,
{
  let record = state.store.load().await.map_err(ApiError::store)?;
  Ok(record.receipt(id, &state.institute)?)
}

/// `GET /receipts/{id}`
pub async fn document<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Receipt>, ApiError>
where
  S: RecordStore,
{
  Ok(Json(load_receipt(&state, &id).await?))
}

/// `GET /receipts/{id}/text`: the printable rendition as `text/plain`.
pub async fn text<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<String, ApiError>
where
  S: RecordStore,
{
  Ok(load_receipt(&state, &id).await?.render_text())
}

#[derive(Debug, Serialize)]
pub struct ShareLink {
  pub url:  String,
  pub body: String,
}

/// `GET /receipts/{id}/share`
pub async fn share<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<ShareLink>, ApiError>
where
  S: RecordStore,
{
  let receipt = load_receipt(&state, &id).await?;
  let url = receipt
    .share_link()
    .ok_or_else(|| ApiError::BadRequest("Add mobile number to student to send WhatsApp".into()))?;
  Ok(Json(ShareLink { url: url.into(), body: receipt.message_body() }))
}
