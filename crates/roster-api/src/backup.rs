//! Handlers for `/backup` and `/reset`.
//!
//! `GET /backup` returns the record as pretty-printed JSON with a strong
//! `ETag`. `POST /backup` replaces the record with the request body; when an
//! `If-Match` header is present the replacement only happens if the stored
//! record still has that tag, otherwise 412.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, HeaderValue, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use roster_core::{Error, backup, record::Record, store::RecordStore};
use tracing::info;

use crate::{
  ApiState,
  error::ApiError,
  etag::{compute_etag, etags_match},
};

fn with_etag(mut response: Response, etag: &str) -> Response {
  if let Ok(value) = HeaderValue::from_str(etag) {
    response.headers_mut().insert(header::ETAG, value);
  }
  response
}

/// `GET /backup`
pub async fn export<S>(State(state): State<ApiState<S>>) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let record = state.store.load().await.map_err(ApiError::store)?;
  let etag = compute_etag(&record)?;
  let body = backup::export(&record, Utc::now())?;
  let response = ([(header::CONTENT_TYPE, "application/json")], body).into_response();
  Ok(with_etag(response, &etag))
}

/// `POST /backup`
pub async fn import<S>(
  State(state): State<ApiState<S>>,
  headers: HeaderMap,
  body: String,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let expected = headers
    .get(header::IF_MATCH)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned);

  let record = match expected {
    None => state.store.import_backup(body).await.map_err(ApiError::store)?,
    Some(expected) => {
      let imported = backup::import(&body, Utc::now())?;
      state
        .store
        .transact(move |record| {
          if !etags_match(&compute_etag(record)?, &expected) {
            return Err(Error::RevisionMismatch { expected });
          }
          *record = imported;
          Ok(())
        })
        .await
        .map_err(ApiError::store)?
        .record
    }
  };

  info!(
    students = record.students.len(),
    payments = record.payments.len(),
    "backup imported"
  );
  let etag = compute_etag(&record)?;
  Ok(with_etag(Json(record).into_response(), &etag))
}

/// `POST /reset`
pub async fn reset<S>(State(state): State<ApiState<S>>) -> Result<Json<Record>, ApiError>
where
  S: RecordStore,
{
  let record = state.store.reset().await.map_err(ApiError::store)?;
  info!("record reset");
  Ok(Json(record))
}
