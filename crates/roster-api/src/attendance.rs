//! Handlers for `/attendance/{date}`.
//!
//! The body and response of both methods is a map of student id to status
//! (`"P"` or `"A"`). `PUT` replaces the whole date.

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::NaiveDate;
use roster_core::{
  attendance::{AttendanceEntry, AttendanceStatus},
  store::RecordStore,
};

use crate::{ApiState, error::ApiError};

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .map_err(|_| ApiError::BadRequest(format!("invalid date {raw:?}; expected YYYY-MM-DD")))
}

/// `GET /attendance/{date}`
pub async fn get_date<S>(
  State(state): State<ApiState<S>>,
  Path(date): Path<String>,
) -> Result<Json<BTreeMap<String, AttendanceStatus>>, ApiError>
where
  S: RecordStore,
{
  let date = parse_date(&date)?;
  let record = state.store.load().await.map_err(ApiError::store)?;
  Ok(Json(record.attendance_for_date(date)))
}

/// `PUT /attendance/{date}`
pub async fn put_date<S>(
  State(state): State<ApiState<S>>,
  Path(date): Path<String>,
  Json(statuses): Json<BTreeMap<String, AttendanceStatus>>,
) -> Result<Json<Vec<AttendanceEntry>>, ApiError>
where
  S: RecordStore,
{
  let date = parse_date(&date)?;
  let entries = state
    .store
    .set_attendance_for_date(date, statuses.into_iter().collect())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}
