//! Handler for `/reports/{month}`.

use axum::{
  Json,
  extract::{Path, State},
};
use roster_core::{month::YearMonth, report::MonthSummary, store::RecordStore};

use crate::{ApiState, error::ApiError};

/// `GET /reports/{month}` with `month` as `YYYY-MM`.
pub async fn month<S>(
  State(state): State<ApiState<S>>,
  Path(month): Path<String>,
) -> Result<Json<MonthSummary>, ApiError>
where
  S: RecordStore,
{
  let month: YearMonth = month.parse()?;
  let record = state.store.load().await.map_err(ApiError::store)?;
  Ok(Json(record.month_summary(month)))
}
