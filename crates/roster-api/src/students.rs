//! Handlers for `/students` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/students` | `?query=&class=&timing=&machine_no=&include_inactive=` |
//! | `POST`   | `/students` | Body: `NewStudent` JSON; 201 |
//! | `GET`    | `/students/{id}` | 404 if not found |
//! | `PUT`    | `/students/{id}` | Full update |
//! | `DELETE` | `/students/{id}` | Cascades; 204 |
//! | `GET`    | `/students/{id}/dues` | `?through=YYYY-MM[&amount=N]` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  month::YearMonth,
  store::RecordStore,
  student::{NewStudent, Student, StudentFilter},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /students`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(filter): Query<StudentFilter>,
) -> Result<Json<Vec<Student>>, ApiError>
where
  S: RecordStore,
{
  let record = state.store.load().await.map_err(ApiError::store)?;
  Ok(Json(record.list_students(&filter).into_iter().cloned().collect()))
}

// ─── Create / update ──────────────────────────────────────────────────────────

/// `POST /students`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(mut body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  body.id = None;
  let student = state
    .store
    .upsert_student(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(student)))
}

/// `PUT /students/{id}`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Json(mut body): Json<NewStudent>,
) -> Result<Json<Student>, ApiError>
where
  S: RecordStore,
{
  body.id = Some(id);
  let student = state
    .store
    .upsert_student(body)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(student))
}

// ─── Get / delete ─────────────────────────────────────────────────────────────

/// `GET /students/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Student>, ApiError>
where
  S: RecordStore,
{
  let record = state.store.load().await.map_err(ApiError::store)?;
  let student = record
    .student(&id)
    .cloned()
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(student))
}

/// `DELETE /students/{id}`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
{
  state
    .store
    .delete_student(id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Dues ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DuesParams {
  pub through: Option<String>,
  pub amount:  Option<u64>,
}

/// What a student owes up to a month, and what a given amount would settle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dues {
  pub student_id:     String,
  pub through:        YearMonth,
  pub fee_per_month:  u64,
  pub unpaid_months:  Vec<YearMonth>,
  pub due_amount:     u64,
  /// Present when `amount` was given.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub covered_months: Option<Vec<YearMonth>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hint:           Option<String>,
}

/// `GET /students/{id}/dues?through=YYYY-MM[&amount=N]`
pub async fn dues<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Query(params): Query<DuesParams>,
) -> Result<Json<Dues>, ApiError>
where
  S: RecordStore,
{
  let through: YearMonth = params
    .through
    .as_deref()
    .ok_or_else(|| ApiError::BadRequest("`through` is required".into()))?
    .parse()?;

  let record = state.store.load().await.map_err(ApiError::store)?;
  let student = record
    .student(&id)
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;

  let unpaid_months = record.unpaid_months(student, through);
  let fee_per_month = student.fee_per_month();
  Ok(Json(Dues {
    student_id: student.id.clone(),
    through,
    fee_per_month,
    due_amount: fee_per_month.saturating_mul(unpaid_months.len() as u64),
    unpaid_months,
    covered_months: params
      .amount
      .map(|amount| record.months_covered_by_amount(student, through, amount)),
    hint: params
      .amount
      .and_then(|amount| record.months_covered_hint(student, through, amount)),
  }))
}
