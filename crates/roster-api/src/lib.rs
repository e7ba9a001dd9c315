//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any
//! [`roster_core::store::RecordStore`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(store.clone(), institute))
//! ```

pub mod attendance;
pub mod backup;
pub mod error;
pub mod etag;
pub mod payments;
pub mod receipts;
pub mod reports;
pub mod students;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use roster_core::{receipt::Institute, store::RecordStore};

pub use error::ApiError;

/// Shared handler state.
pub struct ApiState<S> {
  pub store:     Arc<S>,
  pub institute: Arc<Institute>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), institute: Arc::clone(&self.institute) }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, institute: Institute) -> Router<()>
where
  S: RecordStore + 'static,
{
  let state = ApiState { store, institute: Arc::new(institute) };
  Router::new()
    // Students
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route(
      "/students/{id}",
      get(students::get_one::<S>)
        .put(students::update::<S>)
        .delete(students::remove::<S>),
    )
    .route("/students/{id}/dues", get(students::dues::<S>))
    // Attendance
    .route(
      "/attendance/{date}",
      get(attendance::get_date::<S>).put(attendance::put_date::<S>),
    )
    // Payments and receipts
    .route("/payments", get(payments::list::<S>).post(payments::create::<S>))
    .route("/receipts/{id}", get(receipts::document::<S>))
    .route("/receipts/{id}/text", get(receipts::text::<S>))
    .route("/receipts/{id}/share", get(receipts::share::<S>))
    // Reports
    .route("/reports/{month}", get(reports::month::<S>))
    // Backup
    .route("/backup", get(backup::export::<S>).post(backup::import::<S>))
    .route("/reset", post(backup::reset::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
