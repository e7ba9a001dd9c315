//! The `RecordStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! Higher layers (`roster-api`, `roster-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{NaiveDate, Utc};

use crate::{
  attendance::{AttendanceEntry, AttendanceStatus},
  backup,
  payment::{Payment, PaymentRequest},
  record::Record,
  student::{NewStudent, Student},
};

/// What a successful [`RecordStore::transact`] hands back: the record as
/// persisted, plus whatever the closure returned.
#[derive(Debug, Clone)]
pub struct Committed<T> {
  pub record: Record,
  pub output: T,
}

/// Abstraction over the persisted record.
///
/// [`RecordStore::transact`] is the only way to change the record. The
/// provided methods compose it with the domain operations on [`Record`].
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// The current record, always in the current shape.
  fn load(&self) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Load the record, apply `f` to it, migrate the result and persist it,
  /// atomically. When `f` fails nothing is written and its error is returned.
  fn transact<F, T>(
    &self,
    f: F,
  ) -> impl Future<Output = Result<Committed<T>, Self::Error>> + Send + '_
  where
    F: FnOnce(&mut Record) -> crate::Result<T> + Send + 'static,
    T: Send + 'static;

  /// Discard everything and store a fresh default record.
  fn reset(&self) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  // ── Provided ──────────────────────────────────────────────────────────

  /// Plan and commit inside one transaction, so the covered months are
  /// chosen from the record the entries are written to. Returns the
  /// canonical entry.
  fn record_payment(
    &self,
    request: PaymentRequest,
  ) -> impl Future<Output = Result<Payment, Self::Error>> + Send + '_ {
    async move {
      let committed = self
        .transact(move |record| {
          let plan = record.plan_payment(&request)?;
          record.commit_payment(plan, Utc::now())
        })
        .await?;
      Ok(committed.output)
    }
  }

  fn upsert_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_ {
    async move {
      let committed = self
        .transact(move |record| record.upsert_student(input, Utc::now()))
        .await?;
      Ok(committed.output)
    }
  }

  /// Delete a student and everything that references it.
  fn delete_student(
    &self,
    id: String,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_ {
    async move {
      let committed = self
        .transact(move |record| record.delete_student(&id))
        .await?;
      Ok(committed.output)
    }
  }

  fn set_attendance_for_date(
    &self,
    date: NaiveDate,
    statuses: Vec<(String, AttendanceStatus)>,
  ) -> impl Future<Output = Result<Vec<AttendanceEntry>, Self::Error>> + Send + '_ {
    async move {
      let committed = self
        .transact(move |record| record.set_attendance_for_date(date, statuses, Utc::now()))
        .await?;
      Ok(committed.output)
    }
  }

  /// Replace the whole record with a parsed backup.
  fn import_backup(
    &self,
    text: String,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_ {
    async move {
      let imported = backup::import(&text, Utc::now())?;
      let committed = self
        .transact(move |record| {
          *record = imported;
          Ok(())
        })
        .await?;
      Ok(committed.record)
    }
  }
}
