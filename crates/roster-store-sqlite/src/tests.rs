//! Integration tests for `SqliteStore` against SQLite databases.

use chrono::NaiveDate;
use roster_core::{
  Error as CoreError,
  attendance::AttendanceStatus,
  month::YearMonth,
  payment::PaymentRequest,
  record::{CURRENT_VERSION, RECORD_KEY},
  store::RecordStore,
  student::{ClassTier, NewStudent, Student, TIMING_SLOTS},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ym(s: &str) -> YearMonth { s.parse().unwrap() }

fn paid_on() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 20).unwrap() }

async fn add_student(s: &SqliteStore, name: &str) -> Student {
  s.upsert_student(NewStudent {
    name: name.into(),
    class_name: "Junior".into(),
    timing: TIMING_SLOTS[0].into(),
    machine_no: Some(1),
    date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 15),
    ..NewStudent::default()
  })
  .await
  .unwrap()
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_store_holds_default_record() {
  let s = store().await;
  let record = s.load().await.unwrap();
  assert_eq!(record.version, CURRENT_VERSION);
  assert!(record.students.is_empty());
  assert_eq!(record.counters.next_receipt_number, 1);
}

#[tokio::test]
async fn data_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("roster.db");

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    add_student(&s, "Asha").await.id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let record = s.load().await.unwrap();
  assert_eq!(record.students.len(), 1);
  assert_eq!(record.students[0].id, id);
}

#[tokio::test]
async fn open_migrates_legacy_document() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("roster.db");

  let legacy = r#"{
    "version": 1,
    "students": [{"id": "s1", "name": "Asha", "className": "11th", "batch": 4,
                  "timing": "6.30 am - 7.30 am", "dateOfJoining": "2024-01-15"}],
    "attendance": null,
    "payments": []
  }"#;
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at TEXT NOT NULL);",
      )
      .unwrap();
    conn
      .execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, '2024-01-01T00:00:00Z')",
        rusqlite::params![RECORD_KEY, legacy],
      )
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let record = s.load().await.unwrap();
  assert_eq!(record.version, CURRENT_VERSION);
  assert_eq!(record.students[0].class_tier, ClassTier::Senior);
  assert_eq!(record.students[0].machine_no, Some(4));

  // The rewritten document no longer carries the legacy field.
  drop(s);
  let conn = rusqlite::Connection::open(&path).unwrap();
  let stored: String = conn
    .query_row("SELECT value FROM kv WHERE key = ?1", [RECORD_KEY], |r| r.get(0))
    .unwrap();
  assert!(!stored.contains("batch"));
  assert!(stored.contains("\"machineNo\":4"));
}

#[tokio::test]
async fn garbage_document_reads_as_default() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("roster.db");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at TEXT NOT NULL);
         INSERT INTO kv VALUES ('sa_data_v1', 'not json', '2024-01-01T00:00:00Z');",
      )
      .unwrap();
  }
  let s = SqliteStore::open(&path).await.unwrap();
  assert!(s.load().await.unwrap().students.is_empty());
}

#[tokio::test]
async fn reset_reseeds() {
  let s = store().await;
  let asha = add_student(&s, "Asha").await;
  s.record_payment(PaymentRequest::new(&asha.id, ym("2024-02"), 900, paid_on()))
    .await
    .unwrap();

  let fresh = s.reset().await.unwrap();
  assert!(fresh.students.is_empty());
  assert_eq!(fresh.counters.next_receipt_number, 1);
  assert_eq!(s.load().await.unwrap(), fresh);
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_closure_leaves_record_unchanged() {
  let s = store().await;
  add_student(&s, "Asha").await;
  let before = s.load().await.unwrap();

  let err = s
    .transact(|record| {
      record.students.clear();
      record.counters.next_receipt_number = 99;
      Err::<(), _>(CoreError::Validation("nope".into()))
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Validation(_))));
  assert_eq!(s.load().await.unwrap(), before);
}

#[tokio::test]
async fn transact_returns_persisted_record() {
  let s = store().await;
  let committed = s
    .transact(|record| {
      record.counters.next_receipt_number = 42;
      Ok("done")
    })
    .await
    .unwrap();
  assert_eq!(committed.output, "done");
  assert_eq!(committed.record.counters.next_receipt_number, 42);
  assert_eq!(s.load().await.unwrap(), committed.record);
}

// ─── Ledger through the store ────────────────────────────────────────────────

#[tokio::test]
async fn multi_month_payment_is_persisted() {
  let s = store().await;
  let asha = add_student(&s, "Asha").await;

  let receipt = s
    .record_payment(PaymentRequest::new(&asha.id, ym("2024-03"), 1350, paid_on()))
    .await
    .unwrap();
  assert_eq!(receipt.total_amount, Some(1350));

  let record = s.load().await.unwrap();
  assert_eq!(record.payments.len(), 3);
  assert_eq!(record.counters.next_receipt_number, 2);
  assert!(record.unpaid_months(&asha, ym("2024-03")).is_empty());
}

#[tokio::test]
async fn duplicate_payment_aborts_without_writing() {
  let s = store().await;
  let asha = add_student(&s, "Asha").await;
  s.record_payment(PaymentRequest::new(&asha.id, ym("2024-01"), 450, paid_on()))
    .await
    .unwrap();
  let before = s.load().await.unwrap();

  // A plan made before January was paid.
  let mut stale = before.clone();
  stale.payments.clear();
  let plan = stale
    .plan_payment(&PaymentRequest::new(&asha.id, ym("2024-02"), 900, paid_on()))
    .unwrap();
  let err = s
    .transact(move |record| record.commit_payment(plan, chrono::Utc::now()))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Core(CoreError::DuplicatePayment { month }) if month == ym("2024-01")));
  assert_eq!(s.load().await.unwrap(), before);
}

#[tokio::test]
async fn concurrent_payments_for_one_month_commit_once() {
  let s = store().await;
  let asha = add_student(&s, "Asha").await;
  let request = PaymentRequest::new(&asha.id, ym("2024-01"), 450, paid_on());

  let (a, b) = tokio::join!(s.record_payment(request.clone()), s.record_payment(request));
  assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
  for err in [a, b].into_iter().filter_map(Result::err) {
    assert!(matches!(
      err,
      Error::Core(CoreError::DuplicatePayment { .. } | CoreError::NothingToPay { .. })
    ));
  }
  assert_eq!(s.load().await.unwrap().payments.len(), 1);
}

#[tokio::test]
async fn concurrent_overwrites_plan_against_committed_record() {
  let s = store().await;
  let asha = add_student(&s, "Asha").await;
  let request = PaymentRequest {
    allow_overwrite: true,
    ..PaymentRequest::new(&asha.id, ym("2024-01"), 450, paid_on())
  };

  let (a, b) = tokio::join!(s.record_payment(request.clone()), s.record_payment(request));
  assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
  for err in [a, b].into_iter().filter_map(Result::err) {
    assert!(matches!(err, Error::Core(CoreError::NothingToPay { .. })));
  }

  let record = s.load().await.unwrap();
  assert_eq!(record.payments.len(), 1);
  assert_eq!(record.counters.next_receipt_number, 2);
}

#[tokio::test]
async fn delete_cascades() {
  let s = store().await;
  let asha = add_student(&s, "Asha").await;
  let bala = add_student(&s, "Bala").await;
  s.set_attendance_for_date(
    paid_on(),
    vec![
      (asha.id.clone(), AttendanceStatus::Present),
      (bala.id.clone(), AttendanceStatus::Absent),
    ],
  )
  .await
  .unwrap();
  s.record_payment(PaymentRequest::new(&asha.id, ym("2024-02"), 900, paid_on()))
    .await
    .unwrap();

  s.delete_student(asha.id.clone()).await.unwrap();

  let record = s.load().await.unwrap();
  assert_eq!(record.students.len(), 1);
  assert!(record.attendance.iter().all(|a| a.student_id == bala.id));
  assert!(record.payments.is_empty());

  let err = s.delete_student(asha.id).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::StudentNotFound(_))));
}

#[tokio::test]
async fn import_replaces_record() {
  let s = store().await;
  add_student(&s, "Asha").await;

  let imported = s
    .import_backup(r#"{"version": 1, "students": [], "counters": {"nextReceiptNumber": 7}}"#.into())
    .await
    .unwrap();
  assert!(imported.students.is_empty());
  assert_eq!(imported.counters.next_receipt_number, 7);
  assert_eq!(s.load().await.unwrap(), imported);

  let err = s.import_backup("[]".into()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::InvalidBackup(_))));
  assert_eq!(s.load().await.unwrap(), imported);
}
