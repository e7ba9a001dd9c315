//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use serde_json::Value;
use tracing::debug;

use roster_core::{
  migrate::{migrate, remigrate},
  record::{RECORD_KEY, Record},
  store::{Committed, RecordStore},
};

use crate::{Result, schema::SCHEMA};

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// The stored document, migrated. A missing or unparseable value reads as a
/// fresh default record.
fn read_record(conn: &rusqlite::Connection, now: DateTime<Utc>) -> rusqlite::Result<Record> {
  let raw: Option<String> = conn
    .query_row(
      "SELECT value FROM kv WHERE key = ?1",
      rusqlite::params![RECORD_KEY],
      |r| r.get(0),
    )
    .optional()?;
  let doc = raw
    .and_then(|s| serde_json::from_str::<Value>(&s).ok())
    .unwrap_or(Value::Null);
  Ok(migrate(&doc, now))
}

fn write_record(
  conn: &rusqlite::Connection,
  json: &str,
  now: DateTime<Utc>,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    rusqlite::params![RECORD_KEY, json, now.to_rfc3339()],
  )?;
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, create the schema and bring the
  /// stored record up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Seed the default record when nothing is stored; otherwise rewrite the
  /// stored document through migration.
  async fn init(&self) -> Result<()> {
    let now = Utc::now();
    let record = self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let record = read_record(&tx, now)?;
        let json = serde_json::to_string(&record)
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
        write_record(&tx, &json, now)?;
        tx.commit()?;
        Ok(record)
      })
      .await?;
    debug!(version = record.version, students = record.students.len(), "record store ready");
    Ok(())
  }
}

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  async fn load(&self) -> Result<Record> {
    let now = Utc::now();
    let record = self
      .conn
      .call(move |conn| Ok(read_record(conn, now)?))
      .await?;
    Ok(record)
  }

  async fn transact<F, T>(&self, f: F) -> Result<Committed<T>>
  where
    F: FnOnce(&mut Record) -> roster_core::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let now = Utc::now();
    // The inner result carries domain failures out of the connection thread;
    // the transaction is rolled back when it is dropped uncommitted.
    let outcome: roster_core::Result<Committed<T>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut record = read_record(&tx, now)?;

        let output = match f(&mut record) {
          Ok(output) => output,
          Err(e) => return Ok(Err(e)),
        };
        let record = match remigrate(&record, now) {
          Ok(record) => record,
          Err(e) => return Ok(Err(e)),
        };
        let json = match serde_json::to_string(&record) {
          Ok(json) => json,
          Err(e) => return Ok(Err(e.into())),
        };

        write_record(&tx, &json, now)?;
        tx.commit()?;
        Ok(Ok(Committed { record, output }))
      })
      .await?;

    match &outcome {
      Ok(c) => debug!(payments = c.record.payments.len(), "transaction committed"),
      Err(e) => debug!(error = %e, "transaction rolled back"),
    }
    Ok(outcome?)
  }

  async fn reset(&self) -> Result<Record> {
    let now = Utc::now();
    let record = Record::new(now);
    let json = serde_json::to_string(&record)?;
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![RECORD_KEY])?;
        write_record(&tx, &json, now)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(record)
  }
}
