//! The single root document holding every entity.
//!
//! All state lives in one [`Record`]. It is only ever mutated as a whole,
//! through [`crate::store::RecordStore::transact`].

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{attendance::AttendanceEntry, payment::Payment, student::Student};

/// Schema version written by this build. See [`crate::migrate`].
pub const CURRENT_VERSION: u32 = 2;

/// Fixed key the record is persisted under.
pub const RECORD_KEY: &str = "sa_data_v1";

// ─── Counters ────────────────────────────────────────────────────────────────

/// Receipt numbering state; see [`crate::allocator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
  pub next_receipt_number: u32,
  pub receipt_year:        i32,
}

impl Counters {
  pub fn new(year: i32) -> Self {
    Self { next_receipt_number: 1, receipt_year: year }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub version:    u32,
  pub students:   Vec<Student>,
  /// Insertion order carries no meaning beyond stable display.
  pub attendance: Vec<AttendanceEntry>,
  /// Newest entries first.
  pub payments:   Vec<Payment>,
  pub counters:   Counters,
}

impl Record {
  /// An empty record whose receipt counter starts in the year of `now`.
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      version:    CURRENT_VERSION,
      students:   Vec::new(),
      attendance: Vec::new(),
      payments:   Vec::new(),
      counters:   Counters::new(now.year()),
    }
  }
}
