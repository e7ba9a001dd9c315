//! Identifier and receipt-number allocation.
//!
//! Receipt numbers have the form `R-<year>-<6-digit sequence>`. The sequence
//! restarts at 1 whenever the stored year differs from the current one.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::record::{Counters, Record};

/// A fresh opaque identifier (random v4 UUID, hyphenated).
pub fn new_id() -> String { Uuid::new_v4().hyphenated().to_string() }

pub fn format_receipt_number(year: i32, sequence: u32) -> String {
  format!("R-{year}-{sequence:06}")
}

impl Counters {
  /// Take the next receipt number for `year`, rolling the sequence over when
  /// the year has changed.
  pub fn allocate(&mut self, year: i32) -> String {
    if self.receipt_year != year {
      self.receipt_year = year;
      self.next_receipt_number = 1;
    }
    let receipt = format_receipt_number(self.receipt_year, self.next_receipt_number);
    self.next_receipt_number += 1;
    receipt
  }
}

impl Record {
  /// Allocate one receipt number in place. Call once per logical receipt,
  /// inside the transaction that writes it.
  pub fn allocate_receipt_number(&mut self, now: DateTime<Utc>) -> String {
    self.counters.allocate(now.year())
  }
}
