//! Payment types.
//!
//! A payment covering several months is stored as one [`Payment`] per month.
//! Only the first (oldest) entry, the canonical one, carries the tendered
//! total, the covered month list and the plain receipt number; the rest get a
//! derived receipt number and an annotated note.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{lenient::empty_as_none, month::YearMonth};

// ─── Mode ────────────────────────────────────────────────────────────────────

/// How a payment was made. Unrecognised text is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMode {
  #[default]
  Cash,
  Upi,
  Card,
  BankTransfer,
  Cheque,
  Other(String),
}

impl fmt::Display for PaymentMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Cash => "Cash",
      Self::Upi => "UPI",
      Self::Card => "Card",
      Self::BankTransfer => "Bank Transfer",
      Self::Cheque => "Cheque",
      Self::Other(s) => s.as_str(),
    })
  }
}

impl FromStr for PaymentMode {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    Ok(match s.to_ascii_lowercase().as_str() {
      "" | "cash" => Self::Cash,
      "upi" | "gpay" | "phonepe" => Self::Upi,
      "card" => Self::Card,
      "bank transfer" | "bank" | "neft" | "imps" => Self::BankTransfer,
      "cheque" | "check" => Self::Cheque,
      _ => Self::Other(s.to_owned()),
    })
  }
}

impl From<String> for PaymentMode {
  fn from(s: String) -> Self {
    let Ok(mode) = s.parse::<PaymentMode>();
    mode
  }
}

impl From<PaymentMode> for String {
  fn from(mode: PaymentMode) -> Self { mode.to_string() }
}

// ─── Payment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
  pub id:             String,
  pub student_id:     String,
  /// The month this entry pays for.
  pub month:          YearMonth,
  /// One month's fee, even when the receipt covers several months.
  pub amount:         u64,
  /// Full tendered amount; canonical entry only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_amount:   Option<u64>,
  /// Every month the receipt covers; canonical entry only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub months_covered: Option<Vec<YearMonth>>,
  #[serde(rename = "paidDateISO")]
  pub paid_date:      NaiveDate,
  pub mode:           PaymentMode,
  #[serde(default)]
  pub notes:          String,
  pub receipt_no:     String,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl Payment {
  /// Whether this is the receipt-of-record for its group.
  pub fn is_canonical(&self) -> bool { self.months_covered.is_some() }

  /// Later entries of a group carry the canonical receipt number plus `-k`.
  pub fn is_continuation(&self) -> bool {
    !self.is_canonical() && self.receipt_no.split('-').count() > 3
  }

  /// How many months this entry pays for. Entries written per month always
  /// stand for one; a legacy lump sum stands for `amount / fee` of them,
  /// but never fewer than one nor more than [`MAX_LUMP_SUM_MONTHS`].
  pub fn months_paid(&self, fee: u64) -> u64 {
    if self.is_canonical() || self.is_continuation() || fee == 0 {
      return 1;
    }
    (self.amount / fee).clamp(1, MAX_LUMP_SUM_MONTHS)
  }
}

/// Upper bound on the months one legacy lump-sum entry is credited with.
pub const MAX_LUMP_SUM_MONTHS: u64 = 12;

// ─── Request ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::record_payment`]. Optional fields
/// model form inputs that may be left empty; emptiness is a validation error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
  #[serde(default)]
  pub student_id:      String,
  /// Upper bound of the months considered due.
  #[serde(default, deserialize_with = "empty_as_none")]
  pub through_month:   Option<YearMonth>,
  #[serde(default)]
  pub amount:          u64,
  #[serde(default, deserialize_with = "empty_as_none")]
  pub paid_date:       Option<NaiveDate>,
  #[serde(default)]
  pub mode:            PaymentMode,
  #[serde(default)]
  pub notes:           String,
  /// Replace an existing entry for a planned month instead of aborting.
  #[serde(default)]
  pub allow_overwrite: bool,
}

impl PaymentRequest {
  /// Convenience constructor: cash, no notes, no overwrite.
  pub fn new(
    student_id: impl Into<String>,
    through_month: YearMonth,
    amount: u64,
    paid_date: NaiveDate,
  ) -> Self {
    Self {
      student_id: student_id.into(),
      through_month: Some(through_month),
      amount,
      paid_date: Some(paid_date),
      mode: PaymentMode::default(),
      notes: String::new(),
      allow_overwrite: false,
    }
  }
}

/// A validated payment with its months resolved against a snapshot; applied
/// by [`crate::record::Record::commit_payment`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentPlan {
  pub student_id:      String,
  pub through:         YearMonth,
  /// Oldest first.
  pub months:          Vec<YearMonth>,
  pub fee_per_month:   u64,
  pub amount:          u64,
  pub paid_date:       NaiveDate,
  pub mode:            PaymentMode,
  pub notes:           String,
  pub allow_overwrite: bool,
}
