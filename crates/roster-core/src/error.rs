//! Error types for `roster-core`.

use thiserror::Error;

use crate::month::YearMonth;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or out-of-range input; the operation was not attempted.
  #[error("{0}")]
  Validation(String),

  /// Every month up to `through` is already settled. Informational.
  #[error("all months up to {through} are already paid")]
  NothingToPay { through: YearMonth },

  /// A planned month already has a payment and overwrite was not allowed.
  #[error("already paid for {month}; enable overwrite to replace it")]
  DuplicatePayment { month: YearMonth },

  #[error("student not found: {0}")]
  StudentNotFound(String),

  #[error("payment not found: {0}")]
  PaymentNotFound(String),

  #[error("invalid backup: {0}")]
  InvalidBackup(String),

  /// The record changed since the revision the caller last saw.
  #[error("record has changed since revision {expected}")]
  RevisionMismatch { expected: String },

  #[error("invalid month: {0:?}")]
  InvalidMonth(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  /// Short machine-readable discriminant, used by HTTP layers.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Validation(_) => "validation",
      Self::NothingToPay { .. } => "nothing_to_pay",
      Self::DuplicatePayment { .. } => "duplicate_payment",
      Self::StudentNotFound(_) => "student_not_found",
      Self::PaymentNotFound(_) => "payment_not_found",
      Self::InvalidBackup(_) => "invalid_backup",
      Self::RevisionMismatch { .. } => "revision_mismatch",
      Self::InvalidMonth(_) => "invalid_month",
      Self::Serialization(_) => "serialization",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
