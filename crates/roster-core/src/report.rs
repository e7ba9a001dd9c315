//! Month summaries: what was collected, who paid and who owes.

use serde::{Deserialize, Serialize};

use crate::{month::YearMonth, record::Record, student::Student};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDue {
  pub student:       Student,
  pub unpaid_months: u32,
  pub due_amount:    u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
  pub month:           YearMonth,
  /// Sum of the per-month amounts of every entry for `month`.
  pub total_collected: u64,
  /// Active students with an entry for `month`.
  pub paid_students:   Vec<Student>,
  /// Active students owing at least one month up to `month`.
  pub dues:            Vec<StudentDue>,
}

impl Record {
  pub fn month_summary(&self, month: YearMonth) -> MonthSummary {
    let in_month = || self.payments.iter().filter(move |p| p.month == month);

    let total_collected = in_month().map(|p| p.amount).fold(0, u64::saturating_add);

    let active = || self.students.iter().filter(|s| s.active);
    let paid_students = active()
      .filter(|s| in_month().any(|p| p.student_id == s.id))
      .cloned()
      .collect();

    let dues = active()
      .filter_map(|s| {
        let unpaid_months = self.months_owed(s, month);
        (unpaid_months > 0).then(|| StudentDue {
          student: s.clone(),
          unpaid_months,
          due_amount: u64::from(unpaid_months).saturating_mul(s.fee_per_month()),
        })
      })
      .collect();

    MonthSummary { month, total_collected, paid_students, dues }
  }

  /// The ledger's unpaid months up to `month`, less the extra months legacy
  /// lump-sum entries stand for. Entries written per month count once
  /// regardless of the student's current fee.
  fn months_owed(&self, student: &Student, month: YearMonth) -> u32 {
    let unpaid = u64::try_from(self.unpaid_months(student, month).len()).unwrap_or(u64::MAX);
    let fee = student.fee_per_month();
    let extra = self
      .payments
      .iter()
      .filter(|p| p.student_id == student.id && p.month <= month)
      .map(|p| p.months_paid(fee) - 1)
      .fold(0u64, u64::saturating_add);
    u32::try_from(unpaid.saturating_sub(extra)).unwrap_or(u32::MAX)
  }
}
