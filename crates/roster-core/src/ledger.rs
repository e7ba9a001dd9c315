//! The fee ledger: which months a student still owes, how a tendered amount
//! spreads across them, and how a payment is written.
//!
//! Recording a payment happens in two phases. [`Record::plan_payment`]
//! validates the request and resolves the covered months against a snapshot;
//! [`Record::commit_payment`] re-checks those months against the record it is
//! applied to and writes every entry, or nothing.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  allocator::new_id,
  month::YearMonth,
  payment::{Payment, PaymentPlan, PaymentRequest},
  record::Record,
  student::Student,
};

impl Record {
  /// Months from the student's joining month through `through` (inclusive)
  /// with no payment entry, oldest first.
  pub fn unpaid_months(&self, student: &Student, through: YearMonth) -> Vec<YearMonth> {
    let paid: BTreeSet<YearMonth> = self
      .payments
      .iter()
      .filter(|p| p.student_id == student.id && p.month <= through)
      .map(|p| p.month)
      .collect();

    student
      .joining_month()
      .through(through)
      .filter(|m| !paid.contains(m))
      .collect()
  }

  /// The oldest `amount / fee` unpaid months up to `through`. Never pays
  /// ahead of `through`, and a remainder smaller than one fee is ignored.
  pub fn months_covered_by_amount(
    &self,
    student: &Student,
    through: YearMonth,
    amount: u64,
  ) -> Vec<YearMonth> {
    let fee = student.fee_per_month();
    if fee == 0 {
      return Vec::new();
    }
    let count = usize::try_from(amount / fee).unwrap_or(usize::MAX);
    let mut months = self.unpaid_months(student, through);
    months.truncate(count);
    months
  }

  /// The line shown under a payment form before saving; `None` while the
  /// amount is below one month's fee.
  pub fn months_covered_hint(
    &self,
    student: &Student,
    through: YearMonth,
    amount: u64,
  ) -> Option<String> {
    if amount < student.fee_per_month() {
      return None;
    }
    let months = self.months_covered_by_amount(student, through, amount);
    if months.is_empty() {
      return Some("All months up to selected month are already paid.".to_owned());
    }
    let labels: Vec<String> = months.iter().map(|m| m.label()).collect();
    Some(format!("This payment covers: {}", labels.join(", ")))
  }

  /// The entry paying `month` for a student, if any.
  pub fn payment_for_month(&self, student_id: &str, month: YearMonth) -> Option<&Payment> {
    self
      .payments
      .iter()
      .find(|p| p.student_id == student_id && p.month == month)
  }

  /// Validate a request and resolve the months it covers. Does not mutate.
  pub fn plan_payment(&self, request: &PaymentRequest) -> Result<PaymentPlan> {
    let student_id = request.student_id.trim();
    let student = Some(student_id)
      .filter(|id| !id.is_empty())
      .and_then(|id| self.student(id))
      .ok_or_else(|| Error::validation("Select a student"))?;
    let through = request
      .through_month
      .ok_or_else(|| Error::validation("Select a month"))?;
    let fee = student.fee_per_month();
    if request.amount < fee {
      return Err(Error::validation(format!("Amount must be at least ₹{fee}")));
    }
    let paid_date = request
      .paid_date
      .ok_or_else(|| Error::validation("Select paid date"))?;

    let months = self.months_covered_by_amount(student, through, request.amount);
    if months.is_empty() {
      return Err(Error::NothingToPay { through });
    }

    Ok(PaymentPlan {
      student_id: student.id.clone(),
      through,
      months,
      fee_per_month: fee,
      amount: request.amount,
      paid_date,
      mode: request.mode.clone(),
      notes: request.notes.trim().to_owned(),
      allow_overwrite: request.allow_overwrite,
    })
  }

  /// Write the entries of `plan` under one freshly allocated receipt number
  /// and return the canonical entry.
  ///
  /// Every planned month is checked before anything changes: a month that
  /// already has an entry aborts the whole commit with
  /// [`Error::DuplicatePayment`] unless the plan allows overwriting.
  pub fn commit_payment(&mut self, plan: PaymentPlan, now: DateTime<Utc>) -> Result<Payment> {
    if self.student(&plan.student_id).is_none() {
      return Err(Error::StudentNotFound(plan.student_id));
    }
    let Some(&first_month) = plan.months.first() else {
      return Err(Error::NothingToPay { through: plan.through });
    };
    if !plan.allow_overwrite
      && let Some(month) = plan
        .months
        .iter()
        .copied()
        .find(|m| self.payment_for_month(&plan.student_id, *m).is_some())
    {
      return Err(Error::DuplicatePayment { month });
    }

    let receipt_no = self.allocate_receipt_number(now);
    let count = plan.months.len();
    let group_note = if plan.notes.is_empty() {
      format!("(Part of {count}-month payment)")
    } else {
      format!("{} (Part of {count}-month payment)", plan.notes)
    };

    let mut created = Vec::new();
    for (i, &month) in plan.months.iter().enumerate() {
      let canonical = i == 0;
      let existing = self
        .payments
        .iter()
        .position(|p| p.student_id == plan.student_id && p.month == month);

      let (id, created_at) = match existing {
        Some(idx) => (self.payments[idx].id.clone(), self.payments[idx].created_at),
        None => (new_id(), now),
      };
      let payment = Payment {
        id,
        student_id: plan.student_id.clone(),
        month,
        amount: plan.fee_per_month,
        total_amount: canonical.then_some(plan.amount),
        months_covered: canonical.then(|| plan.months.clone()),
        paid_date: plan.paid_date,
        mode: plan.mode.clone(),
        notes: if canonical { plan.notes.clone() } else { group_note.clone() },
        receipt_no: if canonical { receipt_no.clone() } else { format!("{receipt_no}-{i}") },
        created_at,
        updated_at: now,
      };

      match existing {
        Some(idx) => self.payments[idx] = payment,
        None => created.push(payment),
      }
    }
    self.payments.splice(0..0, created);

    self
      .payment_for_month(&plan.student_id, first_month)
      .cloned()
      .ok_or_else(|| Error::PaymentNotFound(receipt_no))
  }

  pub fn payment(&self, id: &str) -> Option<&Payment> {
    self.payments.iter().find(|p| p.id == id)
  }

  /// Payments for the receipts view, newest first. `query` matches receipt
  /// number, month, student name and class, case-insensitively.
  pub fn list_payments(&self, query: Option<&str>) -> Vec<&Payment> {
    let query = query.map(str::trim).unwrap_or_default().to_lowercase();
    let mut out: Vec<&Payment> = self
      .payments
      .iter()
      .filter(|p| {
        if query.is_empty() {
          return true;
        }
        let student = self.student(&p.student_id);
        let haystack = format!(
          "{} {} {} {}",
          p.receipt_no,
          p.month,
          student.map(|s| s.name.as_str()).unwrap_or_default(),
          student.map(|s| s.class_tier.to_string()).unwrap_or_default(),
        )
        .to_lowercase();
        haystack.contains(&query)
      })
      .collect();
    // Stable: entries of one receipt keep their stored order.
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
  }
}
