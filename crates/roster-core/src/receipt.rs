//! Receipt documents: a payment joined with its student, ready to print or
//! share.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
  Error, Result,
  month::YearMonth,
  payment::{Payment, PaymentMode},
  phone::international_digits,
  record::Record,
  student::{ClassTier, Student},
};

/// Letterhead printed on every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Institute {
  pub name:    String,
  pub address: String,
}

impl Default for Institute {
  fn default() -> Self {
    Self { name: "Training Institute".to_owned(), address: String::new() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
  pub institute:    Institute,
  pub receipt_no:   String,
  pub paid_date:    NaiveDate,
  pub student_name: String,
  #[serde(rename = "className")]
  pub class_tier:   ClassTier,
  pub timing:       String,
  pub machine_no:   Option<u8>,
  pub mobile:       String,
  /// Oldest first.
  pub fees_for:     Vec<YearMonth>,
  pub mode:         PaymentMode,
  pub total_amount: u64,
  pub notes:        String,
}

impl Receipt {
  pub fn build(payment: &Payment, student: &Student, institute: &Institute) -> Self {
    let (fees_for, total_amount) = match &payment.months_covered {
      Some(months) if months.len() > 1 => {
        (months.clone(), payment.total_amount.unwrap_or(payment.amount))
      }
      _ => {
        // Entries written before per-month splitting hold the whole amount
        // against their first month.
        let count = payment.months_paid(student.fee_per_month());
        let months = std::iter::successors(Some(payment.month), |m| Some(m.succ()))
          .take(usize::try_from(count).unwrap_or(1))
          .collect();
        (months, payment.amount)
      }
    };

    Self {
      institute: institute.clone(),
      receipt_no: payment.receipt_no.clone(),
      paid_date: payment.paid_date,
      student_name: student.name.clone(),
      class_tier: student.class_tier,
      timing: student.timing.clone(),
      machine_no: student.machine_no,
      mobile: student.mobile.clone(),
      fees_for,
      mode: payment.mode.clone(),
      total_amount,
      notes: payment.notes.clone(),
    }
  }

  /// "January 2024, February 2024".
  pub fn fees_for_label(&self) -> String {
    self
      .fees_for
      .iter()
      .map(|m| m.label())
      .collect::<Vec<_>>()
      .join(", ")
  }

  /// Fixed-layout printable rendition.
  pub fn render_text(&self) -> String {
    let mut out = String::new();
    let header = format!("Fee Receipt{:>30}", self.receipt_no);
    out.push_str(&header);
    out.push('\n');
    out.push_str(&format!("{:<24}{:>17}\n", self.institute.name, self.paid_date));
    if !self.institute.address.is_empty() {
      out.push_str(&self.institute.address);
      out.push('\n');
    }
    out.push('\n');

    let machine = self.machine_no.map_or_else(|| "-".to_owned(), |n| n.to_string());
    let notes = if self.notes.is_empty() { "-" } else { self.notes.as_str() };
    let rows = [
      ("Student name", self.student_name.clone()),
      ("Class", self.class_tier.to_string()),
      ("Timing", self.timing.clone()),
      ("Machine no", machine),
      ("Fees for", self.fees_for_label()),
      ("Payment mode", self.mode.to_string()),
      ("Amount paid", format!("₹ {}", format_amount(self.total_amount))),
      ("Notes", notes.to_owned()),
    ];
    for (label, value) in rows {
      out.push_str(&format!("{label:<14}{value}\n"));
    }
    out
  }

  /// Plain-text rendition sent by message.
  pub fn message_body(&self) -> String {
    format!(
      "{}\n{}\n\nFee Receipt: {}\nStudent: {}\nClass: {}\nFees for: {}\nAmount: ₹{}\nPaid on: {}\nMode: {}",
      self.institute.name,
      self.institute.address,
      self.receipt_no,
      self.student_name,
      self.class_tier,
      self.fees_for_label(),
      format_amount(self.total_amount),
      self.paid_date,
      self.mode,
    )
  }

  /// A WhatsApp click-to-chat link carrying [`Self::message_body`], or `None`
  /// when the student has no usable mobile number.
  pub fn share_link(&self) -> Option<Url> {
    let number = international_digits(&self.mobile)?;
    let mut url = Url::parse("https://wa.me/").ok()?.join(&number).ok()?;
    url.query_pairs_mut().append_pair("text", &self.message_body());
    Some(url)
  }
}

/// Group digits the way the institute writes rupee amounts: the last three
/// together, then pairs (`12,34,567`).
pub fn format_amount(amount: u64) -> String {
  let digits = amount.to_string();
  if digits.len() <= 3 {
    return digits;
  }
  let (head, tail) = digits.split_at(digits.len() - 3);
  let mut groups: Vec<&str> = Vec::new();
  let mut rest = head;
  while rest.len() > 2 {
    let (left, right) = rest.split_at(rest.len() - 2);
    groups.push(right);
    rest = left;
  }
  groups.push(rest);
  groups.reverse();
  format!("{},{tail}", groups.join(","))
}

impl Record {
  /// The receipt for payment `id`.
  pub fn receipt(&self, id: &str, institute: &Institute) -> Result<Receipt> {
    let payment = self
      .payment(id)
      .ok_or_else(|| Error::PaymentNotFound(id.to_owned()))?;
    let student = self
      .student(&payment.student_id)
      .ok_or_else(|| Error::StudentNotFound(payment.student_id.clone()))?;
    Ok(Receipt::build(payment, student, institute))
  }
}
