//! Plain-text renderings of API responses.

use std::{collections::BTreeMap, fmt::Write as _};

use roster_core::{
  attendance::AttendanceStatus,
  payment::Payment,
  receipt::format_amount,
  report::MonthSummary,
  student::Student,
};

use crate::client::Dues;

pub fn students(list: &[Student]) -> String {
  if list.is_empty() {
    return "No students.\n".to_owned();
  }
  let mut out = String::new();
  for s in list {
    let _ = writeln!(
      out,
      "{:<38} {:<20} {:<7} {:<18} M{} {}{}",
      s.id,
      s.name,
      s.class_tier,
      s.timing,
      s.machine_label(),
      s.mobile,
      if s.active { "" } else { " (inactive)" },
    );
  }
  out
}

pub fn payments(list: &[Payment], names: &BTreeMap<String, String>) -> String {
  if list.is_empty() {
    return "No payments.\n".to_owned();
  }
  let mut out = String::new();
  for p in list {
    let name = names.get(&p.student_id).map_or("?", String::as_str);
    let _ = writeln!(
      out,
      "{:<14} {:<20} {:<14} ₹{:>8}  {}  {}",
      p.receipt_no,
      name,
      p.month.label(),
      format_amount(p.amount),
      p.paid_date,
      p.mode,
    );
  }
  out
}

pub fn dues(d: &Dues) -> String {
  let mut out = String::new();
  if d.unpaid_months.is_empty() {
    let _ = writeln!(out, "Nothing due through {}.", d.through.label());
  } else {
    let months: Vec<String> = d.unpaid_months.iter().map(|m| m.label()).collect();
    let _ = writeln!(
      out,
      "Due through {}: ₹{} ({} × ₹{})",
      d.through.label(),
      format_amount(d.due_amount),
      d.unpaid_months.len(),
      format_amount(d.fee_per_month),
    );
    let _ = writeln!(out, "Unpaid: {}", months.join(", "));
  }
  if let Some(hint) = &d.hint {
    let _ = writeln!(out, "{hint}");
  }
  out
}

pub fn attendance(day: &BTreeMap<String, AttendanceStatus>, names: &BTreeMap<String, String>) -> String {
  if day.is_empty() {
    return "No attendance recorded.\n".to_owned();
  }
  let mut out = String::new();
  for (id, status) in day {
    let name = names.get(id).map_or(id.as_str(), String::as_str);
    let _ = writeln!(out, "{status}  {name}");
  }
  out
}

pub fn summary(s: &MonthSummary) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}", s.month.label());
  let _ = writeln!(out, "Collected: ₹{}", format_amount(s.total_collected));
  let _ = writeln!(out, "Paid ({}):", s.paid_students.len());
  for student in &s.paid_students {
    let _ = writeln!(out, "  {}", student.name);
  }
  let _ = writeln!(out, "Dues ({}):", s.dues.len());
  for due in &s.dues {
    let _ = writeln!(
      out,
      "  {:<20} {} month(s)  ₹{}",
      due.student.name,
      due.unpaid_months,
      format_amount(due.due_amount),
    );
  }
  out
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};
  use roster_core::{
    month::YearMonth,
    payment::PaymentMode,
    report::StudentDue,
    student::ClassTier,
  };

  use super::*;

  fn ym(s: &str) -> YearMonth { s.parse().unwrap() }

  fn student() -> Student {
    Student {
      id:              "s1".into(),
      name:            "Asha".into(),
      class_tier:      ClassTier::Junior,
      timing:          "6.30 am - 7.30 am".into(),
      machine_no:      Some(3),
      mobile:          String::new(),
      date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
      monthly_fee:     450,
      active:          true,
      created_at:      Utc::now(),
      updated_at:      Utc::now(),
    }
  }

  #[test]
  fn dues_lists_months_and_hint() {
    let d = Dues {
      student_id:     "s1".into(),
      through:        ym("2024-03"),
      fee_per_month:  450,
      unpaid_months:  vec![ym("2024-02"), ym("2024-03")],
      due_amount:     900,
      covered_months: None,
      hint:           Some("This payment covers: February 2024".into()),
    };
    let text = dues(&d);
    assert!(text.starts_with("Due through March 2024: ₹900 (2 × ₹450)"));
    assert!(text.contains("Unpaid: February 2024, March 2024"));
    assert!(text.ends_with("This payment covers: February 2024\n"));
  }

  #[test]
  fn settled_dues() {
    let d = Dues {
      student_id:     "s1".into(),
      through:        ym("2024-03"),
      fee_per_month:  450,
      unpaid_months:  Vec::new(),
      due_amount:     0,
      covered_months: None,
      hint:           None,
    };
    assert_eq!(dues(&d), "Nothing due through March 2024.\n");
  }

  #[test]
  fn payment_rows_use_names_and_grouping() {
    let p = Payment {
      id:             "p1".into(),
      student_id:     "s1".into(),
      month:          ym("2024-01"),
      amount:         123_456,
      total_amount:   None,
      months_covered: None,
      paid_date:      NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
      mode:           PaymentMode::Upi,
      notes:          String::new(),
      receipt_no:     "R-2024-0001".into(),
      created_at:     Utc::now(),
      updated_at:     Utc::now(),
    };
    let names = BTreeMap::from([("s1".to_owned(), "Asha".to_owned())]);
    let row = payments(&[p], &names);
    assert!(row.contains("Asha"));
    assert!(row.contains("1,23,456"));
    assert!(row.contains("January 2024"));
    assert!(row.trim_end().ends_with("UPI"));
  }

  #[test]
  fn summary_sections() {
    let s = MonthSummary {
      month:           ym("2024-03"),
      total_collected: 1350,
      paid_students:   vec![student()],
      dues:            vec![StudentDue { student: student(), unpaid_months: 2, due_amount: 900 }],
    };
    let text = summary(&s);
    assert!(text.contains("Collected: ₹1,350"));
    assert!(text.contains("Paid (1):\n  Asha\n"));
    assert!(text.contains("2 month(s)  ₹900"));
  }

  #[test]
  fn empty_lists() {
    assert_eq!(students(&[]), "No students.\n");
    assert_eq!(attendance(&BTreeMap::new(), &BTreeMap::new()), "No attendance recorded.\n");
  }
}
