//! Bringing stored documents up to the current record shape.
//!
//! [`migrate`] accepts any JSON value and always produces a usable
//! [`Record`]. Upgrades are one step function per schema version, applied in
//! order to documents older than each step's target. Afterwards every entity
//! is decoded leniently: malformed entries are dropped and malformed fields
//! coerced, never rejected.
//!
//! Migration is pure and idempotent: `migrate(migrate(x)) == migrate(x)`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Utc};
use serde_json::{Map, Value};

use crate::{
  Result,
  attendance::{AttendanceEntry, AttendanceStatus},
  lenient,
  month::YearMonth,
  payment::{Payment, PaymentMode},
  record::{CURRENT_VERSION, Counters, Record},
  student::{ClassTier, DEFAULT_MONTHLY_FEE, MACHINE_COUNT, Student},
};

/// Legacy class names folded into [`ClassTier::Junior`].
const JUNIOR_CLASSES: [&str; 3] = ["8th", "9th", "10th"];
/// Legacy class names folded into [`ClassTier::Senior`].
const SENIOR_CLASSES: [&str; 4] = ["11th", "12th", "UG", "PG"];

type Step = fn(&mut Map<String, Value>, DateTime<Utc>);

/// `(target version, step)`, ascending.
const STEPS: [(u32, Step); 2] = [(1, coerce_containers), (2, upgrade_students)];

/// Produce a current-version record from any stored document. Anything that
/// is not a JSON object yields a fresh default record.
pub fn migrate(doc: &Value, now: DateTime<Utc>) -> Record {
  let Value::Object(doc) = doc else {
    return Record::new(now);
  };
  let mut doc = doc.clone();

  let stored = lenient::integer(doc.get("version"))
    .and_then(|v| u32::try_from(v).ok())
    .unwrap_or(0);
  for (target, step) in STEPS {
    if stored < target {
      step(&mut doc, now);
    }
  }

  decode(&doc, stored.max(CURRENT_VERSION), now)
}

/// Run an in-memory record back through [`migrate`].
pub fn remigrate(record: &Record, now: DateTime<Utc>) -> Result<Record> {
  Ok(migrate(&serde_json::to_value(record)?, now))
}

// ─── Steps ───────────────────────────────────────────────────────────────────

/// v1: every collection is an array and the counters carry both fields.
fn coerce_containers(doc: &mut Map<String, Value>, now: DateTime<Utc>) {
  for key in ["students", "attendance", "payments"] {
    if !doc.get(key).is_some_and(Value::is_array) {
      doc.insert(key.to_owned(), Value::Array(Vec::new()));
    }
  }

  let mut counters = Map::new();
  counters.insert("nextReceiptNumber".to_owned(), Value::from(1));
  counters.insert("receiptYear".to_owned(), Value::from(now.year()));
  if let Some(Value::Object(stored)) = doc.get("counters") {
    counters.extend(stored.iter().map(|(k, v)| (k.clone(), v.clone())));
  }
  doc.insert("counters".to_owned(), Value::Object(counters));
}

/// v2: legacy `batch` becomes `machineNo`, `mobile` is always present, and
/// per-grade classes collapse into the two tiers.
fn upgrade_students(doc: &mut Map<String, Value>, _now: DateTime<Utc>) {
  let Some(Value::Array(students)) = doc.get_mut("students") else {
    return;
  };
  for student in students.iter_mut().filter_map(Value::as_object_mut) {
    if let Some(batch) = student.remove("batch") {
      let has_machine = student
        .get("machineNo")
        .and_then(|v| lenient::number(Some(v)))
        .is_some_and(|n| n != 0.0);
      let machine = lenient::integer(Some(&batch))
        .filter(|n| (1..=i64::from(MACHINE_COUNT)).contains(n));
      if let (false, Some(n)) = (has_machine, machine) {
        student.insert("machineNo".to_owned(), Value::from(n));
      }
    }

    if student.get("mobile").is_none_or(Value::is_null) {
      student.insert("mobile".to_owned(), Value::String(String::new()));
    }

    let tier = match student.get("className").and_then(Value::as_str) {
      Some(c) if JUNIOR_CLASSES.contains(&c) => Some(ClassTier::Junior),
      Some(c) if SENIOR_CLASSES.contains(&c) => Some(ClassTier::Senior),
      _ => None,
    };
    if let Some(tier) = tier {
      student.insert("className".to_owned(), Value::String(tier.to_string()));
    }
  }
}

// ─── Decode ──────────────────────────────────────────────────────────────────

fn decode(doc: &Map<String, Value>, version: u32, now: DateTime<Utc>) -> Record {
  let items = |key: &str| {
    doc
      .get(key)
      .and_then(Value::as_array)
      .map(Vec::as_slice)
      .unwrap_or_default()
  };

  let payments: Vec<Payment> = items("payments")
    .iter()
    .filter_map(|v| decode_payment(v.as_object()?, now))
    .collect();

  let mut first_paid: HashMap<&str, YearMonth> = HashMap::new();
  for p in &payments {
    first_paid
      .entry(p.student_id.as_str())
      .and_modify(|m| *m = (*m).min(p.month))
      .or_insert(p.month);
  }

  let mut seen = HashSet::new();
  let students = items("students")
    .iter()
    .filter_map(|v| {
      let raw = v.as_object()?;
      let first_paid = lenient::text(raw.get("id"))
        .and_then(|id| first_paid.get(id.as_str()).copied());
      decode_student(raw, first_paid, now)
    })
    .filter(|s| seen.insert(s.id.clone()))
    .collect();
  let attendance = items("attendance")
    .iter()
    .filter_map(|v| decode_attendance(v.as_object()?, now))
    .collect();

  let counters = doc.get("counters").and_then(Value::as_object);
  let field = |name: &str| counters.and_then(|c| lenient::integer(c.get(name)));
  let counters = Counters {
    next_receipt_number: field("nextReceiptNumber")
      .and_then(|n| u32::try_from(n).ok())
      .filter(|n| *n >= 1)
      .unwrap_or(1),
    receipt_year: field("receiptYear")
      .and_then(|y| i32::try_from(y).ok())
      .unwrap_or_else(|| now.year()),
  };

  Record { version, students, attendance, payments, counters }
}

/// A missing or unparseable joining date falls back to the earlier of the
/// creation date and the first paid month, so existing entries stay
/// attached to the student.
fn decode_student(
  raw: &Map<String, Value>,
  first_paid: Option<YearMonth>,
  now: DateTime<Utc>,
) -> Option<Student> {
  let created_at = lenient::timestamp(raw.get("createdAt")).unwrap_or(now);
  let date_of_joining = lenient::date(raw.get("dateOfJoining")).unwrap_or_else(|| {
    let created = created_at.date_naive();
    first_paid
      .and_then(YearMonth::first_day)
      .map_or(created, |paid| paid.min(created))
  });
  Some(Student {
    id: lenient::text(raw.get("id"))?,
    name: lenient::text(raw.get("name")).unwrap_or_default(),
    class_tier: lenient::text(raw.get("className"))
      .and_then(|c| c.parse().ok())
      .unwrap_or_default(),
    timing: lenient::text(raw.get("timing")).unwrap_or_default(),
    machine_no: lenient::integer(raw.get("machineNo"))
      .and_then(|n| u8::try_from(n).ok())
      .filter(|n| (1..=MACHINE_COUNT).contains(n)),
    mobile: lenient::text(raw.get("mobile")).unwrap_or_default(),
    date_of_joining,
    monthly_fee: lenient::amount(raw.get("monthlyFee"))
      .filter(|fee| *fee > 0)
      .unwrap_or(DEFAULT_MONTHLY_FEE),
    active: lenient::boolean(raw.get("active")).unwrap_or(true),
    created_at,
    updated_at: lenient::timestamp(raw.get("updatedAt")).unwrap_or(created_at),
  })
}

fn decode_attendance(raw: &Map<String, Value>, now: DateTime<Utc>) -> Option<AttendanceEntry> {
  Some(AttendanceEntry {
    id: lenient::text(raw.get("id"))?,
    date: lenient::date(raw.get("dateISO"))?,
    student_id: lenient::text(raw.get("studentId"))?,
    status: lenient::text(raw.get("status"))?
      .parse::<AttendanceStatus>()
      .ok()?,
    created_at: lenient::timestamp(raw.get("createdAt")).unwrap_or(now),
  })
}

fn decode_payment(raw: &Map<String, Value>, now: DateTime<Utc>) -> Option<Payment> {
  let created_at = lenient::timestamp(raw.get("createdAt")).unwrap_or(now);
  Some(Payment {
    id: lenient::text(raw.get("id"))?,
    student_id: lenient::text(raw.get("studentId"))?,
    month: lenient::text(raw.get("month"))?.parse().ok()?,
    amount: lenient::amount(raw.get("amount")).unwrap_or(0),
    total_amount: lenient::amount(raw.get("totalAmount")),
    months_covered: raw
      .get("monthsCovered")
      .and_then(Value::as_array)
      .map(|months| {
        months
          .iter()
          .filter_map(|m| lenient::text(Some(m))?.parse().ok())
          .collect()
      }),
    paid_date: lenient::date(raw.get("paidDateISO"))?,
    mode: lenient::text(raw.get("mode"))
      .map(PaymentMode::from)
      .unwrap_or_default(),
    notes: lenient::text(raw.get("notes")).unwrap_or_default(),
    receipt_no: lenient::text(raw.get("receiptNo")).unwrap_or_default(),
    created_at,
    updated_at: lenient::timestamp(raw.get("updatedAt")).unwrap_or(created_at),
  })
}
