//! Students: the people fees and attendance are tracked for.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  Error, Result,
  allocator::new_id,
  lenient::empty_as_none,
  month::YearMonth,
  record::Record,
};

/// Monthly fee applied when none (or a non-positive one) is given.
pub const DEFAULT_MONTHLY_FEE: u64 = 450;

/// Machine numbers run from 1 through this value.
pub const MACHINE_COUNT: u8 = 5;

/// The fixed catalogue of class timing slots.
pub const TIMING_SLOTS: [&str; 7] = [
  "6.30 am - 7.30 am",
  "7.30 am - 8.30 am",
  "8.30 am - 9.30 am",
  "5.00 pm - 6.00 pm",
  "6.00 pm - 7.00 pm",
  "7.00 pm - 8.00 pm",
  "8.00 pm - 9.00 pm",
];

// ─── ClassTier ───────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ClassTier {
  #[default]
  Junior,
  Senior,
}

// ─── Student ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
  pub id:              String,
  pub name:            String,
  #[serde(rename = "className")]
  pub class_tier:      ClassTier,
  pub timing:          String,
  /// Absent only for legacy entries whose machine could not be recovered.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub machine_no:      Option<u8>,
  #[serde(default)]
  pub mobile:          String,
  pub date_of_joining: NaiveDate,
  pub monthly_fee:     u64,
  /// Soft-delete flag; inactive students are hidden from listings.
  pub active:          bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Student {
  /// The first month a fee is due for.
  pub fn joining_month(&self) -> YearMonth { YearMonth::of(self.date_of_joining) }

  /// One month's fee for this student.
  pub fn fee_per_month(&self) -> u64 { self.monthly_fee }

  /// Machine number for display, `-` when unknown.
  pub fn machine_label(&self) -> String {
    self
      .machine_no
      .map_or_else(|| "-".to_owned(), |n| n.to_string())
  }

  fn matches(&self, filter: &StudentFilter) -> bool {
    if !filter.include_inactive && !self.active {
      return false;
    }
    if filter.class_tier.is_some_and(|c| c != self.class_tier) {
      return false;
    }
    if filter.timing.as_deref().is_some_and(|t| t != self.timing) {
      return false;
    }
    if filter.machine_no.is_some() && filter.machine_no != self.machine_no {
      return false;
    }
    match filter.query.as_deref().map(str::trim) {
      None | Some("") => true,
      Some(q) => {
        let haystack = format!(
          "{} {} {} {} {}",
          self.name,
          self.class_tier,
          self.timing,
          self.machine_label(),
          self.mobile
        )
        .to_lowercase();
        haystack.contains(&q.to_lowercase())
      }
    }
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Input to [`Record::upsert_student`]. Text fields arrive as typed by the
/// operator and are trimmed and validated on save.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewStudent {
  /// `None` creates a new student; `Some` updates an existing one.
  pub id:              Option<String>,
  pub name:            String,
  pub class_name:      String,
  pub timing:          String,
  pub machine_no:      Option<u8>,
  pub mobile:          Option<String>,
  #[serde(deserialize_with = "empty_as_none")]
  pub date_of_joining: Option<NaiveDate>,
  pub monthly_fee:     Option<u64>,
  pub active:          Option<bool>,
}

/// Validated fields shared by create and update.
struct StudentFields {
  name:            String,
  class_tier:      ClassTier,
  timing:          String,
  machine_no:      u8,
  mobile:          String,
  date_of_joining: NaiveDate,
  monthly_fee:     u64,
}

impl NewStudent {
  fn validate(&self) -> Result<StudentFields> {
    let name = self.name.trim();
    let class_name = self.class_name.trim();
    let timing = self.timing.trim();

    if name.is_empty() {
      return Err(Error::validation("Student name is required."));
    }
    if class_name.is_empty() {
      return Err(Error::validation("Class is required."));
    }
    let class_tier: ClassTier = class_name
      .parse()
      .map_err(|_| Error::validation(format!("Unknown class {class_name:?}.")))?;
    if timing.is_empty() {
      return Err(Error::validation("Timing is required."));
    }
    if !TIMING_SLOTS.contains(&timing) {
      return Err(Error::validation(format!("Unknown timing {timing:?}.")));
    }
    let date_of_joining = self
      .date_of_joining
      .ok_or_else(|| Error::validation("Date of joining is required."))?;
    let machine_no = self
      .machine_no
      .filter(|n| (1..=MACHINE_COUNT).contains(n))
      .ok_or_else(|| {
        Error::validation(format!("Machine number must be 1 to {MACHINE_COUNT}."))
      })?;

    Ok(StudentFields {
      name: name.to_owned(),
      class_tier,
      timing: timing.to_owned(),
      machine_no,
      mobile: self.mobile.as_deref().unwrap_or_default().trim().to_owned(),
      date_of_joining,
      monthly_fee: self
        .monthly_fee
        .filter(|fee| *fee > 0)
        .unwrap_or(DEFAULT_MONTHLY_FEE),
    })
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`Record::list_students`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct StudentFilter {
  /// Case-insensitive text matched against name, class, timing, machine and
  /// mobile.
  pub query:            Option<String>,
  #[serde(rename = "class")]
  pub class_tier:       Option<ClassTier>,
  pub timing:           Option<String>,
  pub machine_no:       Option<u8>,
  pub include_inactive: bool,
}

// ─── Record operations ───────────────────────────────────────────────────────

impl Record {
  pub fn student(&self, id: &str) -> Option<&Student> {
    self.students.iter().find(|s| s.id == id)
  }

  /// Students matching `filter`, sorted by name.
  pub fn list_students(&self, filter: &StudentFilter) -> Vec<&Student> {
    let mut out: Vec<&Student> =
      self.students.iter().filter(|s| s.matches(filter)).collect();
    out.sort_by(|a, b| {
      a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
    });
    out
  }

  /// Create a student (`input.id` is `None`) or update an existing one.
  ///
  /// Updates keep the identifier and `created_at`; `active` is only changed
  /// when the input carries it.
  pub fn upsert_student(
    &mut self,
    input: NewStudent,
    now: DateTime<Utc>,
  ) -> Result<Student> {
    let fields = input.validate()?;

    if let Some(id) = input.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      let existing = self
        .students
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| Error::StudentNotFound(id.to_owned()))?;

      existing.name = fields.name;
      existing.class_tier = fields.class_tier;
      existing.timing = fields.timing;
      existing.machine_no = Some(fields.machine_no);
      existing.mobile = fields.mobile;
      existing.date_of_joining = fields.date_of_joining;
      existing.monthly_fee = fields.monthly_fee;
      if let Some(active) = input.active {
        existing.active = active;
      }
      existing.updated_at = now;
      return Ok(existing.clone());
    }

    let student = Student {
      id:              new_id(),
      name:            fields.name,
      class_tier:      fields.class_tier,
      timing:          fields.timing,
      machine_no:      Some(fields.machine_no),
      mobile:          fields.mobile,
      date_of_joining: fields.date_of_joining,
      monthly_fee:     fields.monthly_fee,
      active:          input.active.unwrap_or(true),
      created_at:      now,
      updated_at:      now,
    };
    self.students.insert(0, student.clone());
    Ok(student)
  }

  /// Remove a student together with every attendance entry and payment that
  /// references it.
  pub fn delete_student(&mut self, id: &str) -> Result<Student> {
    let idx = self
      .students
      .iter()
      .position(|s| s.id == id)
      .ok_or_else(|| Error::StudentNotFound(id.to_owned()))?;
    let removed = self.students.remove(idx);
    self.attendance.retain(|a| a.student_id != id);
    self.payments.retain(|p| p.student_id != id);
    Ok(removed)
  }
}
