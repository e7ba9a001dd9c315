//! Daily attendance.
//!
//! Saving a date replaces every entry for that date, so at most one entry
//! per (student, date) survives a save.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result, allocator::new_id, record::Record};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum AttendanceStatus {
  #[serde(rename = "P", alias = "present", alias = "Present")]
  #[strum(to_string = "P", serialize = "present")]
  Present,
  #[serde(rename = "A", alias = "absent", alias = "Absent")]
  #[strum(to_string = "A", serialize = "absent")]
  Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
  pub id:         String,
  #[serde(rename = "dateISO")]
  pub date:       NaiveDate,
  /// Weak reference; removed together with the student.
  pub student_id: String,
  pub status:     AttendanceStatus,
  pub created_at: DateTime<Utc>,
}

impl Record {
  /// The saved status of every student marked on `date`.
  pub fn attendance_for_date(&self, date: NaiveDate) -> BTreeMap<String, AttendanceStatus> {
    self
      .attendance
      .iter()
      .filter(|a| a.date == date)
      .map(|a| (a.student_id.clone(), a.status))
      .collect()
  }

  /// Replace the full set of entries for `date` with one entry per supplied
  /// (student, status) pair. Students left out are no longer marked.
  ///
  /// Every student must exist; otherwise nothing changes.
  pub fn set_attendance_for_date(
    &mut self,
    date: NaiveDate,
    statuses: impl IntoIterator<Item = (String, AttendanceStatus)>,
    now: DateTime<Utc>,
  ) -> Result<Vec<AttendanceEntry>> {
    // Collapsing through a map keeps the last status given per student.
    let statuses: BTreeMap<String, AttendanceStatus> = statuses.into_iter().collect();

    if let Some(unknown) = statuses.keys().find(|id| self.student(id).is_none()) {
      return Err(Error::StudentNotFound(unknown.clone()));
    }

    let entries: Vec<AttendanceEntry> = statuses
      .into_iter()
      .map(|(student_id, status)| AttendanceEntry {
        id: new_id(),
        date,
        student_id,
        status,
        created_at: now,
      })
      .collect();

    self.attendance.retain(|a| a.date != date);
    self.attendance.extend(entries.iter().cloned());
    Ok(entries)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::student::{NewStudent, TIMING_SLOTS};

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap() }

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, d).unwrap() }

  fn with_students(names: &[&str]) -> (Record, Vec<String>) {
    let mut r = Record::new(now());
    let ids = names
      .iter()
      .map(|name| {
        r.upsert_student(
          NewStudent {
            name: (*name).into(),
            class_name: "Senior".into(),
            timing: TIMING_SLOTS[3].into(),
            machine_no: Some(1),
            date_of_joining: Some(day(1)),
            ..NewStudent::default()
          },
          now(),
        )
        .unwrap()
        .id
      })
      .collect();
    (r, ids)
  }

  #[test]
  fn save_replaces_the_whole_date() {
    let (mut r, ids) = with_students(&["Asha", "Bala"]);

    r.set_attendance_for_date(
      day(4),
      [
        (ids[0].clone(), AttendanceStatus::Present),
        (ids[1].clone(), AttendanceStatus::Present),
      ],
      now(),
    )
    .unwrap();
    r.set_attendance_for_date(day(5), [(ids[0].clone(), AttendanceStatus::Absent)], now())
      .unwrap();

    // Resave day 4 with only one student: the other is dropped.
    r.set_attendance_for_date(day(4), [(ids[1].clone(), AttendanceStatus::Absent)], now())
      .unwrap();

    let day4 = r.attendance_for_date(day(4));
    assert_eq!(day4.len(), 1);
    assert_eq!(day4.get(&ids[1]), Some(&AttendanceStatus::Absent));
    assert_eq!(r.attendance_for_date(day(5)).len(), 1);
    assert_eq!(r.attendance.len(), 2);
  }

  #[test]
  fn duplicate_pairs_collapse_to_one_entry() {
    let (mut r, ids) = with_students(&["Asha"]);
    let saved = r
      .set_attendance_for_date(
        day(4),
        [
          (ids[0].clone(), AttendanceStatus::Present),
          (ids[0].clone(), AttendanceStatus::Absent),
        ],
        now(),
      )
      .unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].status, AttendanceStatus::Absent);
  }

  #[test]
  fn unknown_student_changes_nothing() {
    let (mut r, ids) = with_students(&["Asha"]);
    r.set_attendance_for_date(day(4), [(ids[0].clone(), AttendanceStatus::Present)], now())
      .unwrap();
    let before = r.clone();

    let err = r
      .set_attendance_for_date(day(4), [("ghost".to_owned(), AttendanceStatus::Present)], now())
      .unwrap_err();
    assert!(matches!(err, Error::StudentNotFound(id) if id == "ghost"));
    assert_eq!(r, before);
  }

  #[test]
  fn status_wire_form() {
    assert_eq!(serde_json::to_string(&AttendanceStatus::Present).unwrap(), "\"P\"");
    assert_eq!("absent".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Absent);
  }
}
