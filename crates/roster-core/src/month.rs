//! Calendar year-months, the unit fees are charged in.
//!
//! A [`YearMonth`] orders chronologically and serialises as `"YYYY-MM"`, the
//! same string form the stored record uses for `Payment::month`.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::Error;

// ─── YearMonth ───────────────────────────────────────────────────────────────

/// A calendar month of a specific year.
///
/// Field order matters: the derived `Ord` compares year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
  year:  i32,
  month: u32,
}

impl YearMonth {
  /// Returns `None` unless `month` is in `1..=12`.
  pub fn new(year: i32, month: u32) -> Option<Self> {
    (1..=12).contains(&month).then_some(Self { year, month })
  }

  /// The month containing `date`.
  pub fn of(date: NaiveDate) -> Self {
    Self { year: date.year(), month: date.month() }
  }

  pub fn year(self) -> i32 { self.year }

  pub fn month(self) -> u32 { self.month }

  /// The following calendar month, rolling over into January.
  pub fn succ(self) -> Self {
    if self.month == 12 {
      Self { year: self.year + 1, month: 1 }
    } else {
      Self { year: self.year, month: self.month + 1 }
    }
  }

  /// Number of months from `self` through `end`, both inclusive. Zero when
  /// `end` precedes `self`.
  pub fn months_through(self, end: Self) -> u32 {
    let span = (end.year - self.year) * 12
      + (end.month as i32 - self.month as i32)
      + 1;
    span.max(0) as u32
  }

  /// Iterate from `self` through `end` inclusive. Empty when `end` precedes
  /// `self`.
  pub fn through(self, end: Self) -> MonthRange {
    MonthRange { next: (self <= end).then_some(self), end }
  }

  pub fn first_day(self) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(self.year, self.month, 1)
  }

  /// Long human label, e.g. `"January 2024"`.
  pub fn label(self) -> String {
    match self.first_day() {
      Some(d) => d.format("%B %Y").to_string(),
      None => self.to_string(),
    }
  }

  /// Short human label, e.g. `"Jan 2024"`.
  pub fn short_label(self) -> String {
    match self.first_day() {
      Some(d) => d.format("%b %Y").to_string(),
      None => self.to_string(),
    }
  }
}

impl fmt::Display for YearMonth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}

impl FromStr for YearMonth {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || Error::InvalidMonth(s.to_owned());
    let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
    if y.len() != 4 || m.is_empty() || m.len() > 2 {
      return Err(invalid());
    }
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    Self::new(year, month).ok_or_else(invalid)
  }
}

impl Serialize for YearMonth {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for YearMonth {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(de::Error::custom)
  }
}

// ─── MonthRange ──────────────────────────────────────────────────────────────

/// Iterator returned by [`YearMonth::through`].
#[derive(Debug, Clone)]
pub struct MonthRange {
  next: Option<YearMonth>,
  end:  YearMonth,
}

impl Iterator for MonthRange {
  type Item = YearMonth;

  fn next(&mut self) -> Option<YearMonth> {
    let current = self.next?;
    let following = current.succ();
    self.next = (following <= self.end).then_some(following);
    Some(current)
  }
}
