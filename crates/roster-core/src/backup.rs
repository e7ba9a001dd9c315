//! Backup and restore: the whole record as a pretty-printed JSON document.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
  Error, Result,
  migrate::{migrate, remigrate},
  record::Record,
};

/// The record, migrated, as indented JSON.
pub fn export(record: &Record, now: DateTime<Utc>) -> Result<String> {
  Ok(serde_json::to_string_pretty(&remigrate(record, now)?)?)
}

/// Parse a backup and bring it to the current shape. The caller replaces the
/// stored record with the result.
pub fn import(text: &str, now: DateTime<Utc>) -> Result<Record> {
  let text = text.trim();
  if text.is_empty() {
    return Err(Error::InvalidBackup("paste backup JSON first".to_owned()));
  }
  let doc: Value = serde_json::from_str(text)
    .map_err(|_| Error::InvalidBackup("invalid JSON".to_owned()))?;
  if !doc.is_object() {
    return Err(Error::InvalidBackup("invalid backup format".to_owned()));
  }
  Ok(migrate(&doc, now))
}
