//! Revision tags for the whole record.
//!
//! A tag is the SHA-256 of the record's compact JSON, quoted as a strong
//! HTTP entity tag. Any change to any entity changes it.

use roster_core::{Result, record::Record};
use sha2::{Digest, Sha256};

pub fn compute_etag(record: &Record) -> Result<String> {
  let bytes = serde_json::to_vec(record)?;
  let hash = Sha256::digest(&bytes);
  Ok(format!("\"{}\"", hex::encode(hash)))
}

/// Compare tags, tolerating clients that drop the surrounding quotes.
pub fn etags_match(a: &str, b: &str) -> bool { strip_etag_quotes(a) == strip_etag_quotes(b) }

fn strip_etag_quotes(s: &str) -> &str { s.trim().trim_matches('"') }
