//! Mobile number normalization for the institute's country (calling code 91).

/// Country calling code prepended to bare national numbers.
pub const COUNTRY_CODE: &str = "91";

fn digits(raw: &str) -> String { raw.chars().filter(char::is_ascii_digit).collect() }

/// International digits without a leading `+`, or `None` when fewer than ten
/// digits remain after stripping punctuation.
///
/// Ten-digit national mobiles (starting 6 to 9) gain the country code;
/// anything else that is long enough passes through unchanged.
pub fn international_digits(raw: &str) -> Option<String> {
  let digits = digits(raw);
  let national_mobile =
    digits.len() == 10 && digits.starts_with(|c: char| ('6'..='9').contains(&c));
  if national_mobile {
    Some(format!("{COUNTRY_CODE}{digits}"))
  } else if digits.len() >= 10 {
    Some(digits)
  } else {
    None
  }
}

/// E.164 form (`+` followed by the international digits).
pub fn normalize_phone(raw: &str) -> Option<String> {
  international_digits(raw).map(|d| format!("+{d}"))
}
