//! Lenient conversions from stored string values.

/// Parse the leading integer of `s`.
///
/// Leading whitespace and an optional sign are accepted; parsing stops at the
/// first non-digit. `"42px"` is `42`, `" -7"` is `-7`, `"3.9"` is `3`. Returns
/// `None` when no digit follows, or the number overflows `i64`.
pub fn parse_leading_int(s: &str) -> Option<i64> {
  let s = s.trim_start();
  let (negative, rest) = match s.as_bytes().first() {
    Some(b'-') => (true, &s[1..]),
    Some(b'+') => (false, &s[1..]),
    _ => (false, s),
  };
  let end = rest
    .find(|c: char| !c.is_ascii_digit())
    .unwrap_or(rest.len());
  if end == 0 {
    return None;
  }
  let magnitude: i64 = rest[..end].parse().ok()?;
  Some(if negative { -magnitude } else { magnitude })
}

/// `"true"` (any case) and `"1"` are true; everything else is false.
pub fn parse_flag(s: &str) -> bool {
  s.eq_ignore_ascii_case("true") || s == "1"
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn leading_int() {
    assert_eq!(parse_leading_int("100"), Some(100));
    assert_eq!(parse_leading_int("  -7"), Some(-7));
    assert_eq!(parse_leading_int("+12"), Some(12));
    assert_eq!(parse_leading_int("42px"), Some(42));
    assert_eq!(parse_leading_int("3.9"), Some(3));
    assert_eq!(parse_leading_int("abc"), None);
    assert_eq!(parse_leading_int(""), None);
    assert_eq!(parse_leading_int("-"), None);
  }

  #[test]
  fn flags() {
    assert!(parse_flag("true"));
    assert!(parse_flag("TRUE"));
    assert!(parse_flag("1"));
    assert!(!parse_flag("yes"));
    assert!(!parse_flag("0"));
    assert!(!parse_flag(""));
  }
}
