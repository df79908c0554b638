//! Field parsers for the raw CSV text. Every function is total: malformed input
//! becomes `None` (or `false` for the nonprofit flag), never an error.

/// `MM/DD/YYYY` to `YYYY-MM-DD`, zero-padding month and day to two digits.
///
/// Only the shape is checked, not the calendar, so `13/99/2020` becomes
/// `2020-13-99`.
pub fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parts: Vec<&str> = raw.split('/').collect();
    let [month, day, year] = parts.as_slice() else {
        return None;
    };
    if ![month, day, year].iter().all(|p| is_digits(p)) {
        return None;
    }

    Some(format!("{year}-{month:0>2}-{day:0>2}"))
}

/// Decimal amount with thousands separators, e.g. `1,234.50`.
pub fn parse_float(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    parse_number(&cleaned)
}

/// Integer count. The text is read as a decimal first and truncated, so `12.0`
/// is 12 while `12abc` has no value.
pub fn parse_int(raw: &str) -> Option<i64> {
    let value = parse_number(raw)?.trunc();
    if value < i64::MIN as f64 || value > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

/// `Y` in any case marks the borrower as a nonprofit.
pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("Y")
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
