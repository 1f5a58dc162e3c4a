//! Conversion functions for on-demand typing of text fields
//!
//! A conversion function maps a raw field to `Some(value)`, or to `None` when
//! the field cannot be converted (e.g. `Unknown`, `NULL`, an empty cell).
//! `None` is a routine outcome: numeric operations route such rows into the
//! non-numeric partition instead of failing.

use chrono::{Datelike, NaiveDate};
use std::hash::{Hash, Hasher};

/// Parse a finite floating-point number
pub fn to_float(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a number and truncate it toward zero
pub fn to_int(field: &str) -> Option<i64> {
    to_float(field).map(|v| v.trunc() as i64)
}

/// Keep the field as text; never fails
pub fn as_text(field: &str) -> Option<String> {
    Some(field.to_string())
}

/// Convert an 8-digit `yyyymmdd` date into a day count (days since 0001-01-01)
pub fn yyyymmdd_to_days(field: &str) -> Option<i64> {
    let field = field.trim();
    if field.len() != 8 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(field, "%Y%m%d")
        .ok()
        .map(|date| i64::from(date.num_days_from_ce()))
}

/// Render a number the way values are written back into a table.
///
/// Values are rounded to 12 significant digits, so floating-point noise from
/// interpolation does not leak into the file, and integral values keep a
/// trailing `.0`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded: f64 = format!("{:.11e}", value).parse().unwrap_or(value);
    format!("{:?}", rounded)
}

/// An `f64` usable as an exact-match map key.
///
/// Equality is bitwise, which is what lookups need when the same text is
/// converted on both sides.
#[derive(Debug, Clone, Copy)]
pub struct FloatKey(pub f64);

impl FloatKey {
    pub fn new(value: f64) -> Self {
        // fold -0.0 into 0.0
        Self(if value == 0.0 { 0.0 } else { value })
    }
}

impl PartialEq for FloatKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatKey {}

impl Hash for FloatKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}
