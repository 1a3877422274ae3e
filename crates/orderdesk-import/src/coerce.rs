//! Lenient coercion of export cells into dates, amounts, and quantities.
//!
//! Every function takes an already-trimmed, non-empty cell and returns `None`
//! when the value cannot be interpreted; callers turn that into a
//! [`crate::RowError`] naming the column.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Parse an order timestamp or date and keep only the calendar date.
///
/// Slash dates are read month-first, matching North American storefront
/// exports.
pub(crate) fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Parse a monetary cell such as `"1,234.50"`, `"$12"`, or `"-$3.00"`.
///
/// The value is returned at the scale it was written with.
pub(crate) fn parse_money(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let body = body.strip_prefix('$').unwrap_or(body);

    let cleaned: String = body
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?;

    Some(if negative { -value } else { value })
}

/// Parse a unit price: non-negative and scale-normalized.
pub(crate) fn parse_unit_price(raw: &str) -> Option<Decimal> {
    parse_money(raw)
        .filter(|v| !v.is_sign_negative() || v.is_zero())
        .map(|v| v.abs().normalize())
}

/// Parse a non-negative whole quantity. `"2"` and `"2.0"` are accepted;
/// `"2.5"` and `"-1"` are not.
pub(crate) fn parse_quantity(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(q) = raw.parse::<i32>() {
        return (q >= 0).then_some(q);
    }

    let value = Decimal::from_str(raw).ok()?;
    if !value.fract().is_zero() || value.is_sign_negative() {
        return None;
    }
    value.to_i32()
}
