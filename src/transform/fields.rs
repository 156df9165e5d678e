//! Field extraction and normalisation helpers shared by the builders.
//!
//! Every helper takes a list of candidate column names and uses the first
//! one holding a usable value, since the same field is spelled differently
//! across dump generations (`title` vs `name`, `status` vs `is_active`).

use crate::dump::Row;
use crate::parser::ScalarValue;
use chrono::{NaiveDate, NaiveDateTime, SecondsFormat};

/// First non-empty trimmed text among `columns`. Numbers are rendered.
pub fn text(row: &Row, columns: &[&str]) -> Option<String> {
    columns.iter().find_map(|c| scalar_text(row.value(c)))
}

fn scalar_text(v: &ScalarValue) -> Option<String> {
    match v {
        ScalarValue::Null => None,
        ScalarValue::Str(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        other => Some(other.to_string()),
    }
}

/// Lower-cased, trimmed email address.
pub fn email(row: &Row, columns: &[&str]) -> Option<String> {
    text(row, columns)
        .map(|e| e.to_lowercase())
        .filter(|e| e.contains('@'))
}

/// Integer from an integer, an integral float or a numeric string.
pub fn int(row: &Row, columns: &[&str]) -> Option<i64> {
    columns.iter().find_map(|c| match row.value(c) {
        ScalarValue::Int(n) => Some(*n),
        ScalarValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
        ScalarValue::Str(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        }
        _ => None,
    })
}

/// Monetary amount. Strings may carry thousands separators and a currency
/// symbol (`"$1,250.50"`).
pub fn money(row: &Row, columns: &[&str]) -> Option<f64> {
    columns.iter().find_map(|c| match row.value(c) {
        ScalarValue::Int(n) => Some(*n as f64),
        ScalarValue::Float(f) if f.is_finite() => Some(*f),
        ScalarValue::Str(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|ch| !matches!(ch, ',' | '$' | ' ' | '€' | '£'))
                .collect();
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    })
}

/// Boolean flag from `1/0`, `TRUE/FALSE`, or words like `yes`, `active`.
pub fn flag(row: &Row, columns: &[&str]) -> Option<bool> {
    columns.iter().find_map(|c| match row.value(c) {
        ScalarValue::Bool(b) => Some(*b),
        ScalarValue::Int(n) => Some(*n != 0),
        ScalarValue::Float(f) => Some(*f != 0.0),
        ScalarValue::Str(s) => parse_flag(s),
        ScalarValue::Null => None,
    })
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" | "active" | "enabled" => Some(true),
        "0" | "false" | "no" | "n" | "off" | "inactive" | "disabled" | "banned" | "blocked" => {
            Some(false)
        }
        _ => None,
    }
}

/// Timestamp as RFC 3339 UTC. MySQL zero dates and unparsable text are
/// treated as missing.
pub fn timestamp(row: &Row, columns: &[&str]) -> Option<String> {
    columns.iter().find_map(|c| match row.value(c) {
        ScalarValue::Str(s) => parse_timestamp(s),
        // Unix seconds
        ScalarValue::Int(n) if *n > 0 => chrono::DateTime::from_timestamp(*n, 0)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
        _ => None,
    })
}

pub fn parse_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("0000-00-00") {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some(naive.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// A list stored as a JSON array, or as newline/comma/semicolon separated text.
pub fn list(row: &Row, columns: &[&str]) -> Vec<String> {
    let Some(raw) = text(row, columns) else {
        return Vec::new();
    };
    if raw.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            return items
                .into_iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.trim().to_string()),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
    raw.split(['\n', ',', ';'])
        .map(|s| s.trim().trim_start_matches(['-', '*']).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lower-case keyword for enum-like columns (`"Active "` -> `"active"`).
pub fn keyword(row: &Row, columns: &[&str]) -> Option<String> {
    text(row, columns).map(|s| s.to_ascii_lowercase())
}

/// URL-safe slug of a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut dash = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
            dash = false;
        } else if !dash && !slug.is_empty() {
            slug.push('-');
            dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
