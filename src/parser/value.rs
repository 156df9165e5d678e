//! SQL literal lexing.
//!
//! Turns one field token isolated by [`super::rows::split_row_into_fields`]
//! into a typed [`ScalarValue`]. Lexing never fails: anything that is not a
//! recognised literal comes back as the raw token text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed scalar as found in a dump row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::Float(x) => write!(f, "{}", x),
            ScalarValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Str(s.to_string())
    }
}

impl From<i64> for ScalarValue {
    fn from(i: i64) -> Self {
        ScalarValue::Int(i)
    }
}

/// Knobs for [`parse_value_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexOptions {
    /// Recognise unquoted `TRUE` / `FALSE` as booleans.
    pub detect_booleans: bool,
}

/// Lex a token with default options (no boolean detection).
pub fn parse_value(token: &str) -> ScalarValue {
    parse_value_with(token, LexOptions::default())
}

/// Lex a single field token into a [`ScalarValue`].
pub fn parse_value_with(token: &str, opts: LexOptions) -> ScalarValue {
    let token = token.trim();

    if token.eq_ignore_ascii_case("NULL") {
        return ScalarValue::Null;
    }

    if let Some(inner) = quoted_body(token) {
        let quote = token.as_bytes()[0] as char;
        return ScalarValue::Str(unescape(inner, quote));
    }

    if is_numeral(token) {
        if token.contains('.') {
            if let Ok(f) = token.parse::<f64>() {
                return ScalarValue::Float(f);
            }
        } else if let Ok(i) = token.parse::<i64>() {
            return ScalarValue::Int(i);
        }
        // Out-of-range integers stay as text rather than losing precision.
        return ScalarValue::Str(token.to_string());
    }

    if opts.detect_booleans {
        if token.eq_ignore_ascii_case("TRUE") {
            return ScalarValue::Bool(true);
        }
        if token.eq_ignore_ascii_case("FALSE") {
            return ScalarValue::Bool(false);
        }
    }

    ScalarValue::Str(token.to_string())
}

/// Return the text between matching outer quotes, if the token is quoted.
fn quoted_body(token: &str) -> Option<&str> {
    let bytes = token.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let first = bytes[0];
    if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

/// Optional leading minus, digits, at most one decimal point, at least one digit.
fn is_numeral(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() {
        return false;
    }

    let mut seen_dot = false;
    let mut seen_digit = false;
    for b in digits.bytes() {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Undo MySQL string escaping inside a quoted literal body.
fn unescape(body: &str, quote: char) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some('Z') => out.push('\x1a'),
                // \', \", \\ and any other escaped character map to themselves
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else if c == quote && chars.peek() == Some(&quote) {
            // SQL-standard doubled quote
            chars.next();
            out.push(quote);
        } else {
            out.push(c);
        }
    }

    out
}
