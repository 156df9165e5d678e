//! Canonical source ids.
//!
//! A dump stores the same primary key as `7`, `'7'` or `7.0` depending on the
//! column type and the tool that wrote it. All spellings collapse to one key
//! here, so a foreign key always resolves to the row it points at.

use crate::parser::ScalarValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalised, non-zero source primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Normalise a textual id. Returns `None` for "no reference": empty text
    /// or any spelling of zero.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(n) = raw.parse::<i64>() {
            return Self::from_int(n);
        }
        if raw.contains('.') && raw.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b'-') {
            if let Ok(f) = raw.parse::<f64>() {
                return Self::from_float(f);
            }
        }
        Some(Self(raw.to_string()))
    }

    pub fn from_int(n: i64) -> Option<Self> {
        if n == 0 {
            None
        } else {
            Some(Self(n.to_string()))
        }
    }

    /// Integral floats become integer ids; NaN, infinities and zero are no
    /// reference.
    pub fn from_float(f: f64) -> Option<Self> {
        if !f.is_finite() || f == 0.0 {
            return None;
        }
        if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            return Self::from_int(f as i64);
        }
        Some(Self(f.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer value, when the id is numeric.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Anything that can name a source row.
pub trait IntoSourceId {
    fn into_source_id(self) -> Option<SourceId>;
}

impl IntoSourceId for SourceId {
    fn into_source_id(self) -> Option<SourceId> {
        Some(self)
    }
}

impl IntoSourceId for &SourceId {
    fn into_source_id(self) -> Option<SourceId> {
        Some(self.clone())
    }
}

impl IntoSourceId for &str {
    fn into_source_id(self) -> Option<SourceId> {
        SourceId::parse(self)
    }
}

impl IntoSourceId for String {
    fn into_source_id(self) -> Option<SourceId> {
        SourceId::parse(&self)
    }
}

impl IntoSourceId for &String {
    fn into_source_id(self) -> Option<SourceId> {
        SourceId::parse(self)
    }
}

impl IntoSourceId for i64 {
    fn into_source_id(self) -> Option<SourceId> {
        SourceId::from_int(self)
    }
}

impl IntoSourceId for i32 {
    fn into_source_id(self) -> Option<SourceId> {
        SourceId::from_int(self.into())
    }
}

impl IntoSourceId for u64 {
    fn into_source_id(self) -> Option<SourceId> {
        match i64::try_from(self) {
            Ok(n) => SourceId::from_int(n),
            Err(_) => Some(SourceId(self.to_string())),
        }
    }
}

impl IntoSourceId for f64 {
    fn into_source_id(self) -> Option<SourceId> {
        SourceId::from_float(self)
    }
}

impl IntoSourceId for &ScalarValue {
    fn into_source_id(self) -> Option<SourceId> {
        match self {
            ScalarValue::Null | ScalarValue::Bool(_) => None,
            ScalarValue::Int(n) => SourceId::from_int(*n),
            ScalarValue::Float(f) => SourceId::from_float(*f),
            ScalarValue::Str(s) => SourceId::parse(s),
        }
    }
}

impl IntoSourceId for ScalarValue {
    fn into_source_id(self) -> Option<SourceId> {
        (&self).into_source_id()
    }
}

impl<T: IntoSourceId> IntoSourceId for Option<T> {
    fn into_source_id(self) -> Option<SourceId> {
        self.and_then(IntoSourceId::into_source_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spellings_collapse() {
        let a = 7i64.into_source_id();
        assert_eq!(a, "7".into_source_id());
        assert_eq!(a, " 7 ".into_source_id());
        assert_eq!(a, 7.0f64.into_source_id());
        assert_eq!(a, "7.0".into_source_id());
        assert_eq!(a, ScalarValue::Str("007".into()).into_source_id());
        assert_eq!(a.unwrap().as_i64(), Some(7));
    }

    #[test]
    fn test_no_reference_values() {
        assert!(0i64.into_source_id().is_none());
        assert!("0".into_source_id().is_none());
        assert!("".into_source_id().is_none());
        assert!("  ".into_source_id().is_none());
        assert!(0.0f64.into_source_id().is_none());
        assert!(f64::NAN.into_source_id().is_none());
        assert!(ScalarValue::Null.into_source_id().is_none());
        assert!(ScalarValue::Bool(true).into_source_id().is_none());
        assert!(None::<i64>.into_source_id().is_none());
    }

    #[test]
    fn test_text_ids_kept() {
        let id = "abc-123".into_source_id().unwrap();
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(id.as_i64(), None);
    }

    #[test]
    fn test_large_unsigned() {
        let id = u64::MAX.into_source_id().unwrap();
        assert_eq!(id.as_str(), "18446744073709551615");
    }
}
