// Lossless numeric value carried through snapshot documents
use serde::Serialize;
use serde_json::Number;
use std::fmt;

/// A finite JSON number that re-encodes exactly as it was read.
///
/// Integer literals stay integers and floats keep their shortest
/// round-tripping representation, so statistics are never re-encoded lossily.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Measure(Number);

impl Measure {
    /// Returns `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Number::from_f64(value).map(Self)
    }

    pub fn from_number(number: Number) -> Option<Self> {
        match number.as_f64() {
            Some(value) if value.is_finite() => Some(Self(number)),
            _ => None,
        }
    }

    pub fn value(&self) -> f64 {
        self.0.as_f64().unwrap_or(f64::NAN)
    }

    pub fn as_number(&self) -> &Number {
        &self.0
    }
}

impl From<u64> for Measure {
    fn from(value: u64) -> Self {
        Self(Number::from(value))
    }
}

impl From<i64> for Measure {
    fn from(value: i64) -> Self {
        Self(Number::from(value))
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_literal_stays_integer() {
        let measure = Measure::from(5u64);
        assert_eq!(serde_json::to_value(&measure).unwrap(), json!(5));
        assert_eq!(measure.value(), 5.0);
        assert!(measure.as_number().is_u64());
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(Measure::from_f64(f64::NAN).is_none());
        assert!(Measure::from_f64(f64::INFINITY).is_none());
        assert_eq!(Measure::from_f64(0.4187).unwrap().to_string(), "0.4187");
    }
}
