//! The binary value domain plus the ambiguous marker.
//!
//! On the wire a value is the JSON number `0` or `1`, or the string `"?"`
//! for the ambiguous marker. The null marker used for stopped and faulty
//! participants is not a `Value`: snapshots model it as `Option::None`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Textual form of [`Value::Ambiguous`].
pub const AMBIGUOUS_MARKER: &str = "?";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WireValue", into = "WireValue")]
pub enum Value {
    Zero,
    One,
    /// No strict majority in a round's proposals; relayed as a vote.
    Ambiguous,
}

impl Value {
    /// Build a definite value from a bit.
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Self::One
        } else {
            Self::Zero
        }
    }

    /// Whether this is one of the two decidable values.
    pub fn is_binary(&self) -> bool {
        !matches!(self, Self::Ambiguous)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Ambiguous => AMBIGUOUS_MARKER,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Value {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Self::Zero),
            "1" => Ok(Self::One),
            AMBIGUOUS_MARKER => Ok(Self::Ambiguous),
            other => Err(TypesError::InvalidValue(other.to_string())),
        }
    }
}

/// JSON representation: a bare bit or the marker string.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Bit(u8),
    Marker(String),
}

impl TryFrom<WireValue> for Value {
    type Error = TypesError;

    fn try_from(wire: WireValue) -> Result<Self, Self::Error> {
        match wire {
            WireValue::Bit(0) => Ok(Self::Zero),
            WireValue::Bit(1) => Ok(Self::One),
            WireValue::Bit(other) => Err(TypesError::InvalidValue(other.to_string())),
            WireValue::Marker(s) if s == AMBIGUOUS_MARKER => Ok(Self::Ambiguous),
            WireValue::Marker(s) => Err(TypesError::InvalidValue(s)),
        }
    }
}

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Zero => WireValue::Bit(0),
            Value::One => WireValue::Bit(1),
            Value::Ambiguous => WireValue::Marker(AMBIGUOUS_MARKER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_bits_as_numbers() {
        assert_eq!(serde_json::to_string(&Value::Zero).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Value::One).unwrap(), "1");
        assert_eq!(serde_json::to_string(&Value::Ambiguous).unwrap(), "\"?\"");
    }

    #[test]
    fn deserializes_wire_forms() {
        assert_eq!(serde_json::from_str::<Value>("0").unwrap(), Value::Zero);
        assert_eq!(serde_json::from_str::<Value>("1").unwrap(), Value::One);
        assert_eq!(serde_json::from_str::<Value>("\"?\"").unwrap(), Value::Ambiguous);
    }

    #[test]
    fn rejects_values_outside_domain() {
        assert!(serde_json::from_str::<Value>("2").is_err());
        assert!(serde_json::from_str::<Value>("\"maybe\"").is_err());
        assert!(serde_json::from_str::<Value>("null").is_err());
    }

    #[test]
    fn parses_from_cli_strings() {
        assert_eq!("1".parse::<Value>().unwrap(), Value::One);
        assert_eq!(" ? ".parse::<Value>().unwrap(), Value::Ambiguous);
        assert_eq!(
            "x".parse::<Value>(),
            Err(TypesError::InvalidValue("x".to_string()))
        );
    }

    #[test]
    fn ambiguous_is_not_binary() {
        assert!(Value::Zero.is_binary());
        assert!(Value::One.is_binary());
        assert!(!Value::Ambiguous.is_binary());
    }
}
