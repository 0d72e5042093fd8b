// crates/iec61850-rs/src/value.rs

//! Scalar attribute values and literal coercion.

use crate::types::{BasicType, DbPos, ValueKind};
use alloc::string::{String, ToString};
use core::fmt;

/// The current value of a scalar data attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

/// A literal that could not be coerced into its declared basic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    pub literal: String,
    pub basic_type: BasicType,
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot coerce '{}' into {}",
            self.literal, self.basic_type
        )
    }
}

impl Value {
    /// Coerces a configuration literal into `basic_type`.
    ///
    /// Booleans accept `true`/`1`/`yes` (any case) as true and everything
    /// else as false. Integer types parse base-10 within their declared
    /// width, float types parse finite decimal floating point, and the remaining
    /// types keep the literal as text. `Dbpos` also accepts its symbolic
    /// names.
    ///
    /// # Errors
    /// Returns a `CoercionError` for non-numeric or out-of-range text on a
    /// numeric type, and for any literal on a structured type.
    pub fn coerce(literal: &str, basic_type: BasicType) -> Result<Value, CoercionError> {
        let text = literal.trim();
        let fail = || CoercionError {
            literal: literal.to_string(),
            basic_type,
        };

        match basic_type.kind() {
            ValueKind::Boolean => Ok(Value::Boolean(
                ["true", "1", "yes"]
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(text)),
            )),
            ValueKind::Signed(bits) => {
                if basic_type == BasicType::Dbpos {
                    if let Some(pos) = DbPos::from_name(text) {
                        return Ok(Value::Int(pos as i64));
                    }
                }
                let v: i64 = text.parse().map_err(|_| fail())?;
                if fits_signed(v, bits) {
                    Ok(Value::Int(v))
                } else {
                    Err(fail())
                }
            }
            ValueKind::Unsigned(bits) => {
                let v: u64 = text.parse().map_err(|_| fail())?;
                if fits_unsigned(v, bits) {
                    Ok(Value::UInt(v))
                } else {
                    Err(fail())
                }
            }
            ValueKind::Float => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Float)
                .ok_or_else(fail),
            ValueKind::Text => Ok(Value::Text(literal.to_string())),
            ValueKind::Structured => Err(fail()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Decodes the value as a double-bit position.
    pub fn as_dbpos(&self) -> Option<DbPos> {
        self.as_i64().and_then(DbPos::from_ordinal)
    }

    /// Generic document form used by the external engine.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::UInt(v) => serde_json::Value::from(*v),
            // NaN and infinities have no JSON form and become null.
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
        }
    }
}

fn fits_signed(v: i64, bits: u8) -> bool {
    if bits >= 64 {
        return true;
    }
    let max = (1i64 << (bits - 1)) - 1;
    let min = -(1i64 << (bits - 1));
    (min..=max).contains(&v)
}

fn fits_unsigned(v: u64, bits: u8) -> bool {
    bits >= 64 || v < (1u64 << bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_boolean_coercion() {
        for t in ["true", "TRUE", "1", "yes", "Yes"] {
            assert_eq!(Value::coerce(t, BasicType::Boolean), Ok(Value::Boolean(true)));
        }
        for f in ["false", "0", "no", "", "on"] {
            assert_eq!(Value::coerce(f, BasicType::Boolean), Ok(Value::Boolean(false)));
        }
    }

    #[test]
    fn test_integer_coercion_respects_width() {
        assert_eq!(Value::coerce("127", BasicType::Int8), Ok(Value::Int(127)));
        assert!(Value::coerce("128", BasicType::Int8).is_err());
        assert_eq!(Value::coerce("-8388608", BasicType::Int24), Ok(Value::Int(-8_388_608)));
        assert_eq!(Value::coerce("65535", BasicType::Int16U), Ok(Value::UInt(65535)));
        assert!(Value::coerce("-1", BasicType::Int32U).is_err());
        assert_eq!(Value::coerce(" 42 ", BasicType::Int32), Ok(Value::Int(42)));
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(Value::coerce("1.5", BasicType::Float32), Ok(Value::Float(1.5)));
        assert_eq!(Value::coerce("-2e3", BasicType::Float64), Ok(Value::Float(-2000.0)));
        for literal in ["NaN", "inf", "-infinity", "1e400"] {
            let err = Value::coerce(literal, BasicType::Float32).unwrap_err();
            assert_eq!(err.literal, literal);
        }
    }

    #[test]
    fn test_coercion_failure_carries_literal() {
        let err = Value::coerce("abc", BasicType::Int32).unwrap_err();
        assert_eq!(err.literal, "abc");
        assert_eq!(err.basic_type, BasicType::Int32);
        assert!(Value::coerce("x", BasicType::Struct).is_err());
    }

    #[test]
    fn test_text_types_pass_through() {
        assert_eq!(
            Value::coerce(" padded ", BasicType::VisString64),
            Ok(Value::Text(" padded ".to_string()))
        );
        assert_eq!(
            Value::coerce("anything", BasicType::Unknown),
            Ok(Value::Text("anything".to_string()))
        );
    }

    #[test]
    fn test_dbpos_literals() {
        let on = Value::coerce("2", BasicType::Dbpos).unwrap();
        assert_eq!(on.as_dbpos(), Some(DbPos::On));
        let off = Value::coerce("off", BasicType::Dbpos).unwrap();
        assert_eq!(off, Value::Int(1));
    }

    #[test]
    fn test_coercion_is_idempotent() {
        let cases = [
            ("yes", BasicType::Boolean),
            ("-17", BasicType::Int16),
            ("4000000000", BasicType::Int32U),
            ("0.1", BasicType::Float32),
            ("3.14159", BasicType::Float64),
            ("on", BasicType::Dbpos),
            ("hello", BasicType::VisString255),
        ];
        for (literal, ty) in cases {
            let first = Value::coerce(literal, ty).unwrap();
            let second = Value::coerce(&first.to_string(), ty).unwrap();
            assert_eq!(first, second, "coercion of {} as {} is not idempotent", literal, ty);
        }
    }

    #[test]
    fn test_json_form() {
        assert_eq!(Value::Int(-3).to_json(), serde_json::json!(-3));
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(Value::Boolean(true).to_json(), serde_json::json!(true));
    }
}
