//! Typed values and their byte encodings
//!
//! Every stored value travels with an encoding tag telling the receiver how
//! to read its bytes:
//!
//! | tag | encoding | bytes                         |
//! |-----|----------|-------------------------------|
//! | 0   | string   | UTF-8 text                    |
//! | 1   | array    | JSON array of primitives      |
//! | 2   | number   | decimal text                  |
//! | 3   | json     | JSON object                   |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::{RediError, Result};

/// Encoding discriminant carried next to every value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Encoding {
    String = 0,
    Array = 1,
    Number = 2,
    Json = 3,
}

impl Encoding {
    /// Map a wire tag to an encoding
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::String),
            1 => Some(Self::Array),
            2 => Some(Self::Number),
            3 => Some(Self::Json),
            _ => None,
        }
    }

    /// The wire tag for this encoding
    pub fn tag(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::String => "string",
            Encoding::Array => "array",
            Encoding::Number => "number",
            Encoding::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for Encoding {
    type Err = RediError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" | "0" => Ok(Encoding::String),
            "array" | "1" => Ok(Encoding::Array),
            "number" | "2" => Ok(Encoding::Number),
            "json" | "3" => Ok(Encoding::Json),
            other => Err(RediError::Decode(format!("unknown encoding '{}'", other))),
        }
    }
}

/// An array element: text or a JSON primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Primitive {
    fn to_json(&self) -> JsonValue {
        match self {
            Primitive::Text(s) => JsonValue::String(s.clone()),
            Primitive::Number(n) => number_to_json(*n),
            Primitive::Bool(b) => JsonValue::Bool(*b),
            Primitive::Null => JsonValue::Null,
        }
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Primitive::Text(s.to_string())
    }
}

impl From<f64> for Primitive {
    fn from(n: f64) -> Self {
        Primitive::Number(n)
    }
}

/// A stored value.
///
/// The variant order matters for deserialization: when a value is inferred
/// from JSON text the first matching shape wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Array(Vec<Primitive>),
    Json(Map<String, JsonValue>),
}

impl Value {
    /// The encoding implied by the value's shape
    pub fn encoding(&self) -> Encoding {
        match self {
            Value::String(_) => Encoding::String,
            Value::Array(_) => Encoding::Array,
            Value::Number(_) => Encoding::Number,
            Value::Json(_) => Encoding::Json,
        }
    }

    /// Decode value bytes under a known encoding
    pub fn decode(bytes: &[u8], encoding: Encoding) -> Result<Value> {
        match encoding {
            Encoding::String => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| RediError::Decode(format!("string value: {}", e)))?;
                Ok(Value::String(text.to_string()))
            }
            Encoding::Array => {
                let items: Vec<Primitive> = serde_json::from_slice(bytes)?;
                Ok(Value::Array(items))
            }
            Encoding::Number => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| RediError::Decode(format!("number value: {}", e)))?;
                let n: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| RediError::Decode(format!("'{}' is not a number", text)))?;
                if !n.is_finite() {
                    return Err(RediError::Decode(format!("'{}' is not a finite number", text)));
                }
                Ok(Value::Number(n))
            }
            Encoding::Json => {
                let object: Map<String, JsonValue> = serde_json::from_slice(bytes)?;
                Ok(Value::Json(object))
            }
        }
    }

    /// Decode value bytes under a raw wire tag
    pub fn decode_tagged(bytes: &[u8], tag: u32) -> Result<Value> {
        let encoding = Encoding::from_tag(tag)
            .ok_or_else(|| RediError::Decode(format!("unknown encoding tag {}", tag)))?;
        Self::decode(bytes, encoding)
    }

    /// Serialize to bytes plus the tag they must be read back with
    pub fn encode(&self) -> (Vec<u8>, Encoding) {
        let bytes = match self {
            Value::String(s) => s.as_bytes().to_vec(),
            Value::Number(n) => n.to_string().into_bytes(),
            Value::Array(_) | Value::Json(_) => self.to_json().to_string().into_bytes(),
        };
        (bytes, self.encoding())
    }

    /// Infer a value from free-form text.
    ///
    /// JSON text is read by shape (string, number, array, object); anything
    /// else is kept as raw text.
    pub fn infer(text: &str) -> Value {
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    }

    /// JSON view of the value
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Number(n) => number_to_json(*n),
            Value::Array(items) => JsonValue::Array(items.iter().map(Primitive::to_json).collect()),
            Value::Json(object) => JsonValue::Object(object.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<Primitive>> for Value {
    fn from(items: Vec<Primitive>) -> Self {
        Value::Array(items)
    }
}

/// Largest magnitude below which every whole f64 is an exact integer (2^53)
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole numbers render without a fraction, as tag 2 text does.
/// Non-finite numbers have no JSON form.
fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        return JsonValue::from(n as i64);
    }
    Number::from_f64(n).map(JsonValue::Number).unwrap_or(JsonValue::Null)
}

