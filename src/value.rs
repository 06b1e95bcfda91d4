//! Primitive field values and their text encoding.

use nalgebra::{Vector3, Vector4};

/// The primitive types a field can be decoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// A floating point number.
    Float,
    /// Free text.
    Text,
    /// Three space-separated numbers.
    Vector3,
    /// Four space-separated numbers.
    Vector4,
    /// An RGBA colour; three components get an alpha of 1.
    Rgba,
}

/// A decoded primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A floating point number.
    Float(f64),
    /// Free text.
    Text(String),
    /// A 3-vector.
    Vector3(Vector3<f64>),
    /// A 4-vector.
    Vector4(Vector4<f64>),
}

impl Primitive {
    /// Human-readable type name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Text => "text",
            Self::Vector3 => "vector3",
            Self::Vector4 => "vector4",
            Self::Rgba => "rgba",
        }
    }

    /// Decode raw text as this primitive.
    ///
    /// # Errors
    ///
    /// Returns a message describing why the text is not a valid value.
    pub fn parse(self, raw: &str) -> std::result::Result<Value, String> {
        match self {
            Self::Float => parse_float(raw).map(Value::Float),
            Self::Text => Ok(Value::Text(raw.to_string())),
            Self::Vector3 => {
                let v = parse_floats(raw, &[3])?;
                Ok(Value::Vector3(Vector3::new(v[0], v[1], v[2])))
            }
            Self::Vector4 => {
                let v = parse_floats(raw, &[4])?;
                Ok(Value::Vector4(Vector4::new(v[0], v[1], v[2], v[3])))
            }
            Self::Rgba => {
                let v = parse_floats(raw, &[3, 4])?;
                let alpha = v.get(3).copied().unwrap_or(1.0);
                Ok(Value::Vector4(Vector4::new(v[0], v[1], v[2], alpha)))
            }
        }
    }
}

impl Value {
    /// Encode the value as XML text.
    #[must_use]
    pub fn to_xml_text(&self) -> String {
        match self {
            Self::Float(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::Vector3(v) => join(v.iter()),
            Self::Vector4(v) => join(v.iter()),
        }
    }
}

fn join<'a>(values: impl Iterator<Item = &'a f64>) -> String {
    values.map(f64::to_string).collect::<Vec<_>>().join(" ")
}

fn parse_float(raw: &str) -> std::result::Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("expected a number, got '{raw}'"))
}

/// Parse space-separated floats, accepting any of the given counts.
fn parse_floats(raw: &str, counts: &[usize]) -> std::result::Result<Vec<f64>, String> {
    let parts = raw
        .split_whitespace()
        .map(parse_float)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if !counts.contains(&parts.len()) {
        return Err(format!(
            "expected {counts:?} values, got {}: '{raw}'",
            parts.len()
        ));
    }
    Ok(parts)
}

/// Conversion between a Rust field type and a [`Value`].
pub trait PrimitiveValue: Sized {
    /// Extract from a decoded value, `None` when the variant does not match.
    fn from_value(value: Value) -> Option<Self>;

    /// Wrap into a value for writing.
    fn into_value(self) -> Value;
}

impl PrimitiveValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl PrimitiveValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl PrimitiveValue for Vector3<f64> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Vector3(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Vector3(self)
    }
}

impl PrimitiveValue for Vector4<f64> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Vector4(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Vector4(self)
    }
}
