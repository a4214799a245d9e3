use serde::ser::{Serialize, Serializer};
use smol_str::{SmolStr, format_smolstr};
use std::fmt::Display;

// ─── Value ──────────────────────────────────────────────────────────────────

/// A decoded attribute value.
///
/// The variant is fixed where the value is produced (see the `From` impls),
/// so encoding never inspects runtime types. Anything without a native
/// variant is carried through its string form.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Blob(Vec<u8>),
    Str(SmolStr),
}

impl Value {
    /// Wrap any displayable value as a string attribute.
    pub fn display(value: impl Display) -> Self {
        Value::Str(format_smolstr!("{value}"))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Text form used by `get_as_string`: decimal numbers, blobs read as
    /// UTF-8 (lossy). Null has no text form.
    ///
    /// Floats use the rendering earlier pipeline versions produced: plain
    /// decimal with at least one fractional digit for magnitudes in
    /// `[1e-3, 1e7)`, otherwise `<mantissa>E<exponent>` (`1.0E20`, `2.5E-4`).
    pub fn to_text(&self) -> Option<SmolStr> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(format_smolstr!("{i}")),
            Value::Float(f) => Some(float_text(*f)),
            Value::Blob(b) => Some(SmolStr::new(String::from_utf8_lossy(b))),
            Value::Str(s) => Some(s.clone()),
        }
    }
}

fn float_text(f: f64) -> SmolStr {
    if f.is_nan() {
        return SmolStr::new_static("NaN");
    }
    if f.is_infinite() {
        return SmolStr::new_static(if f > 0.0 { "Infinity" } else { "-Infinity" });
    }
    let magnitude = f.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        // Debug keeps the shortest round-trip digits and a trailing `.0`.
        return format_smolstr!("{f:?}");
    }
    let sci = format!("{f:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) if mantissa.contains('.') => format_smolstr!("{mantissa}E{exp}"),
        Some((mantissa, exp)) => format_smolstr!("{mantissa}.0E{exp}"),
        None => SmolStr::new(sci),
    }
}

// ─── Serialize ──────────────────────────────────────────────────────────────

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Blob(b) => serializer.serialize_bytes(b),
            Value::Str(s) => serializer.serialize_str(s.as_str()),
        }
    }
}

// ─── From impls ─────────────────────────────────────────────────────────────

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Blob(b.to_vec())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(SmolStr::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(SmolStr::from(s))
    }
}

impl From<SmolStr> for Value {
    fn from(s: SmolStr) -> Self {
        Value::Str(s)
    }
}

/// Booleans have no native variant; they travel as `"true"` / `"false"`.
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::display(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ─── From/Into serde_json::Value ────────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.is_u64() {
                    Value::display(n)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(SmolStr::from(s)),
            other => Value::display(other),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(val: Value) -> Self {
        match val {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Blob(b) => serde_json::Value::Array(b.into_iter().map(Into::into).collect()),
            Value::Str(s) => serde_json::Value::String(s.to_string()),
        }
    }
}
