use super::types::*;
use super::value::Value;
use smol_str::SmolStr;

// ─── Decode Field ───────────────────────────────────────────────────────────

/// Decode a raw field reference into a [`Value`].
///
/// The bool tag always yields `Null`, whatever its payload byte. Integers
/// come back as `i64` and floats as `f64`. Strings are decoded lossily, so a
/// buffer with mangled text still yields a value rather than an error.
/// Returns `None` for an unknown tag or a fixed-width payload of the wrong
/// size; [`RecordView::from_bytes`](crate::view::RecordView::from_bytes)
/// rejects both up front.
#[inline]
pub fn decode_field(field: FieldRef<'_>) -> Option<Value> {
    Some(match field.type_tag {
        TAG_BOOL => Value::Null,
        TAG_INT => {
            let bytes: [u8; 8] = field.data.try_into().ok()?;
            Value::Int(i64::from_le_bytes(bytes))
        }
        TAG_FLOAT => {
            let bytes: [u8; 8] = field.data.try_into().ok()?;
            Value::Float(f64::from_le_bytes(bytes))
        }
        TAG_STR => Value::Str(SmolStr::new(String::from_utf8_lossy(field.data))),
        TAG_BLOB => Value::Blob(field.data.to_vec()),
        _ => return None,
    })
}
