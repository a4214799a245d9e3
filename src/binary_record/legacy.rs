use super::{BinaryRecord, Slot};
use crate::config::RecordConfig;
use crate::error::RecordError;
use crate::value::Value;
use flexbuffers::{FlexBufferType, Reader};
use smol_str::SmolStr;
use tracing::debug;

// ════════════════════════════════════════════════════════════════════════
// FlexBuffers import
// ════════════════════════════════════════════════════════════════════════
//
// Buffers persisted by earlier pipeline versions are FlexBuffers maps.
// They are read once and re-encoded in the native layout on the next regen.

/// Value of one FlexBuffers map entry. Bool always reads as Null (the
/// encoding used for nulls); types with no `Value` counterpart read as Null.
fn value_of(reader: &Reader<&[u8]>) -> Value {
    match reader.flexbuffer_type() {
        FlexBufferType::Int | FlexBufferType::IndirectInt => Value::Int(reader.as_i64()),
        FlexBufferType::Float | FlexBufferType::IndirectFloat => Value::Float(reader.as_f64()),
        FlexBufferType::String => Value::Str(SmolStr::new(reader.as_str())),
        FlexBufferType::Blob => Value::Blob(reader.as_blob().0.to_vec()),
        _ => Value::Null,
    }
}

impl BinaryRecord {
    /// Import a FlexBuffers map written by an earlier pipeline version.
    ///
    /// Attributes come in the map's key order (FlexBuffers sorts keys). The
    /// record holds no buffer afterwards; `raw_bytes` produces the native
    /// encoding.
    pub fn from_flexbuffer(bytes: &[u8]) -> Result<Self, RecordError> {
        Self::from_flexbuffer_with_config(bytes, RecordConfig::default())
    }

    pub fn from_flexbuffer_with_config(bytes: &[u8], config: RecordConfig) -> Result<Self, RecordError> {
        let map = Reader::get_root(bytes)
            .and_then(|root| root.get_map())
            .map_err(RecordError::FlexBuffer)?;
        if map.len() > config.max_attributes {
            return Err(RecordError::TooManyAttributes {
                limit: config.max_attributes,
            });
        }

        let mut record = Self::with_config(config);
        for (key, value) in map.iter_keys().zip(map.iter_values()) {
            record.cache.put(SmolStr::new(key), Slot::Ready(value_of(&value)));
        }
        debug!(attributes = record.cache.len(), bytes = bytes.len(), "imported FlexBuffers map");
        Ok(record)
    }
}
