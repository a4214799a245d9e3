use super::attribute_map::AttributeMap;
use super::config::RecordConfig;
use super::error::RecordError;
use super::types::*;
use super::value::Value;
use rustc_hash::FxHashSet;
use std::borrow::Cow;
use xxhash_rust::xxh64::xxh64;

// ─── Writer ─────────────────────────────────────────────────────────────────

/// Append a single value's payload to `buf` and return its type tag.
///
/// Null is written as `bool(false)`; readers decode that tag back to Null.
#[inline]
pub fn write_field_into(buf: &mut Vec<u8>, value: &Value) -> u8 {
    match value {
        Value::Null => {
            buf.push(0);
            TAG_BOOL
        }
        Value::Int(i) => {
            buf.extend_from_slice(&i.to_le_bytes());
            TAG_INT
        }
        Value::Float(f) => {
            buf.extend_from_slice(&f.to_le_bytes());
            TAG_FLOAT
        }
        Value::Blob(b) => {
            buf.extend_from_slice(b);
            TAG_BLOB
        }
        Value::Str(s) => {
            buf.extend_from_slice(s.as_bytes());
            TAG_STR
        }
    }
}

#[inline]
fn to_u32(n: usize, total: usize) -> Result<[u8; 4], RecordError> {
    u32::try_from(n)
        .map(u32::to_le_bytes)
        .map_err(|_| RecordError::RecordTooLarge(total))
}

fn write_index_entry(
    buf: &mut [u8],
    i: usize,
    name_hash: u64,
    key: (usize, usize),
    data: (usize, usize),
    tag: u8,
) -> Result<(), RecordError> {
    let total = buf.len();
    let idx = HEADER_SIZE + i * INDEX_ENTRY_SIZE;
    let entry = &mut buf[idx..idx + INDEX_ENTRY_SIZE];
    entry[0..ENTRY_KEY_OFFSET].copy_from_slice(&name_hash.to_le_bytes());
    entry[ENTRY_KEY_OFFSET..ENTRY_KEY_LEN].copy_from_slice(&to_u32(key.0, total)?);
    entry[ENTRY_KEY_LEN..ENTRY_DATA_OFFSET].copy_from_slice(&to_u32(key.1, total)?);
    entry[ENTRY_DATA_OFFSET..ENTRY_DATA_LEN].copy_from_slice(&to_u32(data.0, total)?);
    entry[ENTRY_DATA_LEN..ENTRY_TAG].copy_from_slice(&to_u32(data.1, total)?);
    entry[ENTRY_TAG] = tag;
    Ok(())
}

/// Encode ordered `(name, value)` pairs into `buf`, replacing its contents.
///
/// Reuses the caller's Vec so that encoding many records in sequence does
/// not allocate per record. Pairs are written in the order given; a repeated
/// name fails with `DuplicateAttribute` before `buf` is touched.
pub fn serialize_into<'k, 'v, I>(
    entries: I,
    buf: &mut Vec<u8>,
    config: &RecordConfig,
) -> Result<usize, RecordError>
where
    I: IntoIterator<Item = (&'k str, Cow<'v, Value>)>,
{
    let entries: Vec<(&'k str, Cow<'v, Value>)> = entries.into_iter().collect();
    let field_count = entries.len();
    if field_count > config.max_attributes {
        return Err(RecordError::TooManyAttributes {
            limit: config.max_attributes,
        });
    }
    let mut seen = FxHashSet::default();
    seen.reserve(field_count);
    if let Some((dup, _)) = entries.iter().find(|(k, _)| !seen.insert(*k)) {
        return Err(RecordError::DuplicateAttribute((*dup).into()));
    }
    let header_count = to_u32(field_count, field_count)?;

    let data_start = HEADER_SIZE + field_count * INDEX_ENTRY_SIZE;
    let key_bytes: usize = entries.iter().map(|(k, _)| k.len()).sum();

    buf.clear();
    buf.reserve(data_start + key_bytes + field_count * config.bytes_per_attribute_hint);
    // Zero-filled header/index area, written by position below.
    buf.resize(data_start, 0);
    buf[0..4].copy_from_slice(&header_count);
    buf[VERSION_OFFSET] = FORMAT_VERSION;

    // Keys first, so the index vector of names sits in one block.
    let mut key_spans = Vec::with_capacity(field_count);
    for (key, _) in &entries {
        key_spans.push((buf.len(), key.len()));
        buf.extend_from_slice(key.as_bytes());
    }

    for (i, ((key, value), key_span)) in entries.iter().zip(key_spans).enumerate() {
        let data_offset = buf.len();
        let tag = write_field_into(buf, value);
        let data_len = buf.len() - data_offset;
        let hash = xxh64(key.as_bytes(), 0);
        write_index_entry(buf, i, hash, key_span, (data_offset, data_len), tag)?;
    }

    // Offsets are checked per entry; the tail end must fit as well.
    to_u32(buf.len(), buf.len())?;
    Ok(field_count)
}

/// Encode ordered `(name, value)` pairs into a fresh buffer.
pub fn serialize<'k, 'v, I>(entries: I, config: &RecordConfig) -> Result<Vec<u8>, RecordError>
where
    I: IntoIterator<Item = (&'k str, Cow<'v, Value>)>,
{
    let mut buf = Vec::new();
    serialize_into(entries, &mut buf, config)?;
    Ok(buf)
}

/// Encode a fully materialized map.
pub fn serialize_map(map: &AttributeMap<Value>, config: &RecordConfig) -> Result<Vec<u8>, RecordError> {
    serialize(map.iter().map(|(k, v)| (k.as_str(), Cow::Borrowed(v))), config)
}
