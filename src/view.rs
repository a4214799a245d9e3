use super::deserialization::decode_field;
use super::error::RecordError;
use super::types::*;
use super::value::Value;
use rustc_hash::FxHashSet;
use xxhash_rust::xxh64::xxh64;

#[inline]
fn read_u32(buf: &[u8], at: usize) -> Option<usize> {
    let bytes: [u8; 4] = buf.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes) as usize)
}

#[inline]
fn read_u64(buf: &[u8], at: usize) -> Option<u64> {
    let bytes: [u8; 8] = buf.get(at..at + 8)?.try_into().ok()?;
    Some(u64::from_le_bytes(bytes))
}

// ─── Reader (zero-copy) ────────────────────────────────────────────────────
/// Zero-copy reader over an encoded record.
/// No value is decoded until you request a specific field.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    pub data_buf: &'a [u8],
    pub field_count: usize,
}

impl<'a> RecordView<'a> {
    /// Wrap a buffer that has already been validated by [`Self::from_bytes`].
    #[inline]
    pub fn new(data_buf: &'a [u8], field_count: usize) -> Self {
        debug_assert_eq!(
            read_u32(data_buf, 0),
            Some(field_count),
            "RecordView::new: caller field_count {field_count} != header"
        );
        Self {
            data_buf,
            field_count,
        }
    }

    /// Validate a byte slice and build a view over it.
    ///
    /// Checks the header, format version, every index entry's key and data
    /// bounds, key UTF-8 and hash, key uniqueness, type tags, and fixed
    /// payload widths. After
    /// this, lookups never need to fail on structure.
    pub fn from_bytes(buf: &'a [u8]) -> Result<Self, RecordError> {
        if buf.len() < HEADER_SIZE {
            return Err(RecordError::InvalidBuffer("shorter than the header"));
        }
        let version = buf[VERSION_OFFSET];
        if version != FORMAT_VERSION {
            return Err(RecordError::UnsupportedVersion(version));
        }
        let field_count =
            read_u32(buf, 0).ok_or(RecordError::InvalidBuffer("unreadable field count"))?;
        let min_size = field_count
            .checked_mul(INDEX_ENTRY_SIZE)
            .and_then(|index| index.checked_add(HEADER_SIZE))
            .ok_or(RecordError::InvalidBuffer("index size overflows"))?;
        if buf.len() < min_size {
            return Err(RecordError::InvalidBuffer("index extends past the buffer"));
        }

        let view = Self {
            data_buf: buf,
            field_count,
        };
        let mut seen = FxHashSet::default();
        seen.reserve(field_count);
        for i in 0..field_count {
            let entry = view
                .read_index(i)
                .ok_or(RecordError::InvalidBuffer("unreadable index entry"))?;
            view.validate_entry(&entry)?;
            let key = view
                .key_of(&entry)
                .ok_or(RecordError::InvalidBuffer("key out of bounds"))?;
            if !seen.insert(key) {
                return Err(RecordError::DuplicateAttribute(key.into()));
            }
        }
        Ok(view)
    }

    fn validate_entry(&self, entry: &IndexEntry) -> Result<(), RecordError> {
        let key = entry
            .key_range()
            .and_then(|r| self.data_buf.get(r))
            .ok_or(RecordError::InvalidBuffer("key out of bounds"))?;
        if std::str::from_utf8(key).is_err() {
            return Err(RecordError::InvalidBuffer("key is not valid UTF-8"));
        }
        if xxh64(key, 0) != entry.name_hash {
            return Err(RecordError::InvalidBuffer("key does not match its hash"));
        }
        entry
            .data_range()
            .and_then(|r| self.data_buf.get(r))
            .ok_or(RecordError::InvalidBuffer("payload out of bounds"))?;

        match (entry.type_tag, entry.data_len) {
            (TAG_BOOL, 1) | (TAG_INT, 8) | (TAG_FLOAT, 8) | (TAG_STR, _) | (TAG_BLOB, _) => Ok(()),
            (TAG_BOOL | TAG_INT | TAG_FLOAT, _) => {
                Err(RecordError::InvalidBuffer("fixed-width payload has the wrong length"))
            }
            (tag, _) => Err(RecordError::UnknownTypeTag(tag)),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Internal: index access
    // ════════════════════════════════════════════════════════════════════════

    /// Read the index entry metadata at position `i`.
    #[inline]
    pub fn read_index(&self, i: usize) -> Option<IndexEntry> {
        if i >= self.field_count {
            return None;
        }
        let idx = HEADER_SIZE + i * INDEX_ENTRY_SIZE;
        Some(IndexEntry {
            name_hash: read_u64(self.data_buf, idx)?,
            key_offset: read_u32(self.data_buf, idx + ENTRY_KEY_OFFSET)?,
            key_len: read_u32(self.data_buf, idx + ENTRY_KEY_LEN)?,
            data_offset: read_u32(self.data_buf, idx + ENTRY_DATA_OFFSET)?,
            data_len: read_u32(self.data_buf, idx + ENTRY_DATA_LEN)?,
            type_tag: *self.data_buf.get(idx + ENTRY_TAG)?,
        })
    }

    #[inline]
    fn key_of(&self, entry: &IndexEntry) -> Option<&'a str> {
        let bytes = self.data_buf.get(entry.key_range()?)?;
        std::str::from_utf8(bytes).ok()
    }

    /// Attribute name at index position `i`.
    #[inline]
    pub fn key_at(&self, i: usize) -> Option<&'a str> {
        self.key_of(&self.read_index(i)?)
    }

    /// Raw field at index position `i`.
    pub fn field_at(&self, i: usize) -> Option<FieldRef<'a>> {
        let entry = self.read_index(i)?;
        Some(FieldRef {
            name: self.key_of(&entry)?,
            type_tag: entry.type_tag,
            data: self.data_buf.get(entry.data_range()?)?,
        })
    }

    /// Find a field by name. Returns (index_position, IndexEntry).
    ///
    /// Linear scan in insertion order, comparing the name hash before the
    /// key bytes. A miss is reported, never read past the index.
    pub fn find_field(&self, name: &str) -> Result<(usize, IndexEntry), RecordError> {
        let hash = xxh64(name.as_bytes(), 0);
        for i in 0..self.field_count {
            let entry = self.read_index(i).ok_or(RecordError::InvalidBuffer("unreadable index entry"))?;
            if entry.name_hash == hash && self.key_of(&entry) == Some(name) {
                return Ok((i, entry));
            }
        }
        Err(RecordError::AttributeNotFound(name.into()))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Read access
    // ════════════════════════════════════════════════════════════════════════

    /// Get raw field reference (zero-copy).
    pub fn get_raw(&self, name: &str) -> Option<FieldRef<'a>> {
        let (pos, _) = self.find_field(name).ok()?;
        self.field_at(pos)
    }

    /// Decode any field into a [`Value`].
    pub fn get_field(&self, name: &str) -> Option<Value> {
        decode_field(self.get_raw(name)?)
    }

    #[inline]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        let field = self.get_raw(name)?;
        if field.type_tag != TAG_INT {
            return None;
        }
        Some(i64::from_le_bytes(field.data.try_into().ok()?))
    }

    #[inline]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        let field = self.get_raw(name)?;
        if field.type_tag != TAG_FLOAT {
            return None;
        }
        Some(f64::from_le_bytes(field.data.try_into().ok()?))
    }

    /// Get a string field (zero-copy). `None` if the payload is not UTF-8.
    #[inline]
    pub fn get_str(&self, name: &str) -> Option<&'a str> {
        let field = self.get_raw(name)?;
        if field.type_tag != TAG_STR {
            return None;
        }
        std::str::from_utf8(field.data).ok()
    }

    /// Get a blob field (zero-copy).
    #[inline]
    pub fn get_blob(&self, name: &str) -> Option<&'a [u8]> {
        let field = self.get_raw(name)?;
        (field.type_tag == TAG_BLOB).then_some(field.data)
    }

    #[inline]
    pub fn has_field(&self, name: &str) -> bool {
        self.find_field(name).is_ok()
    }

    #[inline]
    pub fn field_type(&self, name: &str) -> Option<u8> {
        self.find_field(name).ok().map(|(_, e)| e.type_tag)
    }

    /// Iterate over all raw fields in index order (zero-copy).
    #[inline]
    pub fn iter_fields(&self) -> FieldIter<'a> {
        FieldIter {
            record: *self,
            pos: 0,
        }
    }

    /// Iterate over attribute names in index order.
    #[inline]
    pub fn keys(&self) -> KeyIter<'a> {
        KeyIter {
            record: *self,
            pos: 0,
        }
    }

    /// Decode every field into a JSON object. Key order follows serde_json's
    /// map, not the record's.
    pub fn to_json(&self) -> serde_json::Value {
        self.iter_fields()
            .map(|field| {
                let value = decode_field(field).unwrap_or_default();
                (field.name.to_string(), serde_json::Value::from(value))
            })
            .collect::<serde_json::Map<_, _>>()
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordConfig;
    use crate::serialization::{serialize, serialize_into};
    use std::borrow::Cow;

    fn encode(pairs: &[(&'static str, Value)]) -> Vec<u8> {
        serialize(
            pairs.iter().map(|(k, v)| (*k, Cow::Borrowed(v))),
            &RecordConfig::default(),
        )
        .unwrap()
    }

    fn make_test_record() -> Vec<u8> {
        encode(&[
            ("id", Value::from("user:123")),
            ("age", Value::from(30i64)),
            ("score", Value::from(99.5f64)),
            ("avatar", Value::from(vec![1u8, 2, 3])),
            ("deleted", Value::Null),
        ])
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Basic reads
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_typed_getters() {
        let buf = make_test_record();
        let view = RecordView::from_bytes(&buf).unwrap();

        assert_eq!(view.field_count, 5);
        assert_eq!(view.get_str("id"), Some("user:123"));
        assert_eq!(view.get_i64("age"), Some(30));
        assert_eq!(view.get_f64("score"), Some(99.5));
        assert_eq!(view.get_blob("avatar"), Some(&[1u8, 2, 3][..]));
        assert_eq!(view.field_type("deleted"), Some(TAG_BOOL));
    }

    #[test]
    fn test_type_mismatch_returns_none() {
        let buf = make_test_record();
        let view = RecordView::from_bytes(&buf).unwrap();

        assert!(view.get_str("age").is_none());
        assert!(view.get_i64("score").is_none());
        assert!(view.get_f64("id").is_none());
        assert!(view.get_blob("id").is_none());
    }

    #[test]
    fn test_null_decodes_from_bool_tag() {
        let buf = make_test_record();
        let view = RecordView::from_bytes(&buf).unwrap();

        let raw = view.get_raw("deleted").unwrap();
        assert_eq!(raw.type_tag, TAG_BOOL);
        assert_eq!(raw.data, &[0u8]);
        assert_eq!(view.get_field("deleted"), Some(Value::Null));
    }

    #[test]
    fn test_keys_in_insertion_order() {
        let buf = make_test_record();
        let view = RecordView::from_bytes(&buf).unwrap();
        let keys: Vec<_> = view.keys().collect();
        assert_eq!(keys, vec!["id", "age", "score", "avatar", "deleted"]);
        assert_eq!(view.keys().len(), 5);
    }

    #[test]
    fn test_iter_fields() {
        let buf = make_test_record();
        let view = RecordView::from_bytes(&buf).unwrap();
        let tags: Vec<_> = view.iter_fields().map(|f| f.type_tag).collect();
        assert_eq!(tags, vec![TAG_STR, TAG_INT, TAG_FLOAT, TAG_BLOB, TAG_BOOL]);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Decode-miss
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_missing_field() {
        let buf = make_test_record();
        let view = RecordView::from_bytes(&buf).unwrap();

        assert!(view.get_raw("nonexistent").is_none());
        assert!(view.get_field("nonexistent").is_none());
        assert!(!view.has_field("nonexistent"));
        assert!(view.field_type("nonexistent").is_none());
        assert!(matches!(
            view.find_field("nonexistent"),
            Err(RecordError::AttributeNotFound(name)) if name == "nonexistent"
        ));
    }

    #[test]
    fn test_read_index_out_of_bounds() {
        let buf = make_test_record();
        let view = RecordView::from_bytes(&buf).unwrap();
        assert!(view.read_index(5).is_none());
        assert!(view.key_at(5).is_none());
        assert!(view.field_at(5).is_none());
    }

    #[test]
    fn test_empty_record() {
        let buf = encode(&[]);
        assert_eq!(buf.len(), HEADER_SIZE);
        let view = RecordView::from_bytes(&buf).unwrap();
        assert_eq!(view.field_count, 0);
        assert!(view.get_field("").is_none());
        assert_eq!(view.iter_fields().count(), 0);
    }

    #[test]
    fn test_empty_name_is_a_valid_key() {
        let buf = encode(&[("", Value::from(vec![1u8, 2, 3]))]);
        let view = RecordView::from_bytes(&buf).unwrap();
        assert_eq!(view.get_blob(""), Some(&[1u8, 2, 3][..]));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_from_bytes_too_short() {
        assert!(matches!(
            RecordView::from_bytes(&[1, 0, 0]),
            Err(RecordError::InvalidBuffer(_))
        ));
        assert!(RecordView::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_from_bytes_wrong_version() {
        let mut buf = make_test_record();
        buf[VERSION_OFFSET] = 9;
        assert!(matches!(
            RecordView::from_bytes(&buf),
            Err(RecordError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_from_bytes_claims_fields_but_too_short() {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&3u32.to_le_bytes());
        buf[VERSION_OFFSET] = FORMAT_VERSION;
        assert!(matches!(
            RecordView::from_bytes(&buf),
            Err(RecordError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn test_from_bytes_unknown_tag() {
        let mut buf = encode(&[("s", Value::from("x"))]);
        buf[HEADER_SIZE + ENTRY_TAG] = 42;
        assert!(matches!(
            RecordView::from_bytes(&buf),
            Err(RecordError::UnknownTypeTag(42))
        ));
    }

    #[test]
    fn test_from_bytes_payload_out_of_bounds() {
        let mut buf = encode(&[("s", Value::from("x"))]);
        let idx = HEADER_SIZE + ENTRY_DATA_LEN;
        buf[idx..idx + 4].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            RecordView::from_bytes(&buf),
            Err(RecordError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn test_from_bytes_bad_int_width() {
        let mut buf = encode(&[("s", Value::from("abcd"))]);
        buf[HEADER_SIZE + ENTRY_TAG] = TAG_INT;
        assert!(matches!(
            RecordView::from_bytes(&buf),
            Err(RecordError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn test_from_bytes_hash_mismatch() {
        let mut buf = encode(&[("name", Value::from(1i64))]);
        buf[HEADER_SIZE] ^= 0xff;
        assert!(RecordView::from_bytes(&buf).is_err());
    }

    #[test]
    fn test_mangled_string_decodes_lossily() {
        let mut buf = encode(&[("s", Value::from("ab"))]);
        let last = buf.len() - 1;
        buf[last] = 0xff;
        let view = RecordView::from_bytes(&buf).unwrap();
        assert!(view.get_str("s").is_none());
        assert_eq!(view.get_field("s"), Some(Value::from("a\u{fffd}")));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Encoder
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_encode_is_deterministic() {
        assert_eq!(make_test_record(), make_test_record());
    }

    #[test]
    fn test_encode_is_order_sensitive() {
        let a = encode(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        let b = encode(&[("b", Value::Int(2)), ("a", Value::Int(1))]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_serialize_into_reuses_buffer() {
        let config = RecordConfig::default();
        let mut buf = Vec::new();
        let one = [("a", Value::from("first"))];
        serialize_into(one.iter().map(|(k, v)| (*k, Cow::Borrowed(v))), &mut buf, &config).unwrap();
        let cap = buf.capacity();

        let two = [("b", Value::Int(2))];
        let n = serialize_into(two.iter().map(|(k, v)| (*k, Cow::Borrowed(v))), &mut buf, &config)
            .unwrap();
        assert_eq!(n, 1);
        assert!(buf.capacity() >= cap);
        let view = RecordView::from_bytes(&buf).unwrap();
        assert_eq!(view.get_i64("b"), Some(2));
        assert!(!view.has_field("a"));
    }

    #[test]
    fn test_too_many_attributes() {
        let config = RecordConfig {
            max_attributes: 2,
            ..RecordConfig::default()
        };
        let values = [Value::Int(1), Value::Int(2), Value::Int(3)];
        let names = ["a", "b", "c"];
        let result = serialize(
            names.iter().copied().zip(values.iter().map(Cow::Borrowed)),
            &config,
        );
        assert!(matches!(
            result,
            Err(RecordError::TooManyAttributes { limit: 2 })
        ));
    }

    #[test]
    fn test_from_bytes_rejects_duplicate_names() {
        let mut buf = encode(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        // Rename the second key to "a", hash included.
        let second_key = HEADER_SIZE + 2 * INDEX_ENTRY_SIZE + 1;
        buf[second_key] = b'a';
        let second_entry = HEADER_SIZE + INDEX_ENTRY_SIZE;
        buf[second_entry..second_entry + 8].copy_from_slice(&xxh64(b"a", 0).to_le_bytes());

        assert!(matches!(
            RecordView::from_bytes(&buf),
            Err(RecordError::DuplicateAttribute(name)) if name == "a"
        ));
    }

    #[test]
    fn test_serialize_rejects_duplicate_names() {
        let one = Value::Int(1);
        let two = Value::Int(2);
        let mut buf = vec![0xaa];
        let result = serialize_into(
            [("a", Cow::Borrowed(&one)), ("a", Cow::Borrowed(&two))],
            &mut buf,
            &RecordConfig::default(),
        );
        assert!(matches!(
            result,
            Err(RecordError::DuplicateAttribute(name)) if name == "a"
        ));
        // Nothing was written.
        assert_eq!(buf, vec![0xaa]);
    }

    #[test]
    fn test_to_json() {
        let buf = make_test_record();
        let view = RecordView::from_bytes(&buf).unwrap();
        let json = view.to_json();
        assert_eq!(json["id"], "user:123");
        assert_eq!(json["age"], 30);
        assert_eq!(json["score"], 99.5);
        assert_eq!(json["avatar"], serde_json::json!([1, 2, 3]));
        assert!(json["deleted"].is_null());
    }
}
