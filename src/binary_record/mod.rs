//! The record facade: an ordered attribute cache in front of a canonical
//! binary buffer.
//!
//! A record holds up to two representations of the same attributes. The
//! cache ([`AttributeMap`]) serves reads and takes writes; the buffer is the
//! canonical encoding used for transfer, equality, and hashing. `regen` is
//! the only place the two are brought back in sync.

mod identity;
mod legacy;
mod read_op;
mod transfer;
mod write_op;

pub use read_op::SKIP_COLUMN;

use crate::attribute_map::AttributeMap;
use crate::config::RecordConfig;
use crate::error::RecordError;
use crate::serialization::serialize;
use crate::value::Value;
use crate::view::RecordView;
use smol_str::SmolStr;
use std::borrow::Cow;
use tracing::{debug, trace};

/// Whether `buffer` encodes the record's current content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BufferState {
    /// Buffer absent, or written before the last mutation.
    Stale,
    /// Buffer present and canonical.
    Fresh,
}

/// A cache slot.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    /// Present in the buffer, not decoded yet.
    Pending,
    Ready(Value),
    /// Read through `get_as_string`: reads see `text`, encoding keeps
    /// `source`.
    Coerced { text: Value, source: Value },
}

impl Slot {
    /// What readers see.
    #[inline]
    fn visible(&self) -> Option<&Value> {
        match self {
            Slot::Ready(value) | Slot::Coerced { text: value, .. } => Some(value),
            Slot::Pending => None,
        }
    }

    /// What gets encoded.
    #[inline]
    fn encoded(&self) -> Option<&Value> {
        match self {
            Slot::Ready(value) | Slot::Coerced { source: value, .. } => Some(value),
            Slot::Pending => None,
        }
    }
}

/// A self-describing record backed by a canonical binary buffer.
///
/// Not internally synchronized: reads decode lazily and cache, so even
/// `get` takes `&mut self`.
pub struct BinaryRecord {
    cache: AttributeMap<Slot>,
    buffer: Option<Vec<u8>>,
    /// Attribute count of `buffer`, validated when the buffer was installed.
    field_count: usize,
    state: BufferState,
    config: RecordConfig,
}

impl Default for BinaryRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryRecord {
    // ════════════════════════════════════════════════════════════════════════
    // Construction
    // ════════════════════════════════════════════════════════════════════════

    /// Create an empty record.
    pub fn new() -> Self {
        Self::with_config(RecordConfig::default())
    }

    pub fn with_config(config: RecordConfig) -> Self {
        Self {
            cache: AttributeMap::new(),
            buffer: None,
            field_count: 0,
            state: BufferState::Stale,
            config,
        }
    }

    /// A record with a single unnamed (`""`) blob attribute.
    pub fn from_blob(blob: impl Into<Vec<u8>>) -> Self {
        let mut record = Self::new();
        record.cache.put(SmolStr::default(), Slot::Ready(Value::Blob(blob.into())));
        record
    }

    /// Build from parallel name and value sequences.
    ///
    /// Both sequences must have the same length. A repeated name keeps its
    /// first position and its last value.
    pub fn from_columns<N, V, I, J>(names: I, values: J) -> Result<Self, RecordError>
    where
        N: Into<SmolStr>,
        V: Into<Value>,
        I: IntoIterator<Item = N>,
        J: IntoIterator<Item = V>,
    {
        let names: Vec<N> = names.into_iter().collect();
        let values: Vec<V> = values.into_iter().collect();
        if names.len() != values.len() {
            return Err(RecordError::LengthMismatch {
                expected: names.len(),
                actual: values.len(),
            });
        }
        let mut record = Self::new();
        for (name, value) in names.into_iter().zip(values) {
            record.cache.put(name, Slot::Ready(value.into()));
        }
        Ok(record)
    }

    /// Build from a mapping (or any iterator of pairs); later pairs win.
    pub fn from_map<K, V, I>(entries: I) -> Self
    where
        K: Into<SmolStr>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut record = Self::new();
        for (name, value) in entries {
            record.cache.put(name, Slot::Ready(value.into()));
        }
        record
    }

    /// Import an encoded buffer. Nothing is decoded until it is asked for.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RecordError> {
        Self::from_bytes_with_config(bytes, RecordConfig::default())
    }

    pub fn from_bytes_with_config(bytes: Vec<u8>, config: RecordConfig) -> Result<Self, RecordError> {
        let field_count = RecordView::from_bytes(&bytes)?.field_count;
        if field_count > config.max_attributes {
            return Err(RecordError::TooManyAttributes {
                limit: config.max_attributes,
            });
        }
        debug!(attributes = field_count, bytes = bytes.len(), "imported record buffer");
        Ok(Self {
            cache: AttributeMap::new(),
            buffer: Some(bytes),
            field_count,
            state: BufferState::Fresh,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    // ════════════════════════════════════════════════════════════════════════
    // Internal: cache / buffer plumbing
    // ════════════════════════════════════════════════════════════════════════

    /// View over the current buffer, if any.
    #[inline]
    pub(crate) fn view(&self) -> Option<RecordView<'_>> {
        self.buffer
            .as_deref()
            .map(|buf| RecordView::new(buf, self.field_count))
    }

    /// Whether the cache has never been touched and the buffer carries
    /// everything.
    #[inline]
    pub(crate) fn is_buffer_only(&self) -> bool {
        self.cache.is_empty() && self.buffer.is_some()
    }

    /// First touch of a buffer-only record: register every buffered name as
    /// a pending slot, in buffer order. From here on the cache lists every
    /// attribute, so later writes append after the imported ones and regen
    /// keeps untouched attributes.
    pub(crate) fn ensure_seeded(&mut self) {
        if !self.cache.is_empty() {
            return;
        }
        let Some(buf) = self.buffer.as_deref() else {
            return;
        };
        let view = RecordView::new(buf, self.field_count);
        for key in view.keys() {
            self.cache.put(key, Slot::Pending);
        }
        debug!(attributes = self.cache.len(), "seeded attribute cache from buffer");
    }

    fn decode_from_buffer(&self, name: &str) -> Option<Value> {
        self.view()?.get_field(name)
    }

    /// Decode the slot at `pos` if it is still pending, then return it.
    pub(crate) fn resolve_at(&mut self, pos: usize) -> Option<&Value> {
        if matches!(self.cache.value_at(pos)?, Slot::Pending) {
            let name = self.cache.key_at(pos)?.clone();
            let decoded = self.decode_from_buffer(&name).unwrap_or_default();
            *self.cache.value_at_mut(pos)? = Slot::Ready(decoded);
        }
        self.cache.value_at(pos)?.visible()
    }

    /// Resolved content as it would be encoded, without touching the cache.
    pub(crate) fn snapshot(&self) -> AttributeMap<Value> {
        if self.is_buffer_only() {
            return self
                .view()
                .map(|view| {
                    view.keys()
                        .map(|k| (k, view.get_field(k).unwrap_or_default()))
                        .collect()
                })
                .unwrap_or_default();
        }
        let view = self.view();
        let mut out = AttributeMap::with_capacity(self.cache.len());
        for (name, slot) in self.cache.iter() {
            let value = match slot.encoded() {
                Some(value) => value.clone(),
                None => view.and_then(|v| v.get_field(name)).unwrap_or_default(),
            };
            out.put(name.clone(), value);
        }
        out
    }

    /// Encode the cache in insertion order, decoding pending slots from the
    /// current buffer first.
    fn encode_current(&self) -> Result<Vec<u8>, RecordError> {
        if self.is_buffer_only() {
            if let Some(buf) = &self.buffer {
                return Ok(buf.clone());
            }
        }
        let view = self.view();
        let entries = self.cache.iter().map(|(name, slot)| {
            let value = match slot.encoded() {
                Some(value) => Cow::Borrowed(value),
                None => Cow::Owned(view.and_then(|v| v.get_field(name)).unwrap_or_default()),
            };
            (name.as_str(), value)
        });
        serialize(entries, &self.config)
    }

    /// The canonical bytes, borrowed when fresh, encoded on the fly when
    /// stale. Leaves the record untouched.
    pub(crate) fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, RecordError> {
        match (self.state, self.buffer.as_deref()) {
            (BufferState::Fresh, Some(buf)) => Ok(Cow::Borrowed(buf)),
            _ => self.encode_current().map(Cow::Owned),
        }
    }

    /// Re-derive the canonical buffer from the cache.
    ///
    /// Always allocates a new buffer and rebuilds the index over it.
    pub fn regen(&mut self) -> Result<(), RecordError> {
        let bytes = self.encode_current()?;
        let field_count = RecordView::from_bytes(&bytes)?.field_count;
        trace!(attributes = field_count, bytes = bytes.len(), "regenerated record buffer");
        self.buffer = Some(bytes);
        self.field_count = field_count;
        self.state = BufferState::Fresh;
        Ok(())
    }

    /// Regen only if the buffer is stale.
    #[inline]
    pub(crate) fn ensure_fresh(&mut self) -> Result<(), RecordError> {
        if self.state == BufferState::Stale || self.buffer.is_none() {
            self.regen()?;
        }
        Ok(())
    }
}

impl<K: Into<SmolStr>, V: Into<Value>> FromIterator<(K, V)> for BinaryRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter)
    }
}
