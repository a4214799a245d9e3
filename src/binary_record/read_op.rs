use super::{BinaryRecord, Slot};
use crate::attribute_map::AttributeMap;
use crate::error::RecordError;
use crate::value::Value;
use tracing::trace;

/// Placeholder column name skipped by [`BinaryRecord::project`].
pub const SKIP_COLUMN: &str = "_";

impl BinaryRecord {
    // ════════════════════════════════════════════════════════════════════════
    // Read access (lazy decode, cached)
    // ════════════════════════════════════════════════════════════════════════

    /// Get an attribute, decoding it from the buffer on first access.
    ///
    /// `None` when the name is in neither the cache nor the buffer. A miss
    /// leaves the record unchanged.
    pub fn get(&mut self, name: &str) -> Option<&Value> {
        self.ensure_seeded();
        let Some(pos) = self.cache.index_of(name) else {
            trace!(attribute = name, "attribute not present in record");
            return None;
        };
        self.resolve_at(pos)
    }

    /// Like [`Self::get`], but a miss is an error.
    pub fn try_get(&mut self, name: &str) -> Result<&Value, RecordError> {
        self.get(name)
            .ok_or_else(|| RecordError::AttributeNotFound(name.into()))
    }

    /// Get an attribute as text.
    ///
    /// Integers become their decimal form and floats use
    /// [`Value::to_text`]'s rendering (`99.5`, `1.0E20`). Blobs are read as
    /// UTF-8 (lossy). The text is cached over the previous value, so later
    /// `get` calls see a string, but encoding keeps the typed value: reading
    /// as text never changes the canonical bytes. Null and missing
    /// attributes yield `None`.
    pub fn get_as_string(&mut self, name: &str) -> Option<&str> {
        let coerced = match self.get(name)? {
            Value::Str(_) => None,
            other => Some(other.to_text()?),
        };
        if let Some(text) = coerced {
            if let Some(slot) = self.cache.get_mut(name) {
                if let Slot::Ready(source) = slot {
                    let source = std::mem::take(source);
                    *slot = Slot::Coerced {
                        text: Value::Str(text),
                        source,
                    };
                }
            }
        }
        self.cache.get(name)?.visible()?.as_str()
    }

    /// Resolve every attribute into an ordered map, caching as it goes.
    pub fn materialize(&mut self) -> AttributeMap<Value> {
        self.ensure_seeded();
        let mut out = AttributeMap::with_capacity(self.cache.len());
        for pos in 0..self.cache.len() {
            let value = self.resolve_at(pos).cloned().unwrap_or_default();
            if let Some(name) = self.cache.key_at(pos) {
                out.put(name.clone(), value);
            }
        }
        out
    }

    /// Number of attributes, including ones not decoded yet.
    pub fn length(&self) -> usize {
        if self.is_buffer_only() {
            self.field_count
        } else {
            self.cache.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Attribute names in record order.
    pub fn names(&self) -> Vec<&str> {
        match self.view() {
            Some(view) if self.is_buffer_only() => view.keys().collect(),
            _ => self.cache.keys().collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self.view() {
            Some(view) if self.is_buffer_only() => view.has_field(name),
            _ => self.cache.contains_key(name),
        }
    }

    /// Values for an ordered column list, as a batched statement writer
    /// binds them. [`SKIP_COLUMN`] entries are left out; missing attributes
    /// yield `Null`.
    pub fn project<S: AsRef<str>>(&mut self, columns: &[S]) -> Vec<Value> {
        let mut row = Vec::with_capacity(columns.len());
        for column in columns {
            let column: &str = column.as_ref();
            if column == SKIP_COLUMN {
                continue;
            }
            row.push(self.get(column).cloned().unwrap_or_default());
        }
        row
    }

    /// Decode the whole record into JSON, keyed by attribute name.
    pub fn to_json(&mut self) -> serde_json::Value {
        self.materialize()
            .into_iter()
            .map(|(name, value)| (name.to_string(), serde_json::Value::from(value)))
            .collect::<serde_json::Map<_, _>>()
            .into()
    }
}
