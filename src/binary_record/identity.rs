use super::{BinaryRecord, BufferState, Slot};
use crate::attribute_map::AttributeMap;
use crate::error::RecordError;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::warn;
use xxhash_rust::xxh64::xxh64;

impl BinaryRecord {
    // ════════════════════════════════════════════════════════════════════════
    // Canonical bytes and identity
    // ════════════════════════════════════════════════════════════════════════

    /// The canonical buffer, regenerated first if stale.
    pub fn raw_bytes(&mut self) -> Result<&[u8], RecordError> {
        self.ensure_fresh()?;
        Ok(self.buffer.as_deref().unwrap_or_default())
    }

    /// Consume the record into its canonical buffer.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, RecordError> {
        self.ensure_fresh()?;
        Ok(self.buffer.take().unwrap_or_default())
    }

    /// Byte-identity comparison; regenerates both sides as needed.
    ///
    /// Insertion order is part of the encoding, so the same pairs inserted
    /// in a different order compare unequal.
    pub fn equals(&mut self, other: &mut BinaryRecord) -> Result<bool, RecordError> {
        self.ensure_fresh()?;
        other.ensure_fresh()?;
        Ok(self.buffer == other.buffer)
    }

    /// xxh64 of the canonical buffer.
    pub fn hash_code(&mut self) -> Result<u64, RecordError> {
        Ok(xxh64(self.raw_bytes()?, 0))
    }
}

/// Same contract as [`BinaryRecord::equals`], without caching the encoding.
/// A record that cannot be encoded compares unequal to everything.
impl PartialEq for BinaryRecord {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match (self.canonical_bytes(), other.canonical_bytes()) {
            (Ok(a), Ok(b)) => a == b,
            (Err(err), _) | (_, Err(err)) => {
                warn!(error = %err, "comparing a record that cannot be encoded");
                false
            }
        }
    }
}

impl Eq for BinaryRecord {}

impl Hash for BinaryRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.canonical_bytes() {
            Ok(bytes) => bytes.hash(state),
            Err(err) => warn!(error = %err, "hashing a record that cannot be encoded"),
        }
    }
}

/// A clone owns a fully materialized cache and no buffer; it shares
/// nothing with the original.
///
/// The clone holds typed values: an attribute read through
/// `get_as_string` on the original is back to its number or blob in the
/// clone.
impl Clone for BinaryRecord {
    fn clone(&self) -> Self {
        let snapshot = self.snapshot();
        let mut cache = AttributeMap::with_capacity(snapshot.len());
        for (name, value) in snapshot {
            cache.put(name, Slot::Ready(value));
        }
        Self {
            cache,
            buffer: None,
            field_count: 0,
            state: BufferState::Stale,
            config: self.config,
        }
    }
}

impl fmt::Debug for BinaryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryRecord")
            .field("attributes", &self.names())
            .field("state", &self.state)
            .field("buffer_len", &self.buffer.as_ref().map(Vec::len))
            .finish()
    }
}
