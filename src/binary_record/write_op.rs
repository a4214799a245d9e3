use super::{BinaryRecord, BufferState, Slot};
use crate::value::Value;
use smol_str::SmolStr;

impl BinaryRecord {
    // ════════════════════════════════════════════════════════════════════════
    // Writes (cache only, buffer goes stale)
    // ════════════════════════════════════════════════════════════════════════

    /// Set an attribute. Overwrites in place, or appends after every
    /// existing attribute (buffer-only ones included).
    pub fn put(&mut self, name: impl Into<SmolStr>, value: impl Into<Value>) -> &mut Self {
        self.ensure_seeded();
        self.cache.put(name, Slot::Ready(value.into()));
        self.state = BufferState::Stale;
        self
    }

    /// Merge a mapping; later pairs win.
    pub fn put_all<K, V, I>(&mut self, entries: I) -> &mut Self
    where
        K: Into<SmolStr>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.ensure_seeded();
        for (name, value) in entries {
            self.cache.put(name, Slot::Ready(value.into()));
        }
        self.state = BufferState::Stale;
        self
    }
}

impl<K: Into<SmolStr>, V: Into<Value>> Extend<(K, V)> for BinaryRecord {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}
