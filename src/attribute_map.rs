use rustc_hash::FxHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use smol_str::SmolStr;
use std::fmt;

// ─── AttributeMap ───────────────────────────────────────────────────────────

/// Insertion-ordered map with unique keys.
///
/// Overwriting a key keeps its original position; new keys are appended.
/// Positional access (`key_at` / `value_at`) follows insertion order, which
/// is also the order records are encoded in.
#[derive(Clone)]
pub struct AttributeMap<V> {
    entries: Vec<(SmolStr, V)>,
    positions: FxHashMap<SmolStr, usize>,
}

impl<V> Default for AttributeMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> AttributeMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: FxHashMap::default(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut positions = FxHashMap::default();
        positions.reserve(capacity);
        Self {
            entries: Vec::with_capacity(capacity),
            positions,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    #[inline]
    pub fn contains_key(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.value_at(self.index_of(name)?)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        let pos = self.index_of(name)?;
        self.value_at_mut(pos)
    }

    /// Insert or overwrite. Returns the previous value, if any.
    pub fn put(&mut self, name: impl Into<SmolStr>, value: V) -> Option<V> {
        let name = name.into();
        match self.positions.get(&name) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.positions.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Bulk merge; later entries win on key collision.
    pub fn put_all<K, I>(&mut self, entries: I)
    where
        K: Into<SmolStr>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in entries {
            self.put(name, value);
        }
    }

    #[inline]
    pub fn key_at(&self, index: usize) -> Option<&SmolStr> {
        self.entries.get(index).map(|(k, _)| k)
    }

    #[inline]
    pub fn value_at(&self, index: usize) -> Option<&V> {
        self.entries.get(index).map(|(_, v)| v)
    }

    #[inline]
    pub fn value_at_mut(&mut self, index: usize) -> Option<&mut V> {
        self.entries.get_mut(index).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&SmolStr, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<V: PartialEq> PartialEq for AttributeMap<V> {
    /// Order-sensitive: same pairs in a different order are not equal.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V: fmt::Debug> fmt::Debug for AttributeMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<SmolStr>, V> FromIterator<(K, V)> for AttributeMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.put_all(iter);
        map
    }
}

impl<K: Into<SmolStr>, V> Extend<(K, V)> for AttributeMap<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<V> IntoIterator for AttributeMap<V> {
    type Item = (SmolStr, V);
    type IntoIter = std::vec::IntoIter<(SmolStr, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for AttributeMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in &self.entries {
            m.serialize_entry(k.as_str(), v)?;
        }
        m.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_appends_in_order() {
        let mut map = AttributeMap::new();
        map.put("b", 1);
        map.put("a", 2);
        map.put("c", 3);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut map = AttributeMap::new();
        map.put("a", 1);
        map.put("b", 2);
        assert_eq!(map.put("a", 10), Some(1));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&10));
        assert_eq!(map.value_at(0), Some(&10));
    }

    #[test]
    fn test_put_all_later_wins() {
        let mut map = AttributeMap::new();
        map.put_all([("x", 1), ("y", 2), ("x", 3)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("x"), Some(&3));
        assert_eq!(map.key_at(0).map(SmolStr::as_str), Some("x"));
    }

    #[test]
    fn test_positional_out_of_range() {
        let map: AttributeMap<i32> = AttributeMap::new();
        assert!(map.key_at(0).is_none());
        assert!(map.value_at(0).is_none());
        assert!(map.get("missing").is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a: AttributeMap<i32> = [("a", 1), ("b", 2)].into_iter().collect();
        let b: AttributeMap<i32> = [("b", 2), ("a", 1)].into_iter().collect();
        let c: AttributeMap<i32> = [("a", 1), ("b", 2)].into_iter().collect();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_serialize_preserves_order() {
        let map: AttributeMap<i32> = [("z", 1), ("a", 2)].into_iter().collect();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z":1,"a":2}"#);
    }
}
