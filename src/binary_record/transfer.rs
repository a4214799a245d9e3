use super::BinaryRecord;
use crate::error::RecordError;
use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{self, Serialize, Serializer};
use std::fmt;
use std::io::{Read, Write};

// ════════════════════════════════════════════════════════════════════════
// Length-prefixed transfer
// ════════════════════════════════════════════════════════════════════════
//
//  ┌───────────────────────┬──────────────────────────────┐
//  │ length: u32 (BE)      │ canonical buffer (length B)  │
//  └───────────────────────┴──────────────────────────────┘

impl BinaryRecord {
    /// Write the canonical buffer with its length prefix, regenerating first
    /// if stale.
    pub fn serialize_to<W: Write>(&mut self, mut writer: W) -> Result<(), RecordError> {
        let bytes = self.raw_bytes()?;
        let len = u32::try_from(bytes.len()).map_err(|_| RecordError::RecordTooLarge(bytes.len()))?;
        writer.write_all(&len.to_be_bytes())?;
        writer.write_all(bytes)?;
        Ok(())
    }

    /// Read one length-prefixed record. The cache starts empty; attributes
    /// are decoded on demand.
    pub fn deserialize_from<R: Read>(mut reader: R) -> Result<Self, RecordError> {
        let mut prefix = [0u8; 4];
        reader.read_exact(&mut prefix)?;
        let len = u32::from_be_bytes(prefix) as usize;

        // Bounded read: a corrupt prefix cannot force a huge allocation.
        let mut bytes = Vec::new();
        reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(RecordError::LengthMismatch {
                expected: len,
                actual: bytes.len(),
            });
        }
        Self::from_bytes(bytes)
    }
}

// ─── serde ──────────────────────────────────────────────────────────────────

/// Serialized as a byte string holding the canonical buffer.
impl Serialize for BinaryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = self
            .canonical_bytes()
            .map_err(<S::Error as ser::Error>::custom)?;
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for BinaryRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = BinaryRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an encoded binary record")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        BinaryRecord::from_bytes(v.to_vec()).map_err(E::custom)
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        BinaryRecord::from_bytes(v).map_err(E::custom)
    }

    // Formats without a byte-string type (JSON) hand over a sequence.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        BinaryRecord::from_bytes(bytes).map_err(de::Error::custom)
    }
}
