use std::ops::Range;

use super::view::RecordView;

// ─── Type Tags ──────────────────────────────────────────────────────────────
//
// Shared with previously persisted buffers: the tag set and the
// null → bool(false) convention must not change.
pub const TAG_BOOL: u8 = 1; // always decodes to Null
pub const TAG_INT: u8 = 2;
pub const TAG_FLOAT: u8 = 3;
pub const TAG_STR: u8 = 4;
pub const TAG_BLOB: u8 = 5;

pub const FORMAT_VERSION: u8 = 1;

// ─── Binary Layout ──────────────────────────────────────────────────────────
//
//  ┌──────────────────────────────────────────────┐
//  │ Header (8 bytes)                             │
//  │   field_count:    u32 (LE)                   │
//  │   format_version: u8                         │
//  │   _reserved:      [u8; 3]                    │
//  ├──────────────────────────────────────────────┤
//  │ Index (28 bytes × field_count)               │
//  │   name_hash:   u64 (LE)   ← insertion order  │
//  │   key_offset:  u32 (LE)                      │
//  │   key_len:     u32 (LE)                      │
//  │   data_offset: u32 (LE)                      │
//  │   data_len:    u32 (LE)                      │
//  │   type_tag:    u8                            │
//  │   _padding:    [u8; 3]                       │
//  ├──────────────────────────────────────────────┤
//  │ Keys (variable)                              │
//  │   UTF-8 attribute names packed sequentially  │
//  ├──────────────────────────────────────────────┤
//  │ Data (variable)                              │
//  │   field values packed sequentially           │
//  └──────────────────────────────────────────────┘

pub const HEADER_SIZE: usize = 8; // 4 + 1 + 3
pub const INDEX_ENTRY_SIZE: usize = 28; // 8 + 4 + 4 + 4 + 4 + 1 + 3

pub(crate) const VERSION_OFFSET: usize = 4;

// Offsets inside one index entry.
pub(crate) const ENTRY_KEY_OFFSET: usize = 8;
pub(crate) const ENTRY_KEY_LEN: usize = 12;
pub(crate) const ENTRY_DATA_OFFSET: usize = 16;
pub(crate) const ENTRY_DATA_LEN: usize = 20;
pub(crate) const ENTRY_TAG: usize = 24;

/// A parsed index entry from the binary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub name_hash: u64,
    pub key_offset: usize,
    pub key_len: usize,
    pub data_offset: usize,
    pub data_len: usize,
    pub type_tag: u8,
}

impl IndexEntry {
    #[inline]
    pub fn key_range(&self) -> Option<Range<usize>> {
        Some(self.key_offset..self.key_offset.checked_add(self.key_len)?)
    }

    #[inline]
    pub fn data_range(&self) -> Option<Range<usize>> {
        Some(self.data_offset..self.data_offset.checked_add(self.data_len)?)
    }
}

/// A raw, zero-copy reference to a field's bytes. No deserialization.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    pub name: &'a str,
    pub type_tag: u8,
    pub data: &'a [u8],
}

// ─── Iterators ──────────────────────────────────────────────────────────────

pub struct FieldIter<'a> {
    pub record: RecordView<'a>,
    pub pos: usize,
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = FieldRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.record.field_count {
            return None;
        }
        let field = self.record.field_at(self.pos)?;
        self.pos += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.record.field_count - self.pos;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for FieldIter<'a> {}

pub struct KeyIter<'a> {
    pub record: RecordView<'a>,
    pub pos: usize,
}

impl<'a> Iterator for KeyIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.record.field_count {
            return None;
        }
        let key = self.record.key_at(self.pos)?;
        self.pos += 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.record.field_count - self.pos;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for KeyIter<'a> {}
