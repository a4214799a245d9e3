// ─── Error ──────────────────────────────────────────────────────────────────
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid buffer structure: {0}")]
    InvalidBuffer(&'static str),
    #[error("Unsupported record format version: {0}")]
    UnsupportedVersion(u8),
    #[error("Unknown type tag: {0}")]
    UnknownTypeTag(u8),
    #[error("Attribute not found: {0:?}")]
    AttributeNotFound(SmolStr),
    #[error("Duplicate attribute name: {0:?}")]
    DuplicateAttribute(SmolStr),
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("record exceeds the {limit}-attribute limit")]
    TooManyAttributes { limit: usize },
    #[error("record does not fit 32-bit offsets ({0} bytes)")]
    RecordTooLarge(usize),
    #[error("FlexBuffers map could not be read: {0:?}")]
    FlexBuffer(flexbuffers::ReaderError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
