/// Default upper bound on attributes per record.
pub const DEFAULT_MAX_ATTRIBUTES: usize = u16::MAX as usize;

/// Configuration carried by every [`BinaryRecord`](crate::BinaryRecord).
///
/// Clones inherit the configuration of the record they were cloned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordConfig {
    /// Maximum number of attributes a record may encode or import.
    ///
    /// Encoding a larger record fails with `RecordError::TooManyAttributes`;
    /// so does importing a buffer whose header claims more.
    ///
    /// Default: 65 535.
    pub max_attributes: usize,
    /// Rough payload size per attribute, used to pre-size encode buffers.
    ///
    /// Default: 32 bytes.
    pub bytes_per_attribute_hint: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            bytes_per_attribute_hint: 32,
        }
    }
}
