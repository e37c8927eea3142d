//! Error types for encoding and decoding `.zhf` containers.

use std::io;

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = core::result::Result<T, ZhfError>;

/// Everything that can go wrong while encoding or decoding.
#[derive(Debug, Error)]
pub enum ZhfError {
    /// The input contains a byte outside 7-bit ASCII.
    #[error("unsupported character 0x{byte:02x} at offset {offset}: only ASCII input is supported")]
    UnsupportedCharacter { byte: u8, offset: u64 },

    /// The encoder was handed a character its frequency table never counted.
    #[error("character 0x{byte:02x} has no code in this tree")]
    MissingCode { byte: u8 },

    /// The container does not start with the `.zhf` format constant.
    #[error("invalid file format: expected constant 0x{expected:08x}, found 0x{found:08x}", expected = crate::container::FORMAT_CONSTANT)]
    BadMagic { found: u32 },

    /// The container was written by an unknown format version.
    #[error("invalid file format version: expected {expected}, found {found}", expected = crate::container::FORMAT_VERSION)]
    UnsupportedVersion { found: u8 },

    /// The header or payload is internally inconsistent.
    #[error("corrupted data: {0}")]
    CorruptData(String),

    /// A count does not fit the 32-bit fields of the container.
    #[error("input too large: {0} does not fit in 32 bits")]
    InputTooLarge(&'static str),

    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ZhfError {
    /// Create a corrupted data error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        ZhfError::CorruptData(message.into())
    }

    /// The input could not be encoded because of its content.
    pub fn is_encoding_error(&self) -> bool {
        matches!(self, ZhfError::UnsupportedCharacter { .. } | ZhfError::MissingCode { .. })
    }

    /// The container header was rejected outright.
    pub fn is_format_error(&self) -> bool {
        matches!(self, ZhfError::BadMagic { .. } | ZhfError::UnsupportedVersion { .. })
    }

    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, ZhfError::CorruptData(_))
    }
}
