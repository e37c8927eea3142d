use core::fmt::{self, Display};

use crate::error::Result;

/// Shared behavior of in-memory compressors.
///
/// Provides a method [`compress_bytes`](Compressor::compress_bytes) to compress data and
/// [`decompress_bytes`](Compressor::decompress_bytes) to decompress data.
///
/// # Note
///
/// No guarantees are made about the length of the resulting [`Vec<u8>`] from
/// [`compress_bytes`](Compressor::compress_bytes). It can be shorter, equal in length, or longer.
/// The only guarantee is that [`decompress_bytes`](Compressor::decompress_bytes) will be able to
/// reconstruct the original data.
pub trait Compressor {
    /// Compresses a given byte slice and returns the encoded data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be represented by this compressor.
    fn compress_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompresses a given byte slice and returns the decoded data.
    ///
    /// # Errors
    ///
    /// Returns an error if the input data was malformed.
    fn decompress_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Returns the name of the compressor algorithm.
    fn compressor_name(&self) -> String;

    /// Performs a round-trip test on the compressor.
    ///
    /// Use for sanity checking the compressor and decompressor.
    fn test_roundtrip<'orig>(&mut self, data: &'orig [u8]) -> Result<RoundTripTestResult<'orig>> {
        let container = self.compress_bytes(data)?;
        let decoded = self.decompress_bytes(&container)?;

        Ok(RoundTripTestResult {
            original: data,
            container,
            decoded,
        })
    }
}

/// An input, the container it was encoded into, and what that container decoded back to.
#[derive(Clone, Debug, Hash)]
pub struct RoundTripTestResult<'orig> {
    original: &'orig [u8],
    container: Vec<u8>,
    decoded: Vec<u8>,
}

impl<'orig> RoundTripTestResult<'orig> {
    pub fn is_successful(&self) -> bool {
        self.original == self.decoded.as_slice()
    }

    pub const fn original(&self) -> &'orig [u8] {
        self.original
    }

    /// The whole encoded container, header included.
    pub fn container(&self) -> &[u8] {
        &self.container
    }

    pub fn decoded(&self) -> &[u8] {
        &self.decoded
    }

    /// Container bits spent per input character, header included. `0.0` for empty input.
    pub fn bits_per_character(&self) -> f64 {
        if self.original.is_empty() {
            return 0.0;
        }
        (self.container.len() * 8) as f64 / self.original.len() as f64
    }

    /// Container size over input size, `1.0` for empty input.
    pub fn ratio(&self) -> f64 {
        if self.original.is_empty() {
            return 1.0;
        }
        self.container.len() as f64 / self.original.len() as f64
    }
}

/// Huffman coding into `.zhf` containers.
#[derive(Clone, Copy, Debug, Default)]
pub struct HuffmanCoding;

impl Compressor for HuffmanCoding {
    fn compress_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        crate::encode(data)
    }

    fn decompress_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        crate::decode(data)
    }

    fn compressor_name(&self) -> String {
        self.to_string()
    }
}

impl Display for HuffmanCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Huffman Coding")
    }
}
