//! Huffman coding for ASCII text, stored in the `.zhf` container format.
//!
//! # Container layout
//!
//! every integer is unsigned and big-endian.
//!
//! | field                  | size                        |
//! |------------------------|-----------------------------|
//! | format constant        | 4 bytes, `0x5A4846`         |
//! | format version         | 1 byte, `1`                 |
//! | frequency table length | 4 bytes                     |
//! | frequency table        | N * (1 byte char + 4 bytes) |
//! | encoded byte count     | 4 bytes                     |
//! | used bits              | 1 byte                      |
//! | payload                | encoded byte count bytes    |
//!
//! the frequency table is the only thing the decoder needs to rebuild the exact tree the encoder used,
//! so the order of its entries (first-seen order) and the merge tie-break in [`tree`] are part of the format.
//!
//! ```
//! let packed = zhf::encode(b"mississippi")?;
//! assert_eq!(zhf::decode(&packed)?, b"mississippi");
//! # Ok::<(), zhf::ZhfError>(())
//! ```

#[macro_export]
macro_rules! if_tracing {
    {$($body:tt)*} => {
        ::cfg_if::cfg_if! {
            if #[cfg(feature = "tracing")] {
                $($body)*
            }
        }
    };
}

#[macro_export]
macro_rules! if_not_tracing {
    {$($body:tt)*} => {
        ::cfg_if::cfg_if! {
            if #[cfg(not(feature = "tracing"))] {
                $($body)*
            }
        }
    };
}

pub mod bitio;
pub mod compressor;
pub mod container;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frequency;
pub mod tree;


use std::io::Cursor;

pub use compressor::{Compressor, HuffmanCoding, RoundTripTestResult};
pub use decoder::HuffmanDecoder;
pub use encoder::HuffmanEncoder;
pub use error::{Result, ZhfError};
pub use frequency::FrequencyTable;
pub use tree::HuffmanTree;

/// Encodes `data` into a complete `.zhf` container held in memory.
///
/// # Errors
///
/// Fails with [`ZhfError::UnsupportedCharacter`] if `data` contains a non-ASCII byte.
pub fn encode(data: &[u8]) -> Result<Vec<u8>> {
    let frequencies = FrequencyTable::count(data)?;
    let mut encoder = HuffmanEncoder::new(&frequencies, Cursor::new(Vec::new()))?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?.into_inner())
}

/// Decodes a complete `.zhf` container held in memory.
///
/// # Errors
///
/// Fails with a format error if the header is not a version 1 `.zhf` header, and with
/// [`ZhfError::CorruptData`] if the payload does not match the frequency table.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let decoder = HuffmanDecoder::new(data)?;
    // the table's total is only trusted as far as the payload could back it up
    let hint = (decoder.total_characters() as usize).min(data.len().saturating_mul(8));
    let mut out = Vec::with_capacity(hint);
    for byte in decoder {
        out.push(byte?);
    }
    Ok(out)
}
