//! `.zhf` header layout and the big-endian integer helpers used to read and write it.

use std::io::{self, Read, Write};

use serde::Serialize;

use crate::error::{Result, ZhfError};
use crate::frequency::{ALPHABET_SIZE, FrequencyTable};
use crate::tree::HuffmanTree;

if_tracing! {
    use tracing::debug;
}

/// First four bytes of every container.
pub const FORMAT_CONSTANT: u32 = 0x5A4846;
pub const FORMAT_VERSION: u8 = 1;
pub const FILE_EXTENSION: &str = "zhf";

/// Bytes taken by the encoded byte count and used-bit count fields.
pub const PAYLOAD_INFO_LEN: u64 = 5;

pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

/// Reads exactly `buf.len()` bytes, turning a premature end of input into [`ZhfError::CorruptData`].
fn read_field<R: Read>(reader: &mut R, buf: &mut [u8], field: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ZhfError::corrupted(format!("input ends inside the {}", field)),
        _ => ZhfError::Io(e),
    })
}

pub fn read_u8<R: Read>(reader: &mut R, field: &str) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_field(reader, &mut buf, field)?;
    Ok(buf[0])
}

pub fn read_u32<R: Read>(reader: &mut R, field: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_field(reader, &mut buf, field)?;
    Ok(u32::from_be_bytes(buf))
}

/// Writes the format constant, the version and the frequency table.
pub fn write_preamble<W: Write>(writer: &mut W, frequencies: &FrequencyTable) -> io::Result<()> {
    write_u32(writer, FORMAT_CONSTANT)?;
    write_u8(writer, FORMAT_VERSION)?;
    write_u32(writer, frequencies.len() as u32)?;
    for &(character, count) in frequencies.entries() {
        write_u8(writer, character)?;
        write_u32(writer, count)?;
    }
    Ok(())
}

/// Reads and validates the format constant, the version and the frequency table.
///
/// # Errors
///
/// [`ZhfError::BadMagic`] and [`ZhfError::UnsupportedVersion`] reject the input outright; an
/// invalid table is [`ZhfError::CorruptData`].
pub fn read_preamble<R: Read>(reader: &mut R) -> Result<FrequencyTable> {
    let constant = read_u32(reader, "format constant")?;
    if constant != FORMAT_CONSTANT {
        return Err(ZhfError::BadMagic { found: constant });
    }

    let version = read_u8(reader, "format version")?;
    if version != FORMAT_VERSION {
        return Err(ZhfError::UnsupportedVersion { found: version });
    }

    let len = read_u32(reader, "frequency table length")?;
    if len as usize > ALPHABET_SIZE {
        return Err(ZhfError::corrupted(format!(
            "frequency table claims {} entries, at most {} characters exist",
            len, ALPHABET_SIZE
        )));
    }

    let mut entries = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let character = read_u8(reader, "frequency table")?;
        let count = read_u32(reader, "frequency table")?;
        entries.push((character, count));
    }

    if_tracing! {
        debug!(target = "container", version, entries = len, "container preamble read");
    }

    FrequencyTable::from_entries(entries)
}

/// The two size fields written after the frequency table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PayloadInfo {
    /// Number of payload bytes following the header.
    pub byte_count: u32,
    /// Meaningful bits in the last payload byte; `0` when the payload ended byte-aligned.
    pub used_bits: u8,
}

impl PayloadInfo {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let byte_count = read_u32(reader, "encoded byte count")?;
        let used_bits = read_u8(reader, "used bit count")?;
        let info = Self { byte_count, used_bits };
        info.validate()?;
        Ok(info)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_u32(writer, self.byte_count)?;
        write_u8(writer, self.used_bits)
    }

    fn validate(&self) -> Result<()> {
        if self.used_bits > 8 {
            return Err(ZhfError::corrupted(format!("used bit count {} exceeds 8", self.used_bits)));
        }
        if self.byte_count == 0 && self.used_bits != 0 {
            return Err(ZhfError::corrupted(format!(
                "used bit count {} given for an empty payload",
                self.used_bits
            )));
        }
        Ok(())
    }

    /// Meaningful bits in the payload byte at `index`. Both `0` and `8` mean a full last byte.
    pub fn bits_in(&self, index: u32) -> u8 {
        if index + 1 == self.byte_count && self.used_bits != 0 {
            self.used_bits
        } else {
            8
        }
    }

    /// Total number of meaningful payload bits.
    pub fn bit_len(&self) -> u64 {
        match self.byte_count {
            0 => 0,
            n => u64::from(n - 1) * 8 + u64::from(self.bits_in(n - 1)),
        }
    }
}

/// One row of a [`ContainerSummary`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SymbolSummary {
    pub character: String,
    pub byte: u8,
    pub count: u32,
    /// The character's code as a string of `0`s and `1`s.
    pub code: String,
}

/// Human-readable description of a container header, as printed by `zhf inspect`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContainerSummary {
    pub version: u8,
    pub characters: u64,
    pub entropy: f64,
    pub payload: PayloadInfo,
    pub payload_bits: u64,
    pub symbols: Vec<SymbolSummary>,
}

impl ContainerSummary {
    pub fn new(frequencies: &FrequencyTable, tree: Option<&HuffmanTree>, payload: PayloadInfo) -> Self {
        let symbols = frequencies
            .entries()
            .iter()
            .map(|&(byte, count)| SymbolSummary {
                character: byte.escape_ascii().to_string(),
                byte,
                count,
                code: tree
                    .and_then(|t| t.code_path(byte))
                    .map(|path| path.iter().map(|&bit| if bit == 0 { '0' } else { '1' }).collect())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            version: FORMAT_VERSION,
            characters: frequencies.total(),
            entropy: frequencies.entropy(),
            payload,
            payload_bits: payload.bit_len(),
            symbols,
        }
    }
}
