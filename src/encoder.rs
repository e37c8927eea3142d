use std::io::{Seek, SeekFrom, Write};

use crate::bitio::BitWriter;
use crate::container::{self, PAYLOAD_INFO_LEN, PayloadInfo};
use crate::error::{Result, ZhfError};
use crate::frequency::{ALPHABET_SIZE, FrequencyTable};
use crate::tree::HuffmanTree;

if_tracing! {
    use tracing::{debug, info};
}

/// Streams characters into a `.zhf` container.
///
/// The header is written by [`new`](HuffmanEncoder::new) with placeholder size fields, which
/// [`finish`](HuffmanEncoder::finish) seeks back to and fills in once the payload is complete. A
/// container whose encoder was dropped without `finish` claims an empty payload.
#[derive(Debug)]
pub struct HuffmanEncoder<W: Write + Seek> {
    tree: Option<HuffmanTree>,
    // code path of every character, derived from the tree's parent links once up front
    codes: [Option<Vec<u8>>; ALPHABET_SIZE],
    bits: BitWriter<W>,
    info_position: u64,
    expected: u64,
    written: u64,
}

impl<W: Write + Seek> HuffmanEncoder<W> {
    /// Builds the tree for `frequencies` and writes the container header to `writer`.
    pub fn new(frequencies: &FrequencyTable, mut writer: W) -> Result<Self> {
        container::write_preamble(&mut writer, frequencies)?;
        let info_position = writer.stream_position()?;
        PayloadInfo { byte_count: 0, used_bits: 0 }.write(&mut writer)?;

        let tree = HuffmanTree::build(frequencies);
        let codes = core::array::from_fn(|c| tree.as_ref().and_then(|t| t.code_path(c as u8)));

        if_tracing! {
            debug!(target = "encoder", distinct = frequencies.len(), characters = frequencies.total(), header_len = info_position + PAYLOAD_INFO_LEN, "header written");
        }

        Ok(Self {
            tree,
            codes,
            bits: BitWriter::new(writer),
            info_position,
            expected: frequencies.total(),
            written: 0,
        })
    }

    /// The tree the payload is being encoded with, `None` for an empty frequency table.
    pub fn tree(&self) -> Option<&HuffmanTree> {
        self.tree.as_ref()
    }

    /// Appends the code of one character to the payload.
    ///
    /// # Errors
    ///
    /// [`ZhfError::MissingCode`] if the frequency table never counted `character`.
    pub fn write(&mut self, character: u8) -> Result<()> {
        let code = self
            .codes
            .get(character as usize)
            .and_then(Option::as_ref)
            .ok_or(ZhfError::MissingCode { byte: character })?;
        self.bits.write_bits(code)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        for &character in data {
            self.write(character)?;
        }
        Ok(())
    }

    /// Flushes the last partial byte, back-patches the size fields, and returns the writer
    /// positioned at the end of the container.
    ///
    /// # Errors
    ///
    /// Fails with [`ZhfError::CorruptData`] if the number of characters written differs from the
    /// total of the frequency table, since the result could not be decoded.
    pub fn finish(mut self) -> Result<W> {
        if self.written != self.expected {
            return Err(ZhfError::corrupted(format!(
                "encoded {} characters but the frequency table describes {}",
                self.written, self.expected
            )));
        }

        let used_bits = self.bits.flush()?;
        let mut writer = self.bits.into_inner();

        let end = writer.stream_position()?;
        let payload_len = end - self.info_position - PAYLOAD_INFO_LEN;
        let byte_count = u32::try_from(payload_len).map_err(|_| ZhfError::InputTooLarge("encoded byte count"))?;
        let info = PayloadInfo { byte_count, used_bits };

        writer.seek(SeekFrom::Start(self.info_position))?;
        info.write(&mut writer)?;
        writer.seek(SeekFrom::Start(end))?;

        if_tracing! {
            info!(target = "encoder", characters = self.written, payload_bytes = byte_count, used_bits, "encode complete");
        }

        Ok(writer)
    }
}
