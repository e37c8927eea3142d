use std::io::Read;

use crate::bitio::BitReader;
use crate::container::{self, ContainerSummary, PayloadInfo};
use crate::error::{Result, ZhfError};
use crate::frequency::{ALPHABET_SIZE, FrequencyTable};
use crate::tree::{HuffmanTree, NodeId};

if_tracing! {
    use tracing::{debug, info, warn};
}

/// Lazily decodes the characters of a `.zhf` container, one at a time.
///
/// [`new`](HuffmanDecoder::new) reads the whole header and rebuilds the encoder's tree; iterating
/// then reads the payload a byte at a time and walks the tree bit by bit. The iterator is finite
/// and one-pass, and stops for good after yielding an error. Once it returns `None` the underlying
/// reader sits right after the payload.
#[derive(Debug)]
pub struct HuffmanDecoder<R: Read> {
    reader: R,
    frequencies: FrequencyTable,
    tree: Option<HuffmanTree>,
    payload: PayloadInfo,
    next_byte: u32,
    bits: BitReader,
    current: Option<NodeId>,
    /// How many more times each character may still be decoded.
    remaining: [u32; ALPHABET_SIZE],
    emitted: u64,
    done: bool,
}

impl<R: Read> HuffmanDecoder<R> {
    /// Reads and validates the container header.
    ///
    /// # Errors
    ///
    /// [`ZhfError::BadMagic`] or [`ZhfError::UnsupportedVersion`] if this is not a version 1
    /// container, [`ZhfError::CorruptData`] if the header is inconsistent.
    pub fn new(mut reader: R) -> Result<Self> {
        let frequencies = container::read_preamble(&mut reader)?;
        let payload = PayloadInfo::read(&mut reader)?;
        let tree = HuffmanTree::build(&frequencies);

        // an empty table and a single-leaf tree both encode to zero payload bits
        let codeless = tree.as_ref().is_none_or(|t| t.node(t.root()).is_leaf());
        if codeless && payload.byte_count != 0 {
            return Err(ZhfError::corrupted(format!(
                "{} payload bytes present, but a table of {} characters has no codes",
                payload.byte_count,
                frequencies.len()
            )));
        }

        if_tracing! {
            debug!(target = "decoder", distinct = frequencies.len(), characters = frequencies.total(), payload_bytes = payload.byte_count, used_bits = payload.used_bits, "header read");
        }

        let mut remaining = [0; ALPHABET_SIZE];
        for &(character, count) in frequencies.entries() {
            remaining[usize::from(character)] = count;
        }

        Ok(Self {
            reader,
            remaining,
            current: tree.as_ref().map(HuffmanTree::root),
            frequencies,
            tree,
            payload,
            next_byte: 0,
            bits: BitReader::new(0, 0),
            emitted: 0,
            done: false,
        })
    }

    pub fn frequencies(&self) -> &FrequencyTable {
        &self.frequencies
    }

    pub fn tree(&self) -> Option<&HuffmanTree> {
        self.tree.as_ref()
    }

    pub fn payload(&self) -> PayloadInfo {
        self.payload
    }

    /// Length of the decoded text, according to the frequency table.
    pub fn total_characters(&self) -> u64 {
        self.frequencies.total()
    }

    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary::new(&self.frequencies, self.tree.as_ref(), self.payload)
    }

    /// Gives back the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn step(&mut self) -> Result<Option<u8>> {
        let Some(tree) = &self.tree else {
            return Ok(None);
        };
        let root = tree.root();

        // a lone leaf has the empty code: the table alone says how often to repeat it
        if let Some(character) = tree.node(root).character() {
            if self.emitted == self.frequencies.total() {
                return Ok(None);
            }
            return self.emit(character).map(Some);
        }

        loop {
            let Some(bit) = self.bits.next() else {
                if self.next_byte == self.payload.byte_count {
                    return self.end_of_payload(root).map(|()| None);
                }
                let byte = container::read_u8(&mut self.reader, "payload")?;
                self.bits = BitReader::new(byte, self.payload.bits_in(self.next_byte));
                self.next_byte += 1;
                continue;
            };

            let current = self.current.unwrap_or(root);
            let next = tree
                .child(current, bit)
                .ok_or_else(|| ZhfError::corrupted("payload descends below a leaf"))?;

            match tree.node(next).character() {
                Some(character) => {
                    self.current = Some(root);
                    return self.emit(character).map(Some);
                }
                None => self.current = Some(next),
            }
        }
    }

    fn emit(&mut self, character: u8) -> Result<u8> {
        let remaining = &mut self.remaining[usize::from(character)];
        if *remaining == 0 {
            return Err(ZhfError::corrupted(format!(
                "payload holds more {:?} than the {} of the frequency table",
                char::from(character),
                self.frequencies.get(character).unwrap_or(0)
            )));
        }
        *remaining -= 1;
        self.emitted += 1;
        Ok(character)
    }

    fn end_of_payload(&self, root: NodeId) -> Result<()> {
        if self.current != Some(root) {
            return Err(ZhfError::corrupted("payload ends in the middle of a code"));
        }
        if self.emitted != self.frequencies.total() {
            return Err(ZhfError::corrupted(format!(
                "payload decodes to {} characters, the frequency table describes {}",
                self.emitted,
                self.frequencies.total()
            )));
        }
        Ok(())
    }
}

impl<R: Read> Iterator for HuffmanDecoder<R> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Result<u8>> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(character)) => Some(Ok(character)),
            Ok(None) => {
                self.done = true;
                if_tracing! {
                    info!(target = "decoder", characters = self.emitted, payload_bytes = self.payload.byte_count, "decode complete");
                }
                None
            }
            Err(err) => {
                self.done = true;
                if_tracing! {
                    warn!(target = "decoder", error = %err, decoded = self.emitted, "decode failed");
                }
                Some(Err(err))
            }
        }
    }
}
