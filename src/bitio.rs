//! MSB-first bit packing on top of byte streams.

use std::io::{self, Write};

/// Packs single bits into bytes, most significant bit first, and writes every completed byte to
/// the underlying writer.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: W,
    buffer: u8,
    pending: u8,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: 0,
            pending: 0,
            bytes_written: 0,
        }
    }

    /// Appends one bit. Any non-zero value is a `1`.
    pub fn write_bit(&mut self, bit: u8) -> io::Result<()> {
        if bit != 0 {
            self.buffer |= 1 << (7 - self.pending);
        }
        self.pending += 1;
        if self.pending == 8 {
            self.inner.write_all(&[self.buffer])?;
            self.bytes_written += 1;
            self.buffer = 0;
            self.pending = 0;
        }
        Ok(())
    }

    pub fn write_bits(&mut self, bits: &[u8]) -> io::Result<()> {
        for &bit in bits {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Writes out the partially filled byte, if any, with its unused low bits left at zero.
    ///
    /// Returns how many bits of that last byte are meaningful, or `0` if nothing was pending
    /// because the stream was already byte-aligned.
    pub fn flush(&mut self) -> io::Result<u8> {
        let used = self.pending;
        if used != 0 {
            self.inner.write_all(&[self.buffer])?;
            self.bytes_written += 1;
            self.buffer = 0;
            self.pending = 0;
        }
        Ok(used)
    }

    /// Bits currently waiting for their byte to fill up.
    pub const fn pending(&self) -> u8 {
        self.pending
    }

    /// Complete bytes handed to the underlying writer so far.
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Gives back the underlying writer. Pending bits that were not flushed are dropped.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Yields the first `len` bits of a single byte, most significant first.
#[derive(Clone, Debug)]
pub struct BitReader {
    byte: u8,
    position: u8,
    len: u8,
}

impl BitReader {
    /// `len` is clamped to 8.
    pub fn new(byte: u8, len: u8) -> Self {
        Self {
            byte,
            position: 0,
            len: len.min(8),
        }
    }
}

impl Iterator for BitReader {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.position >= self.len {
            return None;
        }
        let shift = 7 - self.position;
        self.position += 1;
        Some((self.byte >> shift) & 1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.position) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BitReader {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_msb_first() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(&[1, 0, 1, 1, 0, 0, 0, 1]).unwrap();
        assert_eq!(writer.pending(), 0);
        assert_eq!(writer.bytes_written(), 1);
        assert_eq!(writer.into_inner(), vec![0b1011_0001]);
    }

    #[test]
    fn flush_pads_with_zeros() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(&[0, 0, 0, 0, 1]).unwrap();
        assert_eq!(writer.pending(), 5);
        assert_eq!(writer.flush().unwrap(), 5);
        assert_eq!(writer.bytes_written(), 1);
        assert_eq!(writer.into_inner(), vec![0b0000_1000]);
    }

    #[test]
    fn flush_when_aligned_writes_nothing() {
        let mut writer = BitWriter::new(Vec::new());
        assert_eq!(writer.flush().unwrap(), 0);
        writer.write_bits(&[1; 16]).unwrap();
        assert_eq!(writer.flush().unwrap(), 0);
        assert_eq!(writer.into_inner(), vec![0xff, 0xff]);
    }

    #[test]
    fn reader_yields_requested_bits_only() {
        let bits: Vec<u8> = BitReader::new(0b1010_0110, 8).collect();
        assert_eq!(bits, vec![1, 0, 1, 0, 0, 1, 1, 0]);

        let reader = BitReader::new(0b1110_1111, 3);
        assert_eq!(reader.len(), 3);
        assert_eq!(reader.collect::<Vec<_>>(), vec![1, 1, 1]);

        assert_eq!(BitReader::new(0xff, 0).count(), 0);
        assert_eq!(BitReader::new(0xff, 200).count(), 8);
    }

    #[test]
    fn writer_and_reader_agree() {
        let bits = [1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 1];
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(&bits).unwrap();
        let used = writer.flush().unwrap();
        let bytes = writer.into_inner();

        let mut read = Vec::new();
        for (i, &byte) in bytes.iter().enumerate() {
            let len = if i + 1 == bytes.len() { used } else { 8 };
            read.extend(BitReader::new(byte, len));
        }
        assert_eq!(read, bits);
    }
}
