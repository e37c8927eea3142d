use crate::error::{Result, ZhfError};

if_tracing! {
    use tracing::debug;
}

/// Number of distinct characters a `.zhf` container can describe.
pub const ALPHABET_SIZE: usize = 128;

/// Occurrence counts of every character seen in the input, kept in first-seen order.
///
/// The order matters: it is the order of the frequency table in the container header, and the
/// tree builder breaks weight ties by position, so the decoder only rebuilds the same tree if it
/// sees the entries in the same order the encoder did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(u8, u32)>,
    // maps a character to its index in `entries`
    slots: [Option<u8>; ALPHABET_SIZE],
    consumed: u64,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyTable {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            slots: [None; ALPHABET_SIZE],
            consumed: 0,
        }
    }

    /// Counts every character of `data`.
    ///
    /// # Errors
    ///
    /// Fails with [`ZhfError::UnsupportedCharacter`] on the first non-ASCII byte.
    pub fn count(data: &[u8]) -> Result<Self> {
        let mut table = Self::new();
        table.update(data)?;
        Ok(table)
    }

    /// Adds the characters of one more chunk of input.
    ///
    /// Offsets in errors are relative to the first byte ever passed to this table, so a file can be
    /// counted chunk by chunk. On error the table is left untouched.
    pub fn update(&mut self, chunk: &[u8]) -> Result<()> {
        if let Some(pos) = chunk.iter().position(|b| !b.is_ascii()) {
            if_tracing! {
                tracing::warn!(byte = chunk[pos], offset = self.consumed + pos as u64, "rejecting non-ASCII input");
            }
            return Err(ZhfError::UnsupportedCharacter {
                byte: chunk[pos],
                offset: self.consumed + pos as u64,
            });
        }

        let mut staged = self.clone();
        for &byte in chunk {
            staged.increment(byte)?;
        }
        staged.consumed += chunk.len() as u64;
        *self = staged;
        Ok(())
    }

    fn increment(&mut self, byte: u8) -> Result<()> {
        match self.slots[byte as usize] {
            Some(idx) => {
                let count = &mut self.entries[idx as usize].1;
                *count = count.checked_add(1).ok_or(ZhfError::InputTooLarge("character count"))?;
            }
            None => {
                self.slots[byte as usize] = Some(self.entries.len() as u8);
                self.entries.push((byte, 1));
            }
        }
        Ok(())
    }

    /// Builds a table from `(character, count)` pairs read out of a container header.
    ///
    /// # Errors
    ///
    /// Fails with [`ZhfError::CorruptData`] if a character is not ASCII, appears twice, or has a
    /// zero count.
    pub fn from_entries(entries: Vec<(u8, u32)>) -> Result<Self> {
        let mut slots = [None; ALPHABET_SIZE];
        let mut consumed = 0u64;
        for (idx, &(character, count)) in entries.iter().enumerate() {
            if !character.is_ascii() {
                return Err(ZhfError::corrupted(format!(
                    "frequency table entry {} holds non-ASCII character 0x{:02x}",
                    idx, character
                )));
            }
            if count == 0 {
                return Err(ZhfError::corrupted(format!(
                    "frequency table entry {} ('{}') has a zero count",
                    idx,
                    character.escape_ascii()
                )));
            }
            if slots[character as usize].replace(idx as u8).is_some() {
                return Err(ZhfError::corrupted(format!(
                    "character '{}' appears twice in the frequency table",
                    character.escape_ascii()
                )));
            }
            consumed += u64::from(count);
        }

        if_tracing! {
            debug!(target = "frequency", distinct = entries.len(), total = consumed, "frequency table parsed");
        }

        Ok(Self { entries, slots, consumed })
    }

    /// `(character, count)` pairs in first-seen order.
    pub fn entries(&self) -> &[(u8, u32)] {
        &self.entries
    }

    pub fn get(&self, character: u8) -> Option<u32> {
        let idx = (*self.slots.get(character as usize)?)?;
        Some(self.entries[idx as usize].1)
    }

    /// Number of distinct characters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts, which is the length of the text the table describes.
    pub fn total(&self) -> u64 {
        self.consumed
    }

    /// Shannon entropy of the distribution, in bits per character.
    pub fn entropy(&self) -> f64 {
        if self.consumed == 0 {
            return 0.0;
        }
        let total = self.consumed as f64;
        self.entries
            .iter()
            .map(|&(_, count)| {
                let p = count as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_in_first_seen_order() {
        let table = FrequencyTable::count(b"mississippi").unwrap();
        assert_eq!(table.entries(), &[(b'm', 1), (b'i', 4), (b's', 4), (b'p', 2)]);
        assert_eq!(table.total(), 11);
        assert_eq!(table.get(b's'), Some(4));
        assert_eq!(table.get(b'x'), None);
        assert_eq!(table.get(0xff), None);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = FrequencyTable::count(b"").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
        assert_eq!(table.entropy(), 0.0);
    }

    #[test]
    fn rejects_non_ascii_with_offset() {
        let err = FrequencyTable::count("caf\u{e9}".as_bytes()).unwrap_err();
        assert!(matches!(err, ZhfError::UnsupportedCharacter { byte: 0xc3, offset: 3 }));
    }

    #[test]
    fn chunked_counting_matches_whole_input() {
        let mut table = FrequencyTable::new();
        table.update(b"missi").unwrap();
        table.update(b"ssippi").unwrap();
        assert_eq!(table, FrequencyTable::count(b"mississippi").unwrap());

        // offsets keep counting across chunks, and a failed chunk changes nothing
        let err = table.update(b"ok\x80").unwrap_err();
        assert!(matches!(err, ZhfError::UnsupportedCharacter { byte: 0x80, offset: 13 }));
        assert_eq!(table.total(), 11);
    }

    #[test]
    fn from_entries_validates() {
        let table = FrequencyTable::from_entries(vec![(b'a', 4), (b'b', 1)]).unwrap();
        assert_eq!(table.total(), 5);
        assert_eq!(table.get(b'b'), Some(1));

        assert!(FrequencyTable::from_entries(vec![(b'a', 0)]).unwrap_err().is_corrupt_data());
        assert!(FrequencyTable::from_entries(vec![(0x90, 1)]).unwrap_err().is_corrupt_data());
        assert!(
            FrequencyTable::from_entries(vec![(b'a', 1), (b'a', 2)])
                .unwrap_err()
                .is_corrupt_data()
        );
    }

    #[test]
    fn entropy_of_uniform_distribution() {
        let table = FrequencyTable::count(b"abcd").unwrap();
        assert!((table.entropy() - 2.0).abs() < 1e-12);
        assert_eq!(FrequencyTable::count(b"aaaa").unwrap().entropy(), 0.0);
    }
}
