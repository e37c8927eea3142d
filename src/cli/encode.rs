use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use voxell_timer::time_fn;
use zhf::{FrequencyTable, HuffmanEncoder, if_tracing};

use crate::cli::{CHUNK_SIZE, EncodeArgs, ratio_percent, with_partial_output};

/// Counts the characters of the file at `path` without reading it into memory at once.
fn count_file(path: &Path) -> Result<FrequencyTable> {
    let mut input = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut frequencies = FrequencyTable::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = input.read(&mut chunk).with_context(|| format!("failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        frequencies
            .update(&chunk[..n])
            .with_context(|| format!("cannot encode {}", path.display()))?;
    }
    Ok(frequencies)
}

/// Encodes `input` into a container at `output`, returning the frequency table and the size of
/// the container.
pub fn encode_file(input: &Path, output: &Path) -> Result<(FrequencyTable, u64)> {
    let frequencies = count_file(input)?;
    let mut reader = BufReader::new(File::open(input).with_context(|| format!("failed to open {}", input.display()))?);

    let written = with_partial_output(output, |file| {
        let mut encoder = HuffmanEncoder::new(&frequencies, BufWriter::new(file))?;
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut chunk).with_context(|| format!("failed to read {}", input.display()))?;
            if n == 0 {
                break;
            }
            encoder
                .write_all(&chunk[..n])
                .with_context(|| format!("{} changed while it was being encoded", input.display()))?;
        }
        let mut writer = encoder.finish()?;
        writer.flush()?;
        Ok(writer.stream_position()?)
    })?;

    Ok((frequencies, written))
}

pub fn encode(args: EncodeArgs) -> Result<()> {
    let input_path = &args.input;
    let output_path = &args.output_path();

    if_tracing! {
        let span = tracing::span!(tracing::Level::INFO, "encode", input = %input_path.display());
        let _enter = span.enter();
    }

    let (res, comp_dur) = time_fn(|| encode_file(input_path, output_path));
    let (frequencies, written) = res?;
    let original_len = fs::metadata(input_path).map(|m| m.len()).unwrap_or(frequencies.total());

    if_tracing! {
        tracing::info!(event = "encode_complete", input = %input_path.display(), output = %output_path.display(), elapsed_us = %comp_dur.as_micros(), compressed_len = written, "encode finished");
    }

    println!(
        "encoded {} ({} bytes) -> {} ({} bytes)\n\t{} distinct characters, entropy {:.4} bits/character\n\tratio: {:.1}% (compressed/original)\n\t{:.0?}",
        input_path.display(),
        original_len,
        output_path.display(),
        written,
        frequencies.len(),
        frequencies.entropy(),
        ratio_percent(original_len, written),
        comp_dur,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn encodes_file_like_in_memory() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.zhf");
        // several chunks long so counting and encoding both cross chunk boundaries
        let text: Vec<u8> = b"the quick brown fox jumps over the lazy dog\n".repeat(500);
        fs::write(&input, &text).unwrap();

        let (frequencies, written) = encode_file(&input, &output).unwrap();

        let on_disk = fs::read(&output).unwrap();
        assert_eq!(on_disk, zhf::encode(&text).unwrap());
        assert_eq!(written, on_disk.len() as u64);
        assert_eq!(frequencies.total(), text.len() as u64);
    }

    #[test]
    fn non_ascii_input_leaves_no_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.zhf");
        fs::write(&input, "na\u{ef}ve").unwrap();

        let err = encode_file(&input, &output).unwrap_err();
        let cause = err.downcast_ref::<zhf::ZhfError>().unwrap();
        assert!(cause.is_encoding_error());
        assert!(!output.exists());
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempdir().unwrap();
        let err = encode_file(&dir.path().join("nope.txt"), &dir.path().join("out.zhf")).unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }
}
