use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use voxell_timer::time_fn;
use zhf::{HuffmanDecoder, if_tracing};

use crate::cli::{DecodeArgs, with_partial_output};

/// Decodes the container at `input` into `output`, returning the number of characters written.
pub fn decode_file(input: &Path, output: &Path) -> Result<u64> {
    let reader = BufReader::new(File::open(input).with_context(|| format!("failed to open {}", input.display()))?);
    let decoder = HuffmanDecoder::new(reader).with_context(|| format!("cannot decode {}", input.display()))?;

    with_partial_output(output, |file| {
        let mut out = BufWriter::new(file);
        let mut written = 0u64;
        for character in decoder {
            let character = character.with_context(|| format!("cannot decode {}", input.display()))?;
            out.write_all(&[character])?;
            written += 1;
        }
        out.flush()?;
        Ok(written)
    })
}

pub fn decode(args: DecodeArgs) -> Result<()> {
    let input_path = &args.input;
    let output_path = &args.output_path()?;

    if_tracing! {
        let span = tracing::span!(tracing::Level::INFO, "decode", input = %input_path.display());
        let _enter = span.enter();
    }

    let (res, decomp_dur) = time_fn(|| decode_file(input_path, output_path));
    let written = res?;

    if_tracing! {
        tracing::info!(event = "decode_complete", input = %input_path.display(), output = %output_path.display(), elapsed_us = %decomp_dur.as_micros(), decompressed_len = written, "decode finished");
    }

    println!(
        "decoded {} -> {} ({} bytes)\n\t{:.0?}",
        input_path.display(),
        output_path.display(),
        written,
        decomp_dur,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::cli::encode::encode_file;

    #[test]
    fn file_roundtrip() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("lorem.txt");
        let packed = dir.path().join("lorem.zhf");
        let restored = dir.path().join("lorem_decoded.txt");
        let text = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit,\nsed do eiusmod tempor incididunt.\n".repeat(300);
        fs::write(&original, &text).unwrap();

        encode_file(&original, &packed).unwrap();
        let written = decode_file(&packed, &restored).unwrap();

        assert_eq!(written, text.len() as u64);
        assert_eq!(fs::read(&restored).unwrap(), text);
    }

    #[test]
    fn empty_file_roundtrip() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("empty.txt");
        let packed = dir.path().join("empty.zhf");
        let restored = dir.path().join("empty_decoded.txt");
        fs::write(&original, b"").unwrap();

        encode_file(&original, &packed).unwrap();
        assert_eq!(decode_file(&packed, &restored).unwrap(), 0);
        assert_eq!(fs::read(&restored).unwrap(), b"");
    }

    #[test]
    fn bad_header_leaves_no_output() {
        let dir = tempdir().unwrap();
        let packed = dir.path().join("bogus.zhf");
        let restored = dir.path().join("bogus.txt");
        fs::write(&packed, b"PK\x03\x04 definitely not a zhf file").unwrap();

        let err = decode_file(&packed, &restored).unwrap_err();
        assert!(err.downcast_ref::<zhf::ZhfError>().unwrap().is_format_error());
        assert!(!restored.exists());
    }

    #[test]
    fn corrupt_payload_leaves_no_output() {
        let dir = tempdir().unwrap();
        let packed = dir.path().join("cut.zhf");
        let restored = dir.path().join("cut.txt");
        let mut container = zhf::encode(b"a man, a plan, a canal: panama").unwrap();
        container.truncate(container.len() - 3);
        fs::write(&packed, &container).unwrap();

        let err = decode_file(&packed, &restored).unwrap_err();
        assert!(err.downcast_ref::<zhf::ZhfError>().unwrap().is_corrupt_data());
        assert!(!restored.exists());
    }
}
