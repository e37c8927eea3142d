use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use zhf::HuffmanDecoder;
use zhf::container::ContainerSummary;

use crate::cli::InspectArgs;

pub fn read_summary(path: &Path) -> Result<ContainerSummary> {
    let reader = BufReader::new(File::open(path).with_context(|| format!("failed to open {}", path.display()))?);
    let decoder = HuffmanDecoder::new(reader).with_context(|| format!("cannot read header of {}", path.display()))?;
    Ok(decoder.summary())
}

pub fn render_text(summary: &ContainerSummary) -> String {
    let mut out = format!(
        "version: {}\ncharacters: {}\nentropy: {:.4} bits/character\npayload: {} bytes, {} bits used in the last byte ({} bits total)\n",
        summary.version,
        summary.characters,
        summary.entropy,
        summary.payload.byte_count,
        summary.payload.used_bits,
        summary.payload_bits,
    );
    out.push_str(&format!("frequency table ({} entries):\n", summary.symbols.len()));
    for symbol in &summary.symbols {
        out.push_str(&format!(
            "\t{:>6} 0x{:02x} {:>10}  {}\n",
            format!("'{}'", symbol.character),
            symbol.byte,
            symbol.count,
            if symbol.code.is_empty() { "(empty)" } else { symbol.code.as_str() }
        ));
    }
    out
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let summary = read_summary(&args.input)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_text(&summary));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn summarizes_written_container() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.zhf");
        fs::write(&path, zhf::encode(b"mississippi").unwrap()).unwrap();

        let summary = read_summary(&path).unwrap();
        assert_eq!(summary.characters, 11);
        assert_eq!(summary.payload_bits, 21);

        let text = render_text(&summary);
        assert!(text.contains("frequency table (4 entries)"), "{}", text);
        assert!(text.contains("'s'"), "{}", text);

        let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&summary).unwrap()).unwrap();
        assert_eq!(json["symbols"].as_array().unwrap().len(), 4);
        assert_eq!(json["symbols"][2]["code"], "1");
    }

    #[test]
    fn single_character_code_is_shown_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("z.zhf");
        fs::write(&path, zhf::encode(b"zzz").unwrap()).unwrap();

        let text = render_text(&read_summary(&path).unwrap());
        assert!(text.contains("(empty)"), "{}", text);
    }
}
