//! cli component of zhf.
//!
//! `$exename` stands for the executable name, `<description>` denotes a required argument and
//! `[description]` an optional one.
//!
//! > `$exename encode -i <input text file> [-o output .zhf file]`
//!
//! counts the characters of the input, then reads it a second time to encode it, so the input is
//! never held in memory as a whole. only ASCII input is accepted. without `-o` the output is the
//! input path with `.zhf` appended.
//!
//! > `$exename decode -i <input .zhf file> [-o output text file]`
//!
//! without `-o` the output is the input path with its `.zhf` extension removed.
//!
//! both commands write to `<output>.partial` first and rename it over the output path only once
//! everything succeeded, so a failed run never leaves a half-written file behind.
//!
//! > `$exename test -i <file or folder>`
//!
//! round-trips every file in memory and reports whether the decoded bytes match. files that are
//! not ASCII are skipped.
//!
//! > `$exename inspect -i <input .zhf file> [--json]`
//!
//! prints the container header and the code assigned to every character.
//!
//! set `RUST_LOG` (e.g. `RUST_LOG=debug`) to see what the codec is doing.
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use zhf::container::FILE_EXTENSION;
use zhf::{if_not_tracing, if_tracing};

pub mod decode;
pub mod encode;
pub mod inspect;

/// Input files are read in chunks of this many bytes.
pub const CHUNK_SIZE: usize = 8192;

/// CLI arguments for zhf
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Supported commands for zhf
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode an ASCII text file into a .zhf container
    #[command(alias = "enc")]
    Encode(EncodeArgs),

    /// Decode a .zhf container back into text
    #[command(alias = "dec")]
    Decode(DecodeArgs),

    /// Test compression/decompression roundtrip of a file or every file in a folder
    Test(TestArgs),

    /// Print the header of a .zhf container
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Text file to encode
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path of the .zhf file to create, `<input>.zhf` by default
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl EncodeArgs {
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let mut name = self.input.as_os_str().to_owned();
        name.push(".");
        name.push(FILE_EXTENSION);
        PathBuf::from(name)
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// .zhf file to decode
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path of the text file to create, the input without its .zhf extension by default
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DecodeArgs {
    pub fn output_path(&self) -> Result<PathBuf> {
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        match self.input.extension() {
            Some(ext) if ext == FILE_EXTENSION => Ok(self.input.with_extension("")),
            _ => bail!(
                "{} does not end in .{}, pass the output path with -o",
                self.input.display(),
                FILE_EXTENSION
            ),
        }
    }
}

#[derive(Args, Debug)]
pub struct TestArgs {
    /// File or folder to round-trip
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// .zhf file to inspect
    #[arg(short, long)]
    pub input: PathBuf,

    /// Print the header as JSON
    #[arg(long)]
    pub json: bool,
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(OsString::from(".partial"));
    PathBuf::from(name)
}

/// Lets `f` write the output into a temporary file next to `output`, which is renamed over
/// `output` if `f` succeeds and removed if it fails.
pub fn with_partial_output<T>(output: &Path, f: impl FnOnce(&mut File) -> Result<T>) -> Result<T> {
    let partial = partial_path(output);
    let mut file = File::create(&partial).with_context(|| format!("failed to create {}", partial.display()))?;

    let res = f(&mut file).and_then(|value| {
        file.sync_all()?;
        Ok(value)
    });
    drop(file);

    match res {
        Ok(value) => {
            fs::rename(&partial, output)
                .with_context(|| format!("failed to move {} to {}", partial.display(), output.display()))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(cleanup) = fs::remove_file(&partial) {
                if_tracing! {
                    tracing::warn!(event = "cleanup_failed", path = %partial.display(), error = %cleanup, "could not remove partial output");
                }
                if_not_tracing! {
                    eprintln!("warning: could not remove {}: {}", partial.display(), cleanup);
                }
            }
            Err(err)
        }
    }
}

pub fn ratio_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 100.0;
    }
    compressed as f64 / original as f64 * 100.0
}
