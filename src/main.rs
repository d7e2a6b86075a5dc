pub(crate) use hex::*;
pub(crate) mod hex;

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

fn parse_pagesize(input: &str) -> Result<u32, String> {
    let s = input.trim();
    let size = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex value '{input}': {e}"))?
    } else {
        s.parse::<u32>()
            .map_err(|e| format!("invalid decimal value '{input}': {e}"))?
    };
    if !size.is_power_of_two() {
        return Err(format!("page size must be a power of two, not {size}"));
    }
    Ok(size)
}

// -- Data types for command-line options -- //
#[derive(Parser, Debug)]
#[command(author, version, about = "Merge multiple Intel HEX files", long_about = None)]
struct Args {
    /// Page size in bytes (e.g. 1024, 4096, 0x1000); later files replace
    /// whole pages of earlier ones
    #[arg(
        short,
        long,
        value_name = "BYTES",
        default_value = "1024",
        value_parser = parse_pagesize
    )]
    pagesize: u32,

    /// Emit Extended Linear Address records, instead of Extended Segment
    /// Address records
    #[arg(short, long)]
    linear: bool,

    /// Verbosity of generated output?
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output HEX file
    #[arg(value_name = "OUTFILE")]
    output: PathBuf,

    /// Input HEX files, in increasing order of precedence
    #[arg(value_name = "INFILES", required = true)]
    inputs: Vec<PathBuf>,
}

impl Args {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn address_mode(&self) -> AddressMode {
        if self.linear {
            AddressMode::Linear
        } else {
            AddressMode::Segment
        }
    }
}

fn run(args: &Args) -> Result<Image> {
    let mut image = Image::new(args.pagesize);

    for path in args.inputs.iter() {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let stats = image
            .add_hex(&text)
            .with_context(|| format!("{}", path.display()))?;
        tracing::info!(
            "{}: {} blocks, {} pages ({} replaced)",
            path.display(),
            stats.blocks,
            stats.pages,
            stats.replaced
        );
    }
    if image.is_empty() {
        tracing::warn!("no data found in the input files");
    }

    let contents = to_hex_string(&image, args.address_mode())
        .with_context(|| format!("unable to encode {}", args.output.display()))?;
    to_hex_file(&args.output, &contents)
        .with_context(|| format!("unable to write {}", args.output.display()))?;

    tracing::info!(
        "{}: {} pages of {} bytes, {} bytes, CRC32 = 0x{:08X}",
        args.output.display(),
        image.page_count(),
        image.pagesize(),
        image.len(),
        image.crc32()
    );
    Ok(image)
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&args) {
        tracing::error!("{e:#}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
