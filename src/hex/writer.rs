use ihex::Record;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::HexError;
use crate::image::Image;
use crate::record::encode_record;

/// Data bytes per emitted record.
pub const MAX_COLUMNS: usize = 16;

const WINDOW: u64 = 0x1_0000;

/**
 * How the writer moves its 16-bit addressing window.
 */
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Extended Segment Address records carrying `segment << 12`, which
    /// reads back as a 64 kB-aligned base; limits the image to 1 MB.
    #[default]
    Segment,
    /// Standard Extended Linear Address records, for the full 32-bit range.
    Linear,
}

fn address_record(mode: AddressMode, address: u64) -> Result<Record, HexError> {
    let upper = address >> 16;
    match mode {
        AddressMode::Segment => u16::try_from(upper << 12)
            .map(Record::ExtendedSegmentAddress)
            .map_err(|_| HexError::AddressOverflow(address)),
        AddressMode::Linear => u16::try_from(upper)
            .map(Record::ExtendedLinearAddress)
            .map_err(|_| HexError::AddressOverflow(address)),
    }
}

fn push_record(out: &mut String, record: &Record) -> Result<(), HexError> {
    out.push_str(&encode_record(record)?);
    Ok(())
}

/**
 * Render the image, in ascending page order, as Intel HEX text. Addressing
 * records are only emitted when a page falls outside the current 64 kB
 * window, and the text always ends with a single EOF record.
 */
pub fn to_hex_string(image: &Image, mode: AddressMode) -> Result<String, HexError> {
    let mut out = String::new();
    let mut base: u64 = 0;

    for page in image.pages() {
        let page_address = page.address() as u64;
        if page_address - base >= WINDOW {
            let record = address_record(mode, page_address)?;
            base = page_address & !(WINDOW - 1);
            tracing::trace!("window moved to {:08x}: {:?}", base, record);
            push_record(&mut out, &record)?;
        }

        for (i, chunk) in page.data().chunks(MAX_COLUMNS).enumerate() {
            let address = page_address + (i * MAX_COLUMNS) as u64;
            let offset =
                u16::try_from(address - base).map_err(|_| HexError::AddressOverflow(address))?;
            let record = Record::Data {
                offset,
                value: chunk.to_vec(),
            };
            push_record(&mut out, &record)?;
        }
    }
    push_record(&mut out, &Record::EndOfFile)?;

    Ok(out)
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(format!(".{}.tmp", std::process::id()));
    PathBuf::from(name)
}

/**
 * Replace the file at `path` with `contents`. The data is first written to
 * a sibling temporary file, so an interrupted write never leaves a partial
 * output behind.
 */
pub fn to_hex_file(path: &Path, contents: &str) -> io::Result<()> {
    let tmp = temporary_path(path);
    let result = fs::write(&tmp, contents).and_then(|_| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
