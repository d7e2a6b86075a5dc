use thiserror::Error;

/**
 * Failure to decode a single Intel HEX record (one line of text).
 */
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Format(String),

    #[error("checksum mismatch: record has 0x{found:02X}, computed 0x{expected:02X}")]
    Checksum { found: u8, expected: u8 },

    #[error("unsupported record type 0x{0:02X}")]
    UnsupportedRecordType(u8),
}

#[derive(Debug, Error)]
pub enum HexError {
    #[error("line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: RecordError,
    },

    #[error("block at 0x{address:08X} is not aligned to the {pagesize}-byte page size")]
    Alignment { address: u32, pagesize: u32 },

    #[error("address 0x{0:X} cannot be represented in the output address space")]
    AddressOverflow(u64),

    #[error("unable to encode record: {0}")]
    Write(#[from] ihex::WriterError),
}

impl HexError {
    pub fn at_line(line: usize, source: RecordError) -> Self {
        HexError::Record { line, source }
    }
}
