use ihex::{ReaderError, Record};

use crate::error::RecordError;

/**
 * Decode one line of Intel HEX text into a checksum-validated record.
 *
 * Only Data, EOF, Extended Segment Address, Start Segment Address, and
 * Extended Linear Address records are accepted.
 */
pub fn decode_line(line: &str) -> Result<Record, RecordError> {
    let record = Record::from_record_string(line.trim()).map_err(|e| match e {
        // 'ihex' reports (computed, stored)
        ReaderError::ChecksumMismatch(expected, found) => RecordError::Checksum { found, expected },
        ReaderError::UnsupportedRecordType(t) => RecordError::UnsupportedRecordType(t),
        other => RecordError::Format(other.to_string()),
    })?;

    match record {
        Record::StartLinearAddress(_) => Err(RecordError::UnsupportedRecordType(
            ihex::types::START_LINEAR_ADDRESS,
        )),
        record => Ok(record),
    }
}

/**
 * Encode a record as a single upper-case line, including its terminator.
 */
pub fn encode_record(record: &Record) -> Result<String, ihex::WriterError> {
    let mut line = record.to_record_string()?;
    line.push('\n');
    Ok(line)
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
