use ihex::Record;
use std::str::Lines;

use crate::error::HexError;
use crate::record::decode_line;
use crate::region::Block;

/// What a single record means, once the running base address is applied.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Data { address: u64, bytes: Vec<u8> },
    /// The base address changed, so any open block must be closed.
    Rebase,
    EndOfFile,
    Ignored,
}

/**
 * Tracks the 32-bit base address implied by segment/linear address records,
 * and converts the 16-bit offsets of Data records into absolute addresses.
 */
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AddressResolver {
    base: u32,
}

impl AddressResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn resolve(&mut self, record: Record) -> Event {
        match record {
            Record::Data { offset, value } => {
                // Type: 0x00
                Event::Data {
                    address: self.base as u64 + offset as u64,
                    bytes: value,
                }
            }
            Record::EndOfFile => {
                // Type: 0x01
                Event::EndOfFile
            }
            Record::ExtendedSegmentAddress(base) => {
                // Type: 0x02
                self.base = (base as u32) << 4;
                Event::Rebase
            }
            Record::ExtendedLinearAddress(base) => {
                // Type: 0x04
                self.base = (base as u32) << 16;
                Event::Rebase
            }
            Record::StartSegmentAddress { .. } | Record::StartLinearAddress(_) => {
                // Type: 0x03 (ignored, for firmware images), and 0x05 never
                // gets past the decoder
                Event::Ignored
            }
        }
    }
}

/**
 * Coalesces contiguously-addressed data into maximal blocks. At most one
 * block is open at a time.
 */
#[derive(Debug, Default)]
pub struct BlockAssembler {
    open: Option<Block>,
}

impl BlockAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Append data at `address`, returning the previously open block if the
     * new data is not contiguous with it.
     */
    pub fn push(&mut self, address: u32, bytes: &[u8]) -> Option<Block> {
        if bytes.is_empty() {
            return None;
        }
        match self.open.as_mut() {
            Some(block) if block.end() == address as u64 => {
                block.extend(bytes);
                None
            }
            _ => self.open.replace(Block::new(address, bytes.to_vec())),
        }
    }

    pub fn flush(&mut self) -> Option<Block> {
        self.open.take()
    }
}

/**
 * Lazily decodes the blocks of one Intel HEX file, stopping at the first
 * error. Resolver state starts afresh for every reader.
 */
pub struct BlockReader<'a> {
    lines: std::iter::Enumerate<Lines<'a>>,
    resolver: AddressResolver,
    assembler: BlockAssembler,
    done: bool,
}

impl<'a> BlockReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            resolver: AddressResolver::new(),
            assembler: BlockAssembler::new(),
            done: false,
        }
    }

    fn next_block(&mut self) -> Result<Option<Block>, HexError> {
        while let Some((index, line)) = self.lines.next() {
            if line.trim().is_empty() {
                continue;
            }
            let record = decode_line(line).map_err(|e| HexError::at_line(index + 1, e))?;

            match self.resolver.resolve(record) {
                Event::Data { address, bytes } => {
                    let end = address + bytes.len() as u64;
                    if end > u32::MAX as u64 + 1 {
                        return Err(HexError::AddressOverflow(end - 1));
                    }
                    if let Some(block) = self.assembler.push(address as u32, &bytes) {
                        return Ok(Some(block));
                    }
                }
                Event::Rebase => {
                    if let Some(block) = self.assembler.flush() {
                        return Ok(Some(block));
                    }
                }
                Event::EndOfFile => {
                    if let Some((index, _)) =
                        self.lines.by_ref().find(|(_, l)| !l.trim().is_empty())
                    {
                        tracing::warn!("ignoring records after EOF, from line {}", index + 1);
                    }
                    break;
                }
                Event::Ignored => {}
            }
        }
        Ok(self.assembler.flush())
    }
}

impl Iterator for BlockReader<'_> {
    type Item = Result<Block, HexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use pretty_assertions::assert_eq;

    fn read(text: &str) -> Result<Vec<Block>, HexError> {
        BlockReader::new(text).collect()
    }

    #[test]
    fn linear_address_is_applied_to_data_offsets() {
        let mut resolver = AddressResolver::new();
        assert_eq!(
            resolver.resolve(Record::ExtendedLinearAddress(0x0001)),
            Event::Rebase
        );
        assert_eq!(
            resolver.resolve(Record::Data {
                offset: 0x0010,
                value: vec![0x01]
            }),
            Event::Data {
                address: 0x0001_0010,
                bytes: vec![0x01]
            }
        );
    }

    #[test]
    fn segment_address_is_shifted_by_four() {
        let mut resolver = AddressResolver::new();
        assert_eq!(
            resolver.resolve(Record::ExtendedSegmentAddress(0x1000)),
            Event::Rebase
        );
        assert_eq!(resolver.base(), 0x0001_0000);
    }

    #[test]
    fn start_segment_address_keeps_the_base() {
        let mut resolver = AddressResolver::new();
        resolver.resolve(Record::ExtendedLinearAddress(0x0800));
        assert_eq!(
            resolver.resolve(Record::StartSegmentAddress { cs: 0, ip: 0x3800 }),
            Event::Ignored
        );
        assert_eq!(resolver.base(), 0x0800_0000);
    }

    #[test]
    fn assembler_joins_contiguous_data() {
        let mut asm = BlockAssembler::new();
        assert_eq!(asm.push(0x100, &[1, 2]), None);
        assert_eq!(asm.push(0x102, &[3]), None);
        assert_eq!(asm.push(0x102, &[]), None);
        assert_eq!(asm.push(0x200, &[4]), Some(Block::new(0x100, vec![1, 2, 3])));
        assert_eq!(asm.flush(), Some(Block::new(0x200, vec![4])));
        assert_eq!(asm.flush(), None);
    }

    #[test]
    fn reads_blocks_across_records() {
        let text = "\
:020000040001F9
:04001000AABBCCDDDE
:04001400112233443E

:00000001FF
";
        let blocks = read(text).unwrap();
        assert_eq!(
            blocks,
            vec![Block::new(
                0x0001_0010,
                vec![0xaa, 0xbb, 0xcc, 0xdd, 0x11, 0x22, 0x33, 0x44]
            )]
        );
    }

    #[test]
    fn address_records_close_the_open_block() {
        // The second record would be contiguous, but follows an ELA record
        let text = "\
:04FFFC00AABBCCDDF3
:020000040001F9
:040000001122334452
:00000001FF
";
        let blocks = read(text).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].address(), 0x0000_fffc);
        assert_eq!(blocks[1].address(), 0x0001_0000);
        assert_eq!(blocks[1].data(), &[0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn segment_records_close_the_open_block() {
        // Same base before and after, so the data would otherwise join up
        let text = "\
:040000001122334452
:020000020000FC
:04000400556677883E
:00000001FF
";
        let blocks = read(text).unwrap();
        assert_eq!(
            blocks,
            vec![
                Block::new(0x0000, vec![0x11, 0x22, 0x33, 0x44]),
                Block::new(0x0004, vec![0x55, 0x66, 0x77, 0x88]),
            ]
        );
    }

    #[test]
    fn start_segment_address_does_not_split_blocks() {
        let text = "\
:040000001122334452
:0400000300003800C1
:04000400556677883E
:00000001FF
";
        let blocks = read(text).unwrap();
        assert_eq!(
            blocks,
            vec![Block::new(
                0x0000,
                vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
            )]
        );
    }

    #[test]
    fn gaps_start_new_blocks() {
        let text = "\
:040000001122334452
:04000800556677883A
";
        let blocks = read(text).unwrap();
        assert_eq!(
            blocks,
            vec![
                Block::new(0x0000, vec![0x11, 0x22, 0x33, 0x44]),
                Block::new(0x0008, vec![0x55, 0x66, 0x77, 0x88]),
            ]
        );
    }

    #[test]
    fn records_after_eof_are_not_read() {
        let text = "\
:040000001122334452
:00000001FF
:04000800556677883A
";
        let blocks = read(text).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn errors_carry_the_line_number() {
        let text = "\
:040000001122334452

:0400040055667788B3
";
        let mut reader = BlockReader::new(text);
        match reader.next() {
            Some(Err(HexError::Record { line, source })) => {
                assert_eq!(line, 3);
                assert!(matches!(source, RecordError::Checksum { .. }));
            }
            other => panic!("expected a checksum error, got {:?}", other),
        }
        assert!(reader.next().is_none());
    }
}
