use crate::error::HexError;

/**
 * Represents a single contiguous run of 'u8' values, read from a HEX file.
 */
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Block {
    base: u32,
    data: Vec<u8>,
}

impl Block {
    pub fn new(base: u32, data: Vec<u8>) -> Self {
        Self { base, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn address(&self) -> u32 {
        self.base
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Absolute address of the byte immediately following this block.
    pub fn end(&self) -> u64 {
        self.base as u64 + self.data.len() as u64
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /**
     * Cut the block into page-aligned chunks of (at most) `pagesize` bytes.
     * The block has to start on a page boundary; only its final page may be
     * short.
     */
    pub fn into_pages(self, pagesize: u32) -> Result<Pages, HexError> {
        if pagesize == 0 || self.base % pagesize != 0 {
            return Err(HexError::Alignment {
                address: self.base,
                pagesize,
            });
        }
        Ok(Pages {
            first: self.base / pagesize,
            pagesize,
            data: self.data,
            offset: 0,
        })
    }
}

/**
 * A fixed-size, address-aligned chunk of firmware data; the unit by which
 * later input files override earlier ones.
 */
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Page {
    index: u32,
    address: u32,
    data: Vec<u8>,
}

impl Page {
    pub fn new(index: u32, pagesize: u32, data: Vec<u8>) -> Self {
        Self {
            index,
            address: index * pagesize,
            data,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/**
 * Single-pass iterator over the pages of one block.
 */
#[derive(Debug)]
pub struct Pages {
    first: u32,
    pagesize: u32,
    data: Vec<u8>,
    offset: usize,
}

impl Iterator for Pages {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        if self.offset >= self.data.len() {
            return None;
        }
        let end = self
            .data
            .len()
            .min(self.offset + self.pagesize as usize);
        // The last page may sit at index u32::MAX, so derive rather than count
        let index = self.first + (self.offset / self.pagesize as usize) as u32;
        let page = Page::new(index, self.pagesize, self.data[self.offset..end].to_vec());
        self.offset = end;
        Some(page)
    }
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
