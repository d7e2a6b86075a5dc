use std::collections::btree_map::{BTreeMap, Values};

use crate::error::HexError;
use crate::hexcrc::calc_image_crc;
use crate::reader::BlockReader;
use crate::region::Page;

/// What folding one input file into an [`Image`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    pub blocks: usize,
    pub pages: usize,
    pub replaced: usize,
}

/**
 * Merged firmware image, as a mapping from page index to page contents.
 *
 * A page from a later file replaces the whole of an earlier page with the
 * same index, even if the earlier page held bytes that the later one does
 * not cover. Use a smaller page size for finer-grained overrides.
 */
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Image {
    pagesize: u32,
    pages: BTreeMap<u32, Page>,
}

impl Image {
    pub fn new(pagesize: u32) -> Self {
        Self {
            pagesize,
            pages: BTreeMap::new(),
        }
    }

    pub fn pagesize(&self) -> u32 {
        self.pagesize
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of data bytes, over all pages.
    pub fn len(&self) -> usize {
        self.pages.values().fold(0, |s, p| s + p.len())
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn crc32(&self) -> u32 {
        calc_image_crc(self.pages.values())
    }

    /// Pages in ascending index order.
    pub fn pages(&self) -> Values<'_, u32, Page> {
        self.pages.values()
    }

    pub fn get(&self, index: u32) -> Option<&Page> {
        self.pages.get(&index)
    }

    /// Insert a page, returning the one it replaced (if any).
    pub fn insert(&mut self, page: Page) -> Option<Page> {
        self.pages.insert(page.index(), page)
    }

    /**
     * Decode the Intel HEX `text` of one input file and fold its pages into
     * the image. The file is decoded completely before any of its pages are
     * stored, so on error the image is left untouched.
     */
    pub fn add_hex(&mut self, text: &str) -> Result<FileStats, HexError> {
        let mut stats = FileStats::default();
        let mut pages = Vec::new();

        for block in BlockReader::new(text) {
            let block = block?;
            tracing::debug!(
                "block: ADDR = {:08x}, SIZE = {}",
                block.address(),
                block.len()
            );
            stats.blocks += 1;
            pages.extend(block.into_pages(self.pagesize)?);
        }

        for page in pages {
            stats.pages += 1;
            if let Some(old) = self.insert(page) {
                tracing::debug!(
                    "page {} (ADDR = {:08x}) replaced",
                    old.index(),
                    old.address()
                );
                stats.replaced += 1;
            }
        }
        Ok(stats)
    }
}

/**
 * Merge the given Intel HEX texts, in order; later texts win.
 */
pub fn merge<'a, I>(inputs: I, pagesize: u32) -> Result<Image, HexError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut image = Image::new(pagesize);
    for text in inputs {
        image.add_hex(text)?;
    }
    Ok(image)
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
