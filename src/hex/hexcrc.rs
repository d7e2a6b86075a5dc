use crate::region::Page;

/**
 * Standard (zlib/PKZIP) CRC-32, so the reported value can be checked with
 * common tools against a raw dump of the image.
 */
pub const IMAGE_CRC: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

pub fn calc_image_crc<'a, I>(pages: I) -> u32
where
    I: IntoIterator<Item = &'a Page>,
{
    let mut digest = IMAGE_CRC.digest();
    for p in pages {
        digest.update(p.data());
    }
    digest.finalize()
}

//----------------------------------------------------------------------------
// Tests
//----------------------------------------------------------------------------
