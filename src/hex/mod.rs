//! Intel HEX decoding, page-granular merging, and re-encoding.
//!
//! Each input goes through `record` (one line to one record), `reader`
//! (base-address tracking and block assembly), and `region` (splitting
//! blocks into pages), before `image` folds the pages together and `writer`
//! renders the result.

pub mod error;
pub mod hexcrc;
pub mod image;
pub mod reader;
pub mod record;
pub mod region;
pub mod writer;

pub use error::{HexError, RecordError};
pub use image::{merge, FileStats, Image};
pub use writer::{to_hex_file, to_hex_string, AddressMode};
