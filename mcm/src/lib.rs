//! max7456-mcm: character map codec for MAX7456 compatible OSDs
//!
//! MAX7456 (and compatible chips such as the AT7456 or FrSkyOSD) store their
//! fonts as a table of 12×18 glyphs where every pixel is a 2-bit code. The
//! `.mcm` file format is a text rendition of that table: one byte per line,
//! written as 8 binary digits.
//!
//! # Character Layout
//!
//! ```text
//! 12×18 pixels × 2 bits = 54 bytes of pixel data
//! 0x00..0x36: pixel data, row-major, 4 pixels per byte, MSB pair first
//! 0x36..0x40: reserved (10 bytes), not displayed, usable as metadata
//! ```
//!
//! # File Layout
//!
//! ```text
//! MAX7456\r\n
//! 00000000\r\n      <- byte 0 of character 0
//! ...               <- 64 lines per character, 256 or 512 characters
//! 01010101          <- no terminator after the very last line
//! ```
//!
//! # Usage
//!
//! ```
//! use max7456_mcm::{Char, CharTable, Decoder, Encoder};
//!
//! let mut table = CharTable::new();
//! table.insert(65, Char::blank());
//!
//! let mut encoded = Vec::new();
//! Encoder::new().encode(&table, &mut encoded).unwrap();
//!
//! let decoded = Decoder::new(encoded.as_slice()).unwrap();
//! assert_eq!(decoded.n_chars(), 256);
//! assert!(decoded.char_at(65).unwrap().is_blank());
//! ```

mod builder;
mod decode;
mod encode;
mod error;
mod glyph;
mod pixel;
mod raster;
mod table;

pub use builder::CharBuilder;
pub use decode::Decoder;
pub use encode::Encoder;
pub use error::McmError;
pub use glyph::{Char, CharPixel};
pub use pixel::{BLACK_COLOR, DEFAULT_TRANSPARENT_COLOR, Pixel, WHITE_COLOR};
pub use raster::RasterView;
pub use table::CharTable;

// =============================================================================
// Constants
// =============================================================================

/// Width of a character in pixels
pub const CHAR_WIDTH: u32 = 12;

/// Height of a character in pixels
pub const CHAR_HEIGHT: u32 = 18;

/// Bytes holding pixel data: (12 × 18 × 2 bits) / 8
pub const MIN_CHAR_BYTES: usize = 54;

/// Bytes per character in .mcm files (pixel data + reserved region)
pub const CHAR_BYTES: usize = 64;

/// Size of the reserved region at the end of each character
pub const METADATA_BYTES: usize = CHAR_BYTES - MIN_CHAR_BYTES;

/// Characters in a standard character map
pub const CHAR_NUM: usize = 256;

/// Characters in an extended (two page) character map, as used by the
/// AT7456 and FrSkyOSD
pub const EXTENDED_CHAR_NUM: usize = 512;

/// Byte value where every pixel is transparent (0b01_01_01_01)
pub const TRANSPARENT_BYTE: u8 = 0x55;

/// Header written at the top of every .mcm file
pub const HEADER: &str = "MAX7456\r\n";

/// Header variant without the carriage return, accepted when reading only
pub const ALT_HEADER: &str = "MAX7456\n";

/// Number of characters needed to hold `max_index`, i.e. 256 unless the
/// index lives in the second page.
pub fn char_num_for(max_index: usize) -> usize {
    if max_index >= CHAR_NUM {
        EXTENDED_CHAR_NUM
    } else {
        CHAR_NUM
    }
}
