//! Errors produced by the codec.

use crate::Pixel;

/// Error decoding, encoding or rasterizing characters
#[derive(Debug, thiserror::Error)]
pub enum McmError {
    /// First line is neither `MAX7456\r\n` nor `MAX7456\n`
    #[error("unknown character map header {0:?}")]
    InvalidHeader(String),

    /// Data line with a length other than 8
    #[error("line {line} has invalid length {len} (must be 8)")]
    InvalidLineLength { line: usize, len: usize },

    /// Data line with characters other than 0 and 1
    #[error("line {line} is not a binary byte: {content:?}")]
    InvalidDigits { line: usize, content: String },

    /// Stream ended in the middle of a character
    #[error("unexpected end of data at line {line}: character has {bytes} of {expected} bytes")]
    Truncated {
        line: usize,
        bytes: usize,
        expected: usize,
    },

    /// Raw character data with the wrong size
    #[error("invalid char data size {0}, must be {expected}", expected = crate::CHAR_BYTES)]
    InvalidCharSize(usize),

    /// Pixel code outside 0-3
    #[error("invalid pixel {0} > 3")]
    InvalidPixel(u8),

    /// More pixels than fit in a character
    #[error("character is already complete")]
    CharOverflow,

    /// Character requested from a builder that hasn't been filled
    #[error("character is incomplete ({bytes} of {expected} bytes)", expected = crate::CHAR_BYTES)]
    Incomplete { bytes: usize },

    /// Character index that doesn't fit in the selected table size
    #[error("invalid character number {index}, max is {max}")]
    IndexOutOfRange { index: usize, max: usize },

    /// Table without the given character and no fill requested
    #[error("missing character {0}")]
    MissingChar(usize),

    /// Strict rendering found a pixel without a color to draw it with
    #[error("no color was provided for {pixel:?} pixel @ ({x}, {y})")]
    NoColor { pixel: Pixel, x: u32, y: u32 },

    /// Sampling outside a raster view
    #[error("pixel ({x}, {y}) is outside the {width}x{height} image")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
