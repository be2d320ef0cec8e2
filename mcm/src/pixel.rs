//! The 2-bit pixel alphabet.

use image::Rgba;

/// Color used for black pixels when rendering
pub const BLACK_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Color used for white pixels when rendering
pub const WHITE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Color used for transparent pixels when the caller provides none (50% gray)
pub const DEFAULT_TRANSPARENT_COLOR: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// A pixel in a character.
///
/// The MAX7456 only defines black, white and transparent. Code 3 is out of
/// spec but shows up in real fonts; most OSDs display it as transparent and
/// some use it as gray, so it is kept verbatim instead of being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Pixel {
    Black = 0,
    Transparent = 1,
    White = 2,
    Undefined = 3,
}

impl Pixel {
    /// Decode the two low bits of `bits`
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Pixel::Black,
            1 => Pixel::Transparent,
            2 => Pixel::White,
            _ => Pixel::Undefined,
        }
    }

    /// Raw 2-bit code
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Transparent pixels have the LSB set, the MSB is ignored.
    pub fn is_transparent(self) -> bool {
        self.bits() & 1 == 1
    }

    /// Classify an RGBA color: only pure opaque black and pure opaque white
    /// are visible, anything else becomes transparent.
    pub fn from_color(color: Rgba<u8>) -> Self {
        match color.0 {
            [0, 0, 0, 255] => Pixel::Black,
            [255, 255, 255, 255] => Pixel::White,
            _ => Pixel::Transparent,
        }
    }
}
