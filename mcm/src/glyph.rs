//! Packed 64-byte characters.

use image::{Rgba, RgbaImage};

use crate::{
    CHAR_BYTES, CHAR_HEIGHT, CHAR_WIDTH, CharBuilder, DEFAULT_TRANSPARENT_COLOR, MIN_CHAR_BYTES,
    McmError, Pixel, RasterView, TRANSPARENT_BYTE,
    pixel::{BLACK_COLOR, WHITE_COLOR},
};

/// Pixels packed in each byte
const PIXELS_PER_BYTE: u32 = 4;

/// Bytes per pixel row (12 pixels / 4)
const BYTES_PER_ROW: u32 = CHAR_WIDTH / PIXELS_PER_BYTE;

/// A character in the character map.
///
/// Each character has 12x18 pixels of 2 bits each, so ((12*18)*2)/8 = 54
/// bytes hold the visible data. MCM files use 64 bytes per character to make
/// addressing easier; the trailing 10 bytes are never displayed and can carry
/// metadata.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Char {
    data: [u8; CHAR_BYTES],
}

/// One 2-bit code yielded by [`Char::pixels`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharPixel {
    /// Column, always < 12
    pub x: u32,
    /// Row, >= 18 for the reserved region
    pub y: u32,
    /// True for codes outside the visible 12x18 area
    pub unused: bool,
    pub pixel: Pixel,
}

impl Char {
    /// Character with every byte set to `byte`
    pub const fn constant(byte: u8) -> Self {
        Self {
            data: [byte; CHAR_BYTES],
        }
    }

    /// Fully transparent character, including the reserved region
    pub const fn blank() -> Self {
        Self::constant(TRANSPARENT_BYTE)
    }

    pub const fn from_bytes(data: [u8; CHAR_BYTES]) -> Self {
        Self { data }
    }

    /// Character from its raw data, which must be exactly 64 bytes
    pub fn from_data(data: &[u8]) -> Result<Self, McmError> {
        let data: [u8; CHAR_BYTES] = data
            .try_into()
            .map_err(|_| McmError::InvalidCharSize(data.len()))?;
        Ok(Self { data })
    }

    /// Character sampled from the 12x18 pixels of `view` starting at (x0, y0)
    pub fn from_image(view: &RasterView<'_>, x0: u32, y0: u32) -> Result<Self, McmError> {
        let mut builder = CharBuilder::new();
        builder.set_image(view, x0, y0)?;
        builder.finish()
    }

    /// Copy of the raw data
    pub fn data(&self) -> [u8; CHAR_BYTES] {
        self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The 54 bytes holding visible pixels
    pub fn pixel_bytes(&self) -> &[u8] {
        &self.data[..MIN_CHAR_BYTES]
    }

    /// The 10 reserved bytes after the pixel data
    pub fn metadata(&self) -> &[u8] {
        &self.data[MIN_CHAR_BYTES..]
    }

    /// Every 2-bit code in the character, row-major, MSB pair first.
    ///
    /// This is the one place that knows how bytes map to pixels. The 40 codes
    /// stored in the reserved region come out with `unused` set.
    pub fn pixels(&self) -> impl Iterator<Item = CharPixel> + '_ {
        self.data.iter().enumerate().flat_map(|(ii, &byte)| {
            let ii = ii as u32;
            let y = ii / BYTES_PER_ROW;
            let x0 = (ii % BYTES_PER_ROW) * PIXELS_PER_BYTE;
            (0..PIXELS_PER_BYTE).map(move |jj| CharPixel {
                x: x0 + jj,
                y,
                unused: y >= CHAR_HEIGHT,
                pixel: Pixel::from_bits(byte >> (6 - 2 * jj)),
            })
        })
    }

    /// Calls `f` for every code yielded by [`Char::pixels`]
    pub fn for_each_pixel(&self, mut f: impl FnMut(CharPixel)) {
        for p in self.pixels() {
            f(p);
        }
    }

    /// Render the character as a 12x18 image. Undefined pixels (code 3) are
    /// drawn as transparent. If no transparent color is given,
    /// [`DEFAULT_TRANSPARENT_COLOR`] is used. See [`Char::image_strict`] for
    /// finer control.
    pub fn image(&self, transparent: Option<Rgba<u8>>) -> RgbaImage {
        let transparent = transparent.unwrap_or(DEFAULT_TRANSPARENT_COLOR);
        let mut im = RgbaImage::new(CHAR_WIDTH, CHAR_HEIGHT);
        for p in self.pixels().filter(|p| !p.unused) {
            let color = match p.pixel {
                Pixel::Black => BLACK_COLOR,
                Pixel::White => WHITE_COLOR,
                Pixel::Transparent | Pixel::Undefined => transparent,
            };
            im.put_pixel(p.x, p.y, color);
        }
        im
    }

    /// Render the character as a 12x18 image, failing on the first
    /// transparent or undefined pixel whose color wasn't provided.
    pub fn image_strict(
        &self,
        transparent: Option<Rgba<u8>>,
        undefined: Option<Rgba<u8>>,
    ) -> Result<RgbaImage, McmError> {
        let mut im = RgbaImage::new(CHAR_WIDTH, CHAR_HEIGHT);
        for p in self.pixels().filter(|p| !p.unused) {
            let color = match p.pixel {
                Pixel::Black => Some(BLACK_COLOR),
                Pixel::White => Some(WHITE_COLOR),
                Pixel::Transparent => transparent,
                Pixel::Undefined => undefined,
            };
            let color = color.ok_or(McmError::NoColor {
                pixel: p.pixel,
                x: p.x,
                y: p.y,
            })?;
            im.put_pixel(p.x, p.y, color);
        }
        Ok(im)
    }

    /// True iff every visible pixel is transparent (code 1)
    pub fn is_blank(&self) -> bool {
        self.pixels()
            .filter(|p| !p.unused)
            .all(|p| p.pixel == Pixel::Transparent)
    }

    /// Same visible pixels, regardless of the reserved region
    pub fn visually_equal(&self, other: &Char) -> bool {
        self.pixel_bytes() == other.pixel_bytes()
    }

    /// True if the reserved region holds only transparent fill
    pub fn metadata_is_blank(&self) -> bool {
        self.metadata().iter().all(|&b| b == TRANSPARENT_BYTE)
    }

    /// Character with the order of the four pixels inside every pixel byte
    /// reversed, for displays that shift pixels out LSB pair first. The
    /// reserved region is copied untouched.
    pub fn flip_byte_pixels(&self) -> Self {
        let mut data = self.data;
        for b in data[..MIN_CHAR_BYTES].iter_mut() {
            *b = flip_byte_pixels(*b);
        }
        Self { data }
    }
}

/// Reverse the order of the four pixels stored in a byte
fn flip_byte_pixels(b: u8) -> u8 {
    (b >> 6) | (b << 6) | ((b >> 2) & (0b11 << 2)) | ((b << 2) & (0b11 << 4))
}

impl std::fmt::Debug for Char {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Char(")?;
        for b in &self.data {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl Default for Char {
    fn default() -> Self {
        Self::blank()
    }
}

impl AsRef<[u8]> for Char {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_with_pixel(x: u32, y: u32, pixel: Pixel) -> Char {
        let mut data = Char::blank().data();
        let index = (y * CHAR_WIDTH + x) as usize;
        let shift = 6 - 2 * (index % 4);
        let byte = &mut data[index / 4];
        *byte = (*byte & !(0b11 << shift)) | (pixel.bits() << shift);
        Char::from_bytes(data)
    }

    #[test]
    fn test_from_data_size() {
        assert!(Char::from_data(&[0x55; CHAR_BYTES]).is_ok());
        let err = Char::from_data(&[0x55; MIN_CHAR_BYTES]).unwrap_err();
        assert!(matches!(err, McmError::InvalidCharSize(54)));
    }

    #[test]
    fn test_pixels_layout() {
        let pixels: Vec<_> = Char::blank().pixels().collect();
        assert_eq!(pixels.len(), CHAR_BYTES * 4);
        assert_eq!(pixels[0].x, 0);
        assert_eq!(pixels[11].x, 11);
        assert_eq!((pixels[12].x, pixels[12].y), (0, 1));
        // 216 visible pixels, the rest is the reserved region
        assert_eq!(pixels.iter().filter(|p| !p.unused).count(), 216);
        assert!(pixels[215].y == 17 && !pixels[215].unused);
        assert!(pixels[216].y == 18 && pixels[216].unused);
    }

    #[test]
    fn test_pixels_msb_first() {
        let mut data = [TRANSPARENT_BYTE; CHAR_BYTES];
        data[0] = 0b00_01_10_11;
        let c = Char::from_bytes(data);
        let first: Vec<_> = c.pixels().take(4).map(|p| p.pixel).collect();
        assert_eq!(
            first,
            vec![Pixel::Black, Pixel::Transparent, Pixel::White, Pixel::Undefined]
        );
    }

    #[test]
    fn test_is_blank() {
        assert!(Char::blank().is_blank());
        assert!(!char_with_pixel(5, 17, Pixel::White).is_blank());
        assert!(!char_with_pixel(0, 0, Pixel::Black).is_blank());
        assert!(!char_with_pixel(3, 3, Pixel::Undefined).is_blank());

        // Metadata doesn't count
        let mut data = Char::blank().data();
        data[60] = 0;
        assert!(Char::from_bytes(data).is_blank());
    }

    #[test]
    fn test_visual_equality_ignores_metadata() {
        let a = char_with_pixel(1, 1, Pixel::Black);
        let mut data = a.data();
        data[CHAR_BYTES - 1] = 0x12;
        let b = Char::from_bytes(data);
        assert_ne!(a, b);
        assert!(a.visually_equal(&b));
        assert!(a.metadata_is_blank());
        assert!(!b.metadata_is_blank());
        assert!(!a.visually_equal(&Char::blank()));
    }

    #[test]
    fn test_image_colors() {
        let c = char_with_pixel(2, 4, Pixel::White);
        let c = Char::from_bytes({
            let mut d = c.data();
            d[0] = 0b00_11_01_01;
            d
        });
        let im = c.image(None);
        assert_eq!(im.dimensions(), (CHAR_WIDTH, CHAR_HEIGHT));
        assert_eq!(*im.get_pixel(0, 0), BLACK_COLOR);
        assert_eq!(*im.get_pixel(1, 0), DEFAULT_TRANSPARENT_COLOR);
        assert_eq!(*im.get_pixel(2, 4), WHITE_COLOR);

        let red = Rgba([255, 0, 0, 255]);
        assert_eq!(*c.image(Some(red)).get_pixel(1, 0), red);
    }

    #[test]
    fn test_image_strict_requires_colors() {
        let c = char_with_pixel(7, 9, Pixel::Undefined);
        let gray = Some(DEFAULT_TRANSPARENT_COLOR);

        let err = c.image_strict(gray, None).unwrap_err();
        assert!(matches!(
            err,
            McmError::NoColor {
                pixel: Pixel::Undefined,
                x: 7,
                y: 9
            }
        ));
        assert!(c.image_strict(None, gray).is_err());

        let red = Rgba([255, 0, 0, 255]);
        let im = c.image_strict(gray, Some(red)).unwrap();
        assert_eq!(*im.get_pixel(7, 9), red);
    }

    #[test]
    fn test_flip_byte_pixels() {
        assert_eq!(flip_byte_pixels(0b00_01_10_11), 0b11_10_01_00);
        assert_eq!(flip_byte_pixels(TRANSPARENT_BYTE), TRANSPARENT_BYTE);

        let c = char_with_pixel(0, 3, Pixel::Black);
        let flipped = c.flip_byte_pixels();
        assert_eq!(flipped, char_with_pixel(3, 3, Pixel::Black));
        assert_eq!(flipped.flip_byte_pixels(), c);

        let mut data = Char::blank().data();
        data[CHAR_BYTES - 1] = 0b00_00_00_01;
        let c = Char::from_bytes(data);
        assert_eq!(c.flip_byte_pixels().metadata(), c.metadata());
    }
}
