//! Incremental character construction, 2 bits at a time.

use crate::{CHAR_BYTES, CHAR_HEIGHT, CHAR_WIDTH, Char, McmError, Pixel, RasterView};

/// Builds a [`Char`] by appending pixels. Four pixels are packed into each
/// byte, most significant pair first.
#[derive(Debug, Clone, Default)]
pub struct CharBuilder {
    data: Vec<u8>,
    /// Slot (0-3) the next pixel goes into
    slot: u8,
}

impl CharBuilder {
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(CHAR_BYTES),
            slot: 0,
        }
    }

    pub fn reset(&mut self) {
        self.data.clear();
        self.slot = 0;
    }

    /// No pixel has been appended since the last reset
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Exactly 64 bytes have been filled
    pub fn is_complete(&self) -> bool {
        self.data.len() == CHAR_BYTES && self.slot == 0
    }

    /// Bytes started so far, including a partially filled one
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Append a raw 2-bit code. Codes are stored verbatim: some OSDs
    /// understand 3 as gray and others use the reserved region, so nothing is
    /// rewritten here.
    pub fn append_pixel(&mut self, code: u8) -> Result<(), McmError> {
        if code > 3 {
            return Err(McmError::InvalidPixel(code));
        }
        if self.is_complete() {
            return Err(McmError::CharOverflow);
        }
        let shift = 6 - 2 * self.slot;
        if self.slot == 0 {
            self.data.push(code << shift);
        } else if let Some(last) = self.data.last_mut() {
            *last |= code << shift;
        }
        self.slot = (self.slot + 1) % 4;
        Ok(())
    }

    /// Reset and sample the 12x18 window of `view` at (x0, y0). Opaque
    /// black and opaque white become black and white pixels, everything else
    /// transparent. The remaining slots up to 64 bytes are filled with
    /// transparent pixels.
    pub fn set_image(&mut self, view: &RasterView<'_>, x0: u32, y0: u32) -> Result<(), McmError> {
        self.reset();
        for y in y0..y0 + CHAR_HEIGHT {
            for x in x0..x0 + CHAR_WIDTH {
                let color = view.get(x, y).ok_or(McmError::OutOfBounds {
                    x,
                    y,
                    width: view.width(),
                    height: view.height(),
                })?;
                self.append_pixel(Pixel::from_color(color).bits())?;
            }
        }
        while !self.is_complete() {
            self.append_pixel(Pixel::Transparent.bits())?;
        }
        Ok(())
    }

    /// Take the finished character and reset the builder
    pub fn finish(&mut self) -> Result<Char, McmError> {
        if !self.is_complete() {
            return Err(McmError::Incomplete {
                bytes: self.data.len(),
            });
        }
        let c = Char::from_data(&self.data)?;
        self.reset();
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BLACK_COLOR, MIN_CHAR_BYTES, TRANSPARENT_BYTE, WHITE_COLOR};
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_pixel_packing() {
        let mut b = CharBuilder::new();
        for p in [0, 1, 2, 3] {
            b.append_pixel(p).unwrap();
        }
        assert_eq!(b.data, vec![0x1B]);
        assert_eq!(b.slot, 0);
    }

    #[test]
    fn test_partial_byte() {
        let mut b = CharBuilder::new();
        assert!(b.is_empty());
        b.append_pixel(2).unwrap();
        assert!(!b.is_empty());
        assert_eq!(b.len(), 1);
        assert_eq!(b.data[0], 0b10_00_00_00);
    }

    #[test]
    fn test_rejects_invalid_pixel() {
        let mut b = CharBuilder::new();
        assert!(matches!(b.append_pixel(4), Err(McmError::InvalidPixel(4))));
        assert!(b.is_empty());
    }

    #[test]
    fn test_complete_and_overflow() {
        let mut b = CharBuilder::new();
        for _ in 0..CHAR_BYTES * 4 - 1 {
            b.append_pixel(1).unwrap();
        }
        assert!(!b.is_complete());
        assert!(matches!(b.finish(), Err(McmError::Incomplete { bytes: 64 })));
        b.append_pixel(1).unwrap();
        assert!(b.is_complete());
        assert!(matches!(b.append_pixel(1), Err(McmError::CharOverflow)));

        let c = b.finish().unwrap();
        assert_eq!(c, Char::blank());
        assert!(b.is_empty());
    }

    #[test]
    fn test_set_image_transparent() {
        let img = RgbaImage::from_pixel(CHAR_WIDTH, CHAR_HEIGHT, Rgba([10, 20, 30, 255]));
        let c = Char::from_image(&RasterView::new(&img), 0, 0).unwrap();
        assert!(c.is_blank());
        assert_eq!(c, Char::blank());
    }

    #[test]
    fn test_set_image_with_offset() {
        let mut img = RgbaImage::from_pixel(CHAR_WIDTH + 2, CHAR_HEIGHT + 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(2, 1, BLACK_COLOR);
        img.put_pixel(13, 18, WHITE_COLOR);
        let c = Char::from_image(&RasterView::new(&img), 2, 1).unwrap();

        let data = c.data();
        assert_eq!(data[0], 0b00_01_01_01);
        assert_eq!(data[MIN_CHAR_BYTES - 1], 0b01_01_01_10);
        assert!(c.metadata().iter().all(|&b| b == TRANSPARENT_BYTE));
    }

    #[test]
    fn test_set_image_out_of_bounds() {
        let img = RgbaImage::new(CHAR_WIDTH, CHAR_HEIGHT - 1);
        let mut b = CharBuilder::new();
        let err = b.set_image(&RasterView::new(&img), 0, 0).unwrap_err();
        assert!(matches!(err, McmError::OutOfBounds { y: 17, .. }));
    }
}
