//! Rectangular views into RGBA images.

use image::{Rgba, RgbaImage};

/// A rectangle of a backing image. Coordinates passed to a view are relative
/// to its top-left corner.
#[derive(Debug, Clone, Copy)]
pub struct RasterView<'a> {
    image: &'a RgbaImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl<'a> RasterView<'a> {
    /// View covering the whole image
    pub fn new(image: &'a RgbaImage) -> Self {
        Self {
            image,
            x: 0,
            y: 0,
            width: image.width(),
            height: image.height(),
        }
    }

    /// View of a rectangle inside this view, or `None` if it doesn't fit.
    pub fn sub_view(&self, x: u32, y: u32, width: u32, height: u32) -> Option<RasterView<'a>> {
        let right = x.checked_add(width)?;
        let bottom = y.checked_add(height)?;
        if right > self.width || bottom > self.height {
            return None;
        }
        Some(Self {
            image: self.image,
            x: self.x + x,
            y: self.y + y,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at (x, y) relative to the view
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(*self.image.get_pixel(self.x + x, self.y + y))
    }
}

impl<'a> From<&'a RgbaImage> for RasterView<'a> {
    fn from(image: &'a RgbaImage) -> Self {
        Self::new(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_view_offsets() {
        let mut img = RgbaImage::new(4, 4);
        img.put_pixel(3, 2, Rgba([1, 2, 3, 4]));
        let view = RasterView::new(&img);
        let sub = view.sub_view(2, 1, 2, 2).unwrap();
        assert_eq!(sub.width(), 2);
        assert_eq!(sub.get(1, 1), Some(Rgba([1, 2, 3, 4])));
        assert_eq!(sub.get(2, 0), None);

        let nested = sub.sub_view(1, 1, 1, 1).unwrap();
        assert_eq!(nested.get(0, 0), Some(Rgba([1, 2, 3, 4])));
    }

    #[test]
    fn test_sub_view_must_fit() {
        let img = RgbaImage::new(4, 4);
        let view = RasterView::new(&img);
        assert!(view.sub_view(3, 0, 2, 1).is_none());
        assert!(view.sub_view(0, 0, 4, 4).is_some());
        assert!(view.sub_view(u32::MAX, 0, 2, 1).is_none());
    }
}
