//! Whole-font grid images
//!
//! A grid is `columns` cells per row, each cell a 12x18 character, with
//! `margin` pixel lines between cells and around the edges. Character `i`
//! lives at column `i % columns`, row `i / columns`.

use image::{Rgba, RgbaImage};
use max7456_mcm::{
    BLACK_COLOR, CHAR_HEIGHT, CHAR_NUM, CHAR_WIDTH, Char, CharTable, EXTENDED_CHAR_NUM,
    McmError, RasterView,
};
use tracing::debug;

const EMPTY_CELL: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub margin: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 16,
            margin: 1,
        }
    }
}

// Sizes saturate on overflow. `check` rejects such layouts before any
// image is read or drawn.
impl GridLayout {
    pub fn rows(&self, char_num: usize) -> u32 {
        u32::try_from(char_num)
            .unwrap_or(u32::MAX)
            .div_ceil(self.columns.max(1))
    }

    pub fn width(&self) -> u32 {
        span(CHAR_WIDTH, self.margin, self.columns).unwrap_or(u32::MAX)
    }

    pub fn height(&self, char_num: usize) -> u32 {
        span(CHAR_HEIGHT, self.margin, self.rows(char_num)).unwrap_or(u32::MAX)
    }

    /// Top left pixel of the cell holding character `index`
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        let columns = self.columns.max(1);
        let x = span(CHAR_WIDTH, self.margin, index % columns).unwrap_or(u32::MAX);
        let y = span(CHAR_HEIGHT, self.margin, index / columns).unwrap_or(u32::MAX);
        (x, y)
    }

    fn check(&self, char_num: usize) -> Result<(), GridError> {
        if self.columns == 0 {
            return Err(GridError::NoColumns);
        }
        let rows = u32::try_from(char_num)
            .map(|n| n.div_ceil(self.columns))
            .ok();
        let fits = span(CHAR_WIDTH, self.margin, self.columns).is_some()
            && rows.and_then(|r| span(CHAR_HEIGHT, self.margin, r)).is_some();
        if !fits {
            return Err(GridError::TooLarge {
                columns: self.columns,
                margin: self.margin,
            });
        }
        Ok(())
    }
}

/// Pixels covered by `cells` cells of `size` pixels with a margin before
/// each and one after the last
fn span(size: u32, margin: u32, cells: u32) -> Option<u32> {
    size.checked_add(margin)?
        .checked_mul(cells)?
        .checked_add(margin)
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid must have at least one column")]
    NoColumns,

    #[error("grid with {columns} columns and a {margin} pixel margin is too large")]
    TooLarge { columns: u32, margin: u32 },

    #[error("invalid image width {width}, must be {expected}")]
    InvalidWidth { width: u32, expected: u32 },

    #[error(
        "invalid image height {height}, must be {standard} ({n} characters) or {extended} ({m} characters)",
        n = CHAR_NUM,
        m = EXTENDED_CHAR_NUM
    )]
    InvalidHeight {
        height: u32,
        standard: u32,
        extended: u32,
    },

    #[error(transparent)]
    Mcm(#[from] McmError),
}

/// Read every non-blank cell of a grid image. The image height selects
/// between 256 and 512 characters. Layouts with a single row for both sizes
/// read all 512 cells.
pub fn import_grid(img: &RgbaImage, layout: GridLayout) -> Result<CharTable, GridError> {
    layout.check(EXTENDED_CHAR_NUM)?;
    let expected = layout.width();
    if img.width() != expected {
        return Err(GridError::InvalidWidth {
            width: img.width(),
            expected,
        });
    }
    let standard = layout.height(CHAR_NUM);
    let extended = layout.height(EXTENDED_CHAR_NUM);
    let char_num = if img.height() == extended {
        EXTENDED_CHAR_NUM
    } else if img.height() == standard {
        CHAR_NUM
    } else {
        return Err(GridError::InvalidHeight {
            height: img.height(),
            standard,
            extended,
        });
    };

    let view = RasterView::new(img);
    let mut chars = CharTable::new();
    for index in 0..char_num {
        let (x, y) = layout.cell_origin(index);
        debug!(index, x, y, "importing grid cell");
        let c = Char::from_image(&view, x, y)?;
        if !c.is_blank() {
            chars.insert(index, c);
        }
    }
    Ok(chars)
}

/// Draw `chars` into a grid. Margins are black, cells in the last row past
/// the final character are fully transparent.
pub fn render_grid(chars: &[Char], layout: GridLayout) -> Result<RgbaImage, GridError> {
    let n = chars.len();
    layout.check(n)?;
    let mut img = RgbaImage::from_pixel(layout.width(), layout.height(n), BLACK_COLOR);
    let cells = layout.rows(n) as usize * layout.columns as usize;
    for index in 0..cells {
        let (x0, y0) = layout.cell_origin(index);
        match chars.get(index) {
            Some(c) => {
                let cell = c.image(None);
                for (x, y, color) in cell.enumerate_pixels() {
                    img.put_pixel(x0 + x, y0 + y, *color);
                }
            }
            None => {
                for y in y0..y0 + CHAR_HEIGHT {
                    for x in x0..x0 + CHAR_WIDTH {
                        img.put_pixel(x, y, EMPTY_CELL);
                    }
                }
            }
        }
    }
    Ok(img)
}
