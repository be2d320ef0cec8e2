//! Exporting .mcm fonts to other formats

use std::path::Path;

use anyhow::{Context, Result};
use max7456_mcm::{Char, CharTable};
use tracing::{debug, info};

use crate::grid::{GridLayout, render_grid};
use crate::output::{OutputOptions, write_output, write_png};
use crate::source::decode_mcm;

/// Write each character of `input` as `NNN.png` inside `dir`. Blank
/// characters are skipped unless `add_blanks` is set. Returns the number of
/// images written.
pub fn extract_chars(
    input: &Path,
    dir: &Path,
    add_blanks: bool,
    options: OutputOptions,
) -> Result<usize> {
    let dec = decode_mcm(input)?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    let mut written = 0;
    for (ii, c) in dec.chars().iter().enumerate() {
        if !add_blanks && c.is_blank() {
            continue;
        }
        let path = dir.join(format!("{ii:03}.png"));
        debug!(index = ii, path = %path.display(), "extracting character");
        write_png(&path, &c.image(None), options)?;
        written += 1;
    }
    info!(count = written, dir = %dir.display(), "extracted characters");
    Ok(written)
}

/// Render `input` as a grid image
pub fn export_png(
    input: &Path,
    output: &Path,
    layout: GridLayout,
    options: OutputOptions,
) -> Result<()> {
    let dec = decode_mcm(input)?;
    write_grid(dec.chars(), output, layout, options)
}

/// Render a composed table as a grid image
pub fn write_preview(
    table: &CharTable,
    output: &Path,
    layout: GridLayout,
    options: OutputOptions,
) -> Result<()> {
    write_grid(&table.to_filled_vec(), output, layout, options)
}

fn write_grid(chars: &[Char], output: &Path, layout: GridLayout, options: OutputOptions) -> Result<()> {
    let img = render_grid(chars, layout)
        .with_context(|| format!("Failed to render {}", output.display()))?;
    write_png(output, &img, options)
}

/// Concatenated 64-byte records, optionally with the pixel order inside each
/// pixel byte reversed
pub fn font_bin(chars: &[Char], flip_horizontal_pixels: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(chars.len() * max7456_mcm::CHAR_BYTES);
    for c in chars {
        if flip_horizontal_pixels {
            out.extend_from_slice(c.flip_byte_pixels().as_bytes());
        } else {
            out.extend_from_slice(c.as_bytes());
        }
    }
    out
}

pub fn export_bin(
    input: &Path,
    output: &Path,
    flip_horizontal_pixels: bool,
    options: OutputOptions,
) -> Result<()> {
    let dec = decode_mcm(input)?;
    write_output(output, &font_bin(dec.chars(), flip_horizontal_pixels), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use max7456_mcm::{CHAR_BYTES, Encoder, MIN_CHAR_BYTES, TRANSPARENT_BYTE};

    fn write_font(dir: &Path) -> std::path::PathBuf {
        let mut table = CharTable::new();
        let mut data = [TRANSPARENT_BYTE; CHAR_BYTES];
        data[0] = 0b00_01_10_11;
        data[MIN_CHAR_BYTES] = 0b00_01_10_11;
        table.insert(1, Char::from_bytes(data));
        table.insert(200, Char::constant(0));
        let path = dir.join("font.mcm");
        std::fs::write(&path, Encoder::new().encode_to_vec(&table).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_font_bin() {
        let mut data = [TRANSPARENT_BYTE; CHAR_BYTES];
        data[0] = 0b00_01_10_11;
        data[CHAR_BYTES - 1] = 0b00_01_10_11;
        let chars = [Char::from_bytes(data), Char::blank()];

        let plain = font_bin(&chars, false);
        assert_eq!(plain.len(), 2 * CHAR_BYTES);
        assert_eq!(plain[0], 0b00_01_10_11);

        let flipped = font_bin(&chars, true);
        assert_eq!(flipped[0], 0b11_10_01_00);
        // Reserved region is copied as is
        assert_eq!(flipped[CHAR_BYTES - 1], 0b00_01_10_11);
        assert_eq!(&flipped[CHAR_BYTES..], Char::blank().as_bytes());
    }

    #[test]
    fn test_export_bin() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_font(dir.path());
        let output = dir.path().join("font.bin");
        export_bin(&input, &output, false, OutputOptions::default()).unwrap();
        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(bytes.len(), 256 * CHAR_BYTES);
        assert_eq!(bytes[CHAR_BYTES], 0b00_01_10_11);
        assert_eq!(bytes[200 * CHAR_BYTES], 0);
    }

    #[test]
    fn test_extract_skips_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_font(dir.path());
        let out = dir.path().join("chars");

        let n = extract_chars(&input, &out, false, OutputOptions::default()).unwrap();
        assert_eq!(n, 2);
        assert!(out.join("001.png").exists());
        assert!(out.join("200.png").exists());
        assert!(!out.join("000.png").exists());

        let n = extract_chars(&input, &out, true, OutputOptions { force: true }).unwrap();
        assert_eq!(n, 256);
        assert!(out.join("000.png").exists());
    }

    #[test]
    fn test_export_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_font(dir.path());
        let output = dir.path().join("font.png");
        export_png(&input, &output, GridLayout::default(), OutputOptions::default()).unwrap();
        let img = image::open(&output).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (209, 305));
    }
}
