//! Output files
//!
//! Outputs are rendered in memory first and only then written, so a failed
//! encode never leaves anything on disk. Existing files are kept unless
//! `force` is set.

use std::fs::{File, OpenOptions};
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use image::{ImageFormat, RgbaImage};
use max7456_mcm::{CharTable, Encoder};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Overwrite existing files
    pub force: bool,
}

fn open_output(path: &Path, options: OutputOptions) -> Result<File> {
    let mut open = OpenOptions::new();
    open.write(true);
    if options.force {
        open.create(true).truncate(true);
    } else {
        open.create_new(true);
    }
    match open.open(path) {
        Ok(f) => Ok(f),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            bail!(
                "{} already exists, use --force to overwrite it",
                path.display()
            )
        }
        Err(e) => {
            Err(e).with_context(|| format!("Failed to create output: {}", path.display()))
        }
    }
}

/// Write `bytes` to `path`. A partially written file is removed.
pub fn write_output(path: &Path, bytes: &[u8], options: OutputOptions) -> Result<()> {
    let mut file = open_output(path, options)?;
    let written = file.write_all(bytes).and_then(|_| file.sync_all());
    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = std::fs::remove_file(path) {
            debug!(path = %path.display(), error = %remove_err, "failed to remove partial output");
        }
        return Err(e).with_context(|| format!("Failed to write output: {}", path.display()));
    }
    info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

/// Encode `table` as a .mcm file
pub fn write_mcm(path: &Path, table: &CharTable, fill: bool, options: OutputOptions) -> Result<()> {
    let bytes = Encoder::new()
        .with_fill(fill)
        .encode_to_vec(table)
        .with_context(|| format!("Failed to encode {}", path.display()))?;
    write_output(path, &bytes, options)
}

pub fn write_png(path: &Path, img: &RgbaImage, options: OutputOptions) -> Result<()> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .with_context(|| format!("Failed to encode PNG: {}", path.display()))?;
    write_output(path, buf.get_ref(), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use max7456_mcm::Char;

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_output(&path, b"first", OutputOptions::default()).unwrap();

        let err = write_output(&path, b"second", OutputOptions::default()).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        write_output(&path, b"2nd", OutputOptions { force: true }).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"2nd");
    }

    #[test]
    fn test_failed_encode_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.mcm");
        let mut table = CharTable::new();
        table.insert(1, Char::blank());
        let err = write_mcm(&path, &table, false, OutputOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("missing character 0"));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("char.png");
        write_png(&path, &Char::blank().image(None), OutputOptions::default()).unwrap();
        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (12, 18));
    }
}
