//! Primary font sources
//!
//! A source is one of:
//! - a directory of PNG files, each named after the characters it holds
//!   (`065.png`, `010_013.png` for 10 through 13, `001-005.png` for 1 and 5)
//! - a grid PNG of the whole font, see [`crate::grid`]
//! - an existing `.mcm` file

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use max7456_mcm::{CHAR_HEIGHT, CHAR_WIDTH, Char, CharTable, Decoder, McmError, RasterView};
use tracing::debug;

use crate::grid::{GridError, GridLayout, import_grid};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error decoding {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("{0}: unsupported source, must be a directory, a .png or a .mcm file")]
    Unsupported(PathBuf),

    #[error("invalid number {value:?} in image filename {name:?}")]
    InvalidNumber { name: String, value: String },

    #[error("invalid image width {0}, must be a multiple of {w}", w = CHAR_WIDTH)]
    InvalidWidth(u32),

    #[error("invalid image height {0}, must be a multiple of {h}", h = CHAR_HEIGHT)]
    InvalidHeight(u32),

    #[error("image {name:?} with size {width}x{height} must contain {expected} characters, {declared} declared")]
    CountMismatch {
        name: String,
        width: u32,
        height: u32,
        expected: usize,
        declared: usize,
    },

    #[error("duplicate character {index} in {path}")]
    DuplicateChar { index: usize, path: PathBuf },

    #[error("{path}: {source}")]
    Mcm { path: PathBuf, source: McmError },

    #[error("{path}: {source}")]
    Grid { path: PathBuf, source: GridError },
}

/// A PNG from a directory source and the characters it declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    Directory(Vec<SourceFile>),
    Grid(PathBuf),
    Mcm(PathBuf),
}

/// Characters read from a source, along with where they came from
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub chars: CharTable,
    pub origin: SourceOrigin,
}

/// Load a source, picking the importer from the path
pub fn load_source(path: &Path, layout: GridLayout) -> Result<LoadedSource, SourceError> {
    if path.is_dir() {
        return load_directory(path);
    }
    match extension(path).as_deref() {
        Some("png") => load_grid(path, layout),
        Some("mcm") => load_mcm(path),
        _ => Err(SourceError::Unsupported(path.to_path_buf())),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn open_png(path: &Path) -> Result<RgbaImage, SourceError> {
    let img = image::ImageReader::open(path)
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if img.format() != Some(image::ImageFormat::Png) {
        return Err(SourceError::Unsupported(path.to_path_buf()));
    }
    let img = img.decode().map_err(|source| SourceError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgba8())
}

/// Decode a .mcm file
pub fn decode_mcm(path: &Path) -> Result<Decoder, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|source| SourceError::Mcm {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_mcm(path: &Path) -> Result<LoadedSource, SourceError> {
    let chars = decode_mcm(path)?.into_table();
    Ok(LoadedSource {
        chars,
        origin: SourceOrigin::Mcm(path.to_path_buf()),
    })
}

pub fn load_grid(path: &Path, layout: GridLayout) -> Result<LoadedSource, SourceError> {
    let img = open_png(path)?;
    let chars = import_grid(&img, layout).map_err(|source| SourceError::Grid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LoadedSource {
        chars,
        origin: SourceOrigin::Grid(path.to_path_buf()),
    })
}

/// Import every PNG in `dir`. Other files and subdirectories are skipped.
pub fn load_directory(dir: &Path) -> Result<LoadedSource, SourceError> {
    let io_err = |source: std::io::Error| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && extension(&path).as_deref() == Some("png") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut chars = CharTable::new();
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let img = open_png(&path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let indices = parse_char_indices(&stem, img.width(), img.height())?;
        let per_row = (img.width() / CHAR_WIDTH) as usize;
        let view = RasterView::new(&img);
        for (ii, &index) in indices.iter().enumerate() {
            if chars.contains(index) {
                return Err(SourceError::DuplicateChar { index, path });
            }
            let x0 = (ii % per_row) as u32 * CHAR_WIDTH;
            let y0 = (ii / per_row) as u32 * CHAR_HEIGHT;
            debug!(index, path = %path.display(), x0, y0, "importing character");
            let c = Char::from_image(&view, x0, y0).map_err(|source| SourceError::Mcm {
                path: path.clone(),
                source,
            })?;
            chars.insert(index, c);
        }
        files.push(SourceFile { path, indices });
    }
    Ok(LoadedSource {
        chars,
        origin: SourceOrigin::Directory(files),
    })
}

/// Character indices declared by an image file name. The image must hold
/// exactly as many 12x18 cells as the name declares.
pub fn parse_char_indices(stem: &str, width: u32, height: u32) -> Result<Vec<usize>, SourceError> {
    if width % CHAR_WIDTH != 0 {
        return Err(SourceError::InvalidWidth(width));
    }
    if height % CHAR_HEIGHT != 0 {
        return Err(SourceError::InvalidHeight(height));
    }
    let expected = ((width / CHAR_WIDTH) * (height / CHAR_HEIGHT)) as usize;

    let mut indices = Vec::with_capacity(expected);
    let mut declared = 0usize;
    for group in stem.split('-') {
        let mut prev: Option<usize> = None;
        for item in group.split('_') {
            let n = item
                .parse::<usize>()
                .map_err(|_| SourceError::InvalidNumber {
                    name: stem.to_string(),
                    value: item.to_string(),
                })?;
            let first = prev.map_or(n, |p| p.saturating_add(1));
            let count = n.checked_sub(first).map_or(0, |d| d.saturating_add(1));
            declared = declared.saturating_add(count);
            if declared <= expected {
                indices.extend(first..=n);
            }
            prev = Some(n);
        }
    }
    if declared != expected {
        return Err(SourceError::CountMismatch {
            name: stem.to_string(),
            width,
            height,
            expected,
            declared,
        });
    }
    Ok(indices)
}
