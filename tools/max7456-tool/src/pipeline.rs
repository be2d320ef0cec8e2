//! Building a .mcm from a source, its parents and extra data

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hashbrown::HashSet;
use max7456_mcm::CharTable;
use tracing::{info, warn};

use crate::compose::{Duplicate, DuplicatePolicy, FontComposer, NamedFont};
use crate::extra_data::ExtraDataSet;
use crate::grid::GridLayout;
use crate::output::{OutputOptions, write_mcm};
use crate::source::{LoadedSource, SourceOrigin, load_source};

/// Per-run switches shared by `build` and `generate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub output: OutputOptions,
    /// Write blanks for missing characters instead of failing
    pub fill: bool,
    pub layout: GridLayout,
    pub duplicates: DuplicatePolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            output: OutputOptions::default(),
            fill: true,
            layout: GridLayout::default(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

/// Build `output` from the source at `input`. Returns the composed table so
/// it can be used as a parent.
pub fn build_font(
    input: &Path,
    output: &Path,
    extra: &ExtraDataSet,
    parents: &[NamedFont],
    options: &BuildOptions,
) -> Result<CharTable> {
    info!(input = %input.display(), output = %output.display(), "building font");
    let source = load_source(input, options.layout)
        .with_context(|| format!("Failed to load source: {}", input.display()))?;
    let composition = FontComposer::new(parents, extra)
        .with_duplicate_detection(options.duplicates != DuplicatePolicy::Ignore)
        .compose(&source.chars)
        .with_context(|| format!("Failed to compose font from {}", input.display()))?;

    write_mcm(output, &composition.chars, options.fill, options.output)?;

    handle_duplicates(&source, &composition.duplicates, options.duplicates)?;
    Ok(composition.chars)
}

/// Report or delete duplicated source files. Returns the deleted paths.
///
/// Only directory sources can lose characters: a file is deleted when every
/// character it holds is a duplicate, files with some unique characters are
/// reported instead.
pub fn handle_duplicates(
    source: &LoadedSource,
    duplicates: &[Duplicate],
    policy: DuplicatePolicy,
) -> Result<Vec<PathBuf>> {
    if policy == DuplicatePolicy::Ignore || duplicates.is_empty() {
        return Ok(Vec::new());
    }
    if policy == DuplicatePolicy::Report {
        for d in duplicates {
            println!(
                "{}: character {} is a duplicate of {}",
                origin_name(&source.origin),
                d.index,
                d.parent
            );
        }
        return Ok(Vec::new());
    }

    let SourceOrigin::Directory(files) = &source.origin else {
        warn!(
            source = %origin_name(&source.origin),
            count = duplicates.len(),
            "duplicates can only be removed from directory sources"
        );
        return Ok(Vec::new());
    };

    let dup: HashSet<usize> = duplicates.iter().map(|d| d.index).collect();
    let mut removed = Vec::new();
    for file in files {
        let redundant = file.indices.iter().filter(|i| dup.contains(*i)).count();
        if redundant == 0 {
            continue;
        }
        if redundant == file.indices.len() {
            std::fs::remove_file(&file.path)
                .with_context(|| format!("Failed to remove {}", file.path.display()))?;
            println!("Removed duplicate {}", file.path.display());
            removed.push(file.path.clone());
        } else {
            println!(
                "{}: {} of {} characters are duplicates, keeping it",
                file.path.display(),
                redundant,
                file.indices.len()
            );
        }
    }
    Ok(removed)
}

fn origin_name(origin: &SourceOrigin) -> String {
    match origin {
        SourceOrigin::Directory(files) => files
            .first()
            .and_then(|f| f.path.parent())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<empty directory>".to_string()),
        SourceOrigin::Grid(path) | SourceOrigin::Mcm(path) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;
    use image::RgbaImage;
    use max7456_mcm::{
        BLACK_COLOR, CHAR_BYTES, CHAR_HEIGHT, CHAR_WIDTH, Char, Decoder, MIN_CHAR_BYTES,
        TRANSPARENT_BYTE,
    };

    fn dup(index: usize) -> Duplicate {
        Duplicate {
            index,
            parent: "base".to_string(),
        }
    }

    #[test]
    fn test_remove_only_fully_redundant_files() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("001_002.png");
        let partial = dir.path().join("003_004.png");
        let unique = dir.path().join("005.png");
        for p in [&full, &partial, &unique] {
            std::fs::write(p, b"png").unwrap();
        }
        let source = LoadedSource {
            chars: CharTable::new(),
            origin: SourceOrigin::Directory(vec![
                SourceFile {
                    path: full.clone(),
                    indices: vec![1, 2],
                },
                SourceFile {
                    path: partial.clone(),
                    indices: vec![3, 4],
                },
                SourceFile {
                    path: unique.clone(),
                    indices: vec![5],
                },
            ]),
        };
        let dups = [dup(1), dup(2), dup(3)];

        let removed = handle_duplicates(&source, &dups, DuplicatePolicy::Report).unwrap();
        assert!(removed.is_empty());
        assert!(full.exists());

        let removed = handle_duplicates(&source, &dups, DuplicatePolicy::Remove).unwrap();
        assert_eq!(removed, vec![full.clone()]);
        assert!(!full.exists());
        assert!(partial.exists());
        assert!(unique.exists());
    }

    #[test]
    fn test_grid_sources_are_never_touched() {
        let dir = tempfile::tempdir().unwrap();
        let grid = dir.path().join("font.png");
        std::fs::write(&grid, b"png").unwrap();
        let source = LoadedSource {
            chars: CharTable::new(),
            origin: SourceOrigin::Grid(grid.clone()),
        };
        let removed = handle_duplicates(&source, &[dup(1)], DuplicatePolicy::Remove).unwrap();
        assert!(removed.is_empty());
        assert!(grid.exists());
    }

    #[test]
    fn test_build_font_with_parent() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        RgbaImage::from_pixel(CHAR_WIDTH, CHAR_HEIGHT, BLACK_COLOR)
            .save(src.join("065.png"))
            .unwrap();
        RgbaImage::from_pixel(CHAR_WIDTH, CHAR_HEIGHT, BLACK_COLOR)
            .save(src.join("066.png"))
            .unwrap();

        let mut parent = CharTable::new();
        parent.insert(7, Char::constant(0xAA));
        let mut black = [TRANSPARENT_BYTE; CHAR_BYTES];
        black[..MIN_CHAR_BYTES].fill(0);
        parent.insert(66, Char::from_bytes(black));
        let parents = [NamedFont {
            name: "base".to_string(),
            chars: parent,
        }];
        let options = BuildOptions {
            duplicates: DuplicatePolicy::Remove,
            ..Default::default()
        };
        let output = dir.path().join("font.mcm");
        let table =
            build_font(&src, &output, &ExtraDataSet::new(), &parents, &options).unwrap();
        assert_eq!(table.indices(), vec![7, 65, 66]);

        let file = std::fs::File::open(&output).unwrap();
        let dec = Decoder::new(std::io::BufReader::new(file)).unwrap();
        assert_eq!(dec.n_chars(), 256);
        assert_eq!(*dec.char_at(7).unwrap(), Char::constant(0xAA));
        assert!(dec.char_at(65).unwrap().pixel_bytes().iter().all(|&b| b == 0));
        assert!(dec.char_at(0).unwrap().is_blank());

        // 066 matches the parent exactly and is gone
        assert!(src.join("065.png").exists());
        assert!(!src.join("066.png").exists());
    }
}
