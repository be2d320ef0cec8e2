//! Generating several fonts from a TOML config
//!
//! ```toml
//! previews = true
//! extra = ["global.toml"]
//! default = "base"
//!
//! [[fonts]]
//! source = "base"
//! extra = true
//!
//! [[fonts]]
//! source = "bold.png"
//! output = "out/bold.mcm"
//! ```
//!
//! Every font except the default one inherits from the default font, or from
//! the font named by its `parent` key. Parents are always built first.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use hashbrown::{HashMap, HashSet};
use max7456_mcm::CharTable;
use serde::Deserialize;
use tracing::info;

use crate::compose::NamedFont;
use crate::export::write_preview;
use crate::extra_data::ExtraDataSet;
use crate::pipeline::{BuildOptions, build_font};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error parsing config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("extra data file {path} is not readable: {source}")]
    ExtraFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("extra data file {0} is a directory, not a file")]
    ExtraIsDirectory(PathBuf),

    #[error("source {0} is empty")]
    EmptySource(usize),

    #[error("source {name:?} ({path}) doesn't exist: {source}")]
    MissingSource {
        name: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("source {0:?} is declared more than once")]
    DuplicateSource(String),

    #[error("default font {name:?} not found in the fonts list ({available})")]
    UnknownDefault { name: String, available: String },

    #[error("parent {parent:?} of font {font:?} not found in the fonts list")]
    UnknownParent { font: String, parent: String },

    #[error("output of font {0:?} would overwrite its source")]
    OutputIsSource(String),

    #[error("fonts inherit from each other: {0}")]
    Cycle(String),
}

/// Extra data files for a single font
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExtraFiles {
    /// `true` means `<source stem>.toml`
    Enabled(bool),
    File(PathBuf),
    Files(Vec<PathBuf>),
}

impl Default for ExtraFiles {
    fn default() -> Self {
        ExtraFiles::Enabled(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontConfig {
    pub source: String,
    #[serde(default)]
    pub extra: ExtraFiles,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub parent: Option<String>,
}

impl FontConfig {
    pub fn source_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.source)
    }

    pub fn extra_files(&self, dir: &Path) -> Vec<PathBuf> {
        let nonempty = |p: &PathBuf| !p.as_os_str().is_empty();
        match &self.extra {
            ExtraFiles::Enabled(false) => Vec::new(),
            ExtraFiles::Enabled(true) => vec![self.source_path(dir).with_extension("toml")],
            ExtraFiles::File(p) => std::iter::once(p)
                .filter(|p| nonempty(*p))
                .map(|p| dir.join(p))
                .collect(),
            ExtraFiles::Files(files) => files
                .iter()
                .filter(|p| nonempty(*p))
                .map(|p| dir.join(p))
                .collect(),
        }
    }

    /// `output`, or `<source stem>.mcm`
    pub fn output_path(&self, dir: &Path) -> PathBuf {
        match &self.output {
            Some(output) => dir.join(output),
            None => self.source_path(dir).with_extension("mcm"),
        }
    }

    /// Next to the output, as `<stem>.png`, or `<stem>.preview.png` when
    /// that's the source itself
    pub fn preview_path(&self, dir: &Path) -> PathBuf {
        let output = self.output_path(dir);
        let preview = output.with_extension("png");
        if preview == self.source_path(dir) {
            output.with_extension("preview.png")
        } else {
            preview
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateConfig {
    #[serde(default)]
    pub previews: bool,
    #[serde(default)]
    pub extra: Vec<PathBuf>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub fonts: Vec<FontConfig>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub dir: PathBuf,
}

impl GenerateConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating. `path` is where the text came from.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: GenerateConfig =
            toml::from_str(text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn global_extra_files(&self) -> Vec<PathBuf> {
        self.extra.iter().map(|p| self.dir.join(p)).collect()
    }

    pub fn font(&self, name: &str) -> Option<&FontConfig> {
        self.fonts.iter().find(|f| f.source == name)
    }

    /// The font `font` inherits from, if any
    pub fn parent_of<'a>(&'a self, font: &'a FontConfig) -> Option<&'a str> {
        if let Some(parent) = &font.parent {
            return Some(parent);
        }
        self.default
            .as_deref()
            .filter(|default| *default != font.source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in self.global_extra_files() {
            check_extra_file(&path)?;
        }

        if let Some(name) = &self.default {
            if self.font(name).is_none() {
                let available: Vec<String> =
                    self.fonts.iter().map(|f| format!("{:?}", f.source)).collect();
                return Err(ConfigError::UnknownDefault {
                    name: name.clone(),
                    available: available.join(", "),
                });
            }
        }

        let mut seen = HashSet::new();
        for (ii, font) in self.fonts.iter().enumerate() {
            if font.source.is_empty() {
                return Err(ConfigError::EmptySource(ii + 1));
            }
            if !seen.insert(font.source.as_str()) {
                return Err(ConfigError::DuplicateSource(font.source.clone()));
            }
            let path = font.source_path(&self.dir);
            if let Err(source) = std::fs::metadata(&path) {
                return Err(ConfigError::MissingSource {
                    name: font.source.clone(),
                    path,
                    source,
                });
            }
            if font.output_path(&self.dir) == path {
                return Err(ConfigError::OutputIsSource(font.source.clone()));
            }
            for extra in font.extra_files(&self.dir) {
                check_extra_file(&extra)?;
            }
        }

        FontGraph::new(self)?;
        Ok(())
    }
}

fn check_extra_file(path: &Path) -> Result<(), ConfigError> {
    let meta = std::fs::metadata(path).map_err(|source| ConfigError::ExtraFile {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.is_dir() {
        return Err(ConfigError::ExtraIsDirectory(path.to_path_buf()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Build order of the configured fonts, parents before children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontGraph {
    order: Vec<usize>,
}

impl FontGraph {
    pub fn new(config: &GenerateConfig) -> Result<Self, ConfigError> {
        let index: HashMap<&str, usize> = config
            .fonts
            .iter()
            .enumerate()
            .map(|(ii, f)| (f.source.as_str(), ii))
            .collect();
        let mut marks = vec![Mark::Unvisited; config.fonts.len()];
        let mut order = Vec::with_capacity(config.fonts.len());
        for start in 0..config.fonts.len() {
            let mut chain: Vec<usize> = Vec::new();
            let mut current = start;
            // Walk up until reaching a built font or a root
            loop {
                match marks[current] {
                    Mark::Done => break,
                    Mark::Visiting => {
                        let pos = chain.iter().position(|&c| c == current).unwrap_or(0);
                        let mut names: Vec<&str> = chain[pos..]
                            .iter()
                            .map(|&c| config.fonts[c].source.as_str())
                            .collect();
                        names.push(&config.fonts[current].source);
                        return Err(ConfigError::Cycle(names.join(" -> ")));
                    }
                    Mark::Unvisited => {}
                }
                marks[current] = Mark::Visiting;
                chain.push(current);
                let font = &config.fonts[current];
                let Some(parent) = config.parent_of(font) else {
                    break;
                };
                current = *index.get(parent).ok_or_else(|| ConfigError::UnknownParent {
                    font: font.source.clone(),
                    parent: parent.to_string(),
                })?;
            }
            for &ii in chain.iter().rev() {
                marks[ii] = Mark::Done;
                order.push(ii);
            }
        }
        Ok(Self { order })
    }

    /// Indices into the config's fonts
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

/// Build every font in `config`. Returns the composed tables by source name.
pub fn generate(config: &GenerateConfig, options: &BuildOptions) -> Result<HashMap<String, CharTable>> {
    let graph = FontGraph::new(config)?;

    let mut global = ExtraDataSet::new();
    for path in config.global_extra_files() {
        info!(path = %path.display(), "parsing global extra data");
        global.parse_file(&path)?;
    }

    let mut built: HashMap<String, CharTable> = HashMap::new();
    for &ii in graph.order() {
        let font = &config.fonts[ii];
        let mut parents = Vec::new();
        if let Some(name) = config.parent_of(font) {
            let chars = built
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("parent {name:?} of {:?} wasn't built", font.source))?;
            parents.push(NamedFont {
                name: name.to_string(),
                chars,
            });
        }

        let mut extra = global.clone();
        for path in font.extra_files(&config.dir) {
            info!(path = %path.display(), "parsing extra data");
            extra.parse_file(&path)?;
        }

        let output = font.output_path(&config.dir);
        let table = build_font(
            &font.source_path(&config.dir),
            &output,
            &extra,
            &parents,
            options,
        )
        .with_context(|| format!("Failed to generate font {:?}", font.source))?;

        if config.previews {
            let preview = font.preview_path(&config.dir);
            info!(path = %preview.display(), "writing preview");
            write_preview(&table, &preview, options.layout, options.output)?;
        }
        built.insert(font.source.clone(), table);
    }
    Ok(built)
}
