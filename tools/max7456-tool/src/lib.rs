//! max7456tool - building and converting MAX7456 .mcm character sets
//!
//! Fonts are drawn as PNG files (a directory of per-character images or a
//! single grid image), optionally inherit characters from other fonts and
//! carry extra binary data in the reserved bytes of each character.

pub mod compose;
pub mod export;
pub mod extra_data;
pub mod generate;
pub mod grid;
pub mod output;
pub mod pipeline;
pub mod source;

pub use compose::{DuplicatePolicy, FontComposer, NamedFont};
pub use extra_data::{ExtraDataError, ExtraDataSet};
pub use generate::{ConfigError, GenerateConfig};
pub use grid::GridLayout;
pub use output::OutputOptions;
pub use pipeline::BuildOptions;
