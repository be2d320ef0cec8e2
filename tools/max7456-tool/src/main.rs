//! max7456tool - tool for managing .mcm character sets for MAX7456

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::Level;

use max7456_tool::compose::NamedFont;
use max7456_tool::source::decode_mcm;
use max7456_tool::{
    BuildOptions, DuplicatePolicy, ExtraDataSet, GenerateConfig, GridLayout, OutputOptions,
    export, generate, pipeline,
};

#[derive(Parser)]
#[command(name = "max7456tool")]
#[command(about = "Tool for managing .mcm character sets for MAX7456")]
#[command(version)]
struct Cli {
    /// Overwrite output files
    #[arg(short, long, global = true)]
    force: bool,

    /// Print progress messages
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print debug messages
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct GridArgs {
    /// Margin between characters, in pixels
    #[arg(short, long, default_value_t = 1)]
    margin: u32,

    /// Characters per row
    #[arg(short, long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
    columns: u32,
}

impl From<GridArgs> for GridLayout {
    fn from(args: GridArgs) -> Self {
        GridLayout {
            columns: args.columns,
            margin: args.margin,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract all characters to individual images
    Extract {
        /// Input .mcm file
        input: PathBuf,

        /// Directory for the NNN.png files
        output: PathBuf,

        /// Include blank characters
        #[arg(short = 'b', long)]
        add_blanks: bool,
    },

    /// Build a .mcm from a directory of PNGs, a grid PNG or another .mcm
    Build {
        input: PathBuf,

        /// Output .mcm file
        output: PathBuf,

        /// Fail on missing characters instead of writing blanks
        #[arg(long)]
        no_blanks: bool,

        #[command(flatten)]
        grid: GridArgs,

        /// Extra data TOML file, may be repeated
        #[arg(short, long)]
        extra: Vec<PathBuf>,

        /// Font to inherit missing characters from, may be repeated. Earlier
        /// ones take precedence.
        #[arg(short, long)]
        parent: Vec<PathBuf>,
    },

    /// Build every font in a TOML config
    Generate {
        config: PathBuf,

        /// Fail on missing characters instead of writing blanks
        #[arg(long)]
        no_blanks: bool,

        #[command(flatten)]
        grid: GridArgs,

        /// List characters that are the same as their parent's
        #[arg(long)]
        report_duplicates: bool,

        /// Delete source images whose characters are all the same as their
        /// parent's
        #[arg(long, conflicts_with = "report_duplicates")]
        remove_duplicates: bool,
    },

    /// Render a .mcm as a grid PNG
    Png {
        input: PathBuf,

        output: PathBuf,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Write the raw character data of a .mcm
    Bin {
        input: PathBuf,

        output: PathBuf,

        /// Reverse the pixel order inside each pixel byte
        #[arg(long)]
        flip_horizontal_pixels: bool,
    },
}

fn log_level(cli: &Cli) -> Level {
    if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level(&cli).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = OutputOptions { force: cli.force };

    match cli.command {
        Commands::Extract {
            input,
            output: dir,
            add_blanks,
        } => {
            let n = export::extract_chars(&input, &dir, add_blanks, output)?;
            tracing::info!("Extracted {} characters to {}", n, dir.display());
        }

        Commands::Build {
            input,
            output: path,
            no_blanks,
            grid,
            extra,
            parent,
        } => {
            let mut extra_data = ExtraDataSet::new();
            for file in &extra {
                extra_data.parse_file(file)?;
            }
            let mut parents = Vec::with_capacity(parent.len());
            for p in &parent {
                let chars = decode_mcm(p)
                    .with_context(|| format!("Failed to load parent font: {}", p.display()))?
                    .into_table();
                parents.push(NamedFont {
                    name: p.display().to_string(),
                    chars,
                });
            }
            let options = BuildOptions {
                output,
                fill: !no_blanks,
                layout: grid.into(),
                duplicates: DuplicatePolicy::Ignore,
            };
            pipeline::build_font(&input, &path, &extra_data, &parents, &options)?;
        }

        Commands::Generate {
            config,
            no_blanks,
            grid,
            report_duplicates,
            remove_duplicates,
        } => {
            let duplicates = if remove_duplicates {
                DuplicatePolicy::Remove
            } else if report_duplicates {
                DuplicatePolicy::Report
            } else {
                DuplicatePolicy::Ignore
            };
            let options = BuildOptions {
                output,
                fill: !no_blanks,
                layout: grid.into(),
                duplicates,
            };
            let config = GenerateConfig::load(&config)?;
            let built = generate::generate(&config, &options)?;
            tracing::info!("Generated {} fonts", built.len());
        }

        Commands::Png {
            input,
            output: path,
            grid,
        } => {
            export::export_png(&input, &path, grid.into(), output)?;
        }

        Commands::Bin {
            input,
            output: path,
            flip_horizontal_pixels,
        } => {
            export::export_bin(&input, &path, flip_horizontal_pixels, output)?;
        }
    }

    Ok(())
}
