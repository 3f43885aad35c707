use clap::Parser;
use image::Rgb;
use std::path::PathBuf;
use thiserror::Error;

use crate::image_backend::{font_candidates, DEFAULT_FONT_SIZE};
use crate::layout::{LayoutError, LayoutParams};

/// Command line, with `PHOTO_INDEX_*` environment variables as fallback
#[derive(Parser, Debug, Clone)]
#[command(
    name = "photo-index",
    version,
    about = "Generate index thumbnails (contact sheets) for photo directories grouped by month"
)]
pub struct Cli {
    /// Root directory to process
    #[arg(env = "PHOTO_INDEX_DIRECTORY")]
    pub directory: PathBuf,

    /// Number of thumbnails per row
    #[arg(
        long,
        env = "PHOTO_INDEX_THUMBNAILS_PER_ROW",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub thumbnails_per_row: u32,

    /// Width of each thumbnail in pixels
    #[arg(
        long,
        env = "PHOTO_INDEX_THUMBNAIL_WIDTH",
        default_value_t = 150,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub thumbnail_width: u32,

    /// Height of each thumbnail in pixels
    #[arg(
        long,
        env = "PHOTO_INDEX_THUMBNAIL_HEIGHT",
        default_value_t = 150,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub thumbnail_height: u32,

    /// Maximum number of thumbnails per index image
    #[arg(
        long,
        env = "PHOTO_INDEX_MAX_THUMBNAILS",
        default_value_t = 200,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_thumbnails: u64,

    /// Output directory for index files. Without it, index files go to
    /// `<directory>/<YYYY>/`
    #[arg(long, env = "PHOTO_INDEX_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Sheet background as `#rrggbb`
    #[arg(
        long,
        env = "PHOTO_INDEX_BACKGROUND_COLOR",
        default_value = "#ffffff",
        value_parser = parse_hex_color
    )]
    pub background_color: Rgb<u8>,

    /// Caption font file; may be repeated. Tried before the built-in list
    #[arg(long = "font", env = "PHOTO_INDEX_FONTS", value_delimiter = ',')]
    pub fonts: Vec<PathBuf>,

    /// Caption font size in pixels
    #[arg(long, env = "PHOTO_INDEX_FONT_SIZE", default_value_t = DEFAULT_FONT_SIZE)]
    pub font_size: f32,

    /// Months rendered concurrently (0 = one per CPU)
    #[arg(long, env = "PHOTO_INDEX_JOBS", default_value_t = 1)]
    pub jobs: usize,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("Font size must be positive, got {0}")]
    FontSize(f32),
}

/// Validated settings for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub layout: LayoutParams,
    /// Font preference list, most preferred first
    pub fonts: Vec<PathBuf>,
    pub font_size: f32,
    /// Worker threads for month rendering, at least 1
    pub jobs: usize,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let max_per_page = usize::try_from(cli.max_thumbnails).unwrap_or(usize::MAX);
        let layout = LayoutParams::new(
            cli.thumbnails_per_row,
            cli.thumbnail_width,
            cli.thumbnail_height,
            max_per_page,
            cli.background_color,
        )?;

        if !(cli.font_size.is_finite() && cli.font_size > 0.0) {
            return Err(ConfigError::FontSize(cli.font_size));
        }

        let jobs = match cli.jobs {
            0 => num_cpus::get(),
            n => n,
        };

        Ok(Config {
            root: cli.directory,
            output_dir: cli.output_dir,
            layout,
            fonts: font_candidates(&cli.fonts),
            font_size: cli.font_size,
            jobs,
        })
    }

    /// Defaults for everything except the root directory
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Config {
            root: root.into(),
            output_dir: None,
            layout: LayoutParams::default(),
            fonts: font_candidates(&[]),
            font_size: DEFAULT_FONT_SIZE,
            jobs: 1,
        }
    }
}

/// Parses `#rrggbb` or `rrggbb`
pub fn parse_hex_color(s: &str) -> Result<Rgb<u8>, String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected a colour like #ffffff, got '{}'", s));
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}
