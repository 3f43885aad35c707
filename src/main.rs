use clap::Parser;
use env_logger::Env;
use log::info;

use photo_index::config::{Cli, Config};
use photo_index::image_backend::ImageBackend;
use photo_index::index_generator::generate;
use photo_index::reporter::LogReporter;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_cli(Cli::parse())?;

    info!("Photo directory: {}", config.root.display());
    if let Some(dir) = &config.output_dir {
        info!("Output directory: {}", dir.display());
    }

    let backend = ImageBackend::from_font_candidates(&config.fonts, config.font_size);

    generate(&config, &backend, &LogReporter)?;
    Ok(())
}
