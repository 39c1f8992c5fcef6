mod cli;

use clap::Parser;

use court_trace::config::{DataLayout, PipelineConfig};
use court_trace::pipeline::TrackingFigures;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .target(env_logger::Target::Stdout)
        .init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let figures = TrackingFigures::new(DataLayout::new(&cli.base_dir), config);
    figures.create_fig_tracking(cli.jogo_id, cli.persist());
    Ok(())
}
