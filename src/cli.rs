//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// Generate player tracking figures for one match.
#[derive(Parser, Debug)]
#[command(name = "court-trace")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// ID of the match to process
    #[arg(long = "jogo_id", visible_alias = "match-id", value_name = "ID")]
    pub jogo_id: u32,

    /// Save the generated figures (default)
    #[arg(long, conflicts_with = "no_save")]
    pub save: bool,

    /// Do not save the figures
    #[arg(long)]
    pub no_save: bool,

    /// Project folder holding data/ and results/
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub base_dir: PathBuf,

    /// JSON file with spline and filter settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Whether figures are written to disk.
    pub fn persist(&self) -> bool {
        !self.no_save
    }
}
