//! Pipeline configuration and on-disk layout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::signal::filter::FilterParams;
use crate::signal::spline::SplineParams;

// ---------------------------------------------------------------------------
// DataLayout – where inputs live and figures go
// ---------------------------------------------------------------------------

/// Resolves every input and output path relative to an explicit base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    base_dir: PathBuf,
}

impl DataLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `data/info/match_info_jogo{id}.xlsx`
    pub fn match_info_path(&self, match_id: u32) -> PathBuf {
        self.base_dir
            .join("data")
            .join("info")
            .join(format!("match_info_jogo{match_id}.xlsx"))
    }

    /// The spreadsheet if present, otherwise a `.csv` export next to it.
    ///
    /// Falls back to the spreadsheet path when neither exists so the loader
    /// reports the canonical name.
    pub fn resolve_match_info(&self, match_id: u32) -> PathBuf {
        let xlsx = self.match_info_path(match_id);
        if xlsx.exists() {
            return xlsx;
        }
        let csv = xlsx.with_extension("csv");
        if csv.exists() {
            csv
        } else {
            xlsx
        }
    }

    /// `data/2d/jogo{id}.2d`
    pub fn tracking_path(&self, match_id: u32) -> PathBuf {
        self.base_dir
            .join("data")
            .join("2d")
            .join(format!("jogo{match_id}.2d"))
    }

    /// `results/figures/tracking`
    pub fn figure_dir(&self) -> PathBuf {
        self.base_dir
            .join("results")
            .join("figures")
            .join("tracking")
    }

    /// `results/figures/tracking/tracking_j{match}p{player}.png`
    pub fn figure_path(&self, match_id: u32, player_id: u32) -> PathBuf {
        self.figure_dir()
            .join(format!("tracking_j{match_id}p{player_id}.png"))
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig – numeric settings of the cleaning stages
// ---------------------------------------------------------------------------

/// Settings for gap filling and smoothing, loadable from JSON.
///
/// ```json
/// {
///   "spline": { "degree": 3, "smoothing": 0.0 },
///   "filter": { "sample_rate": 30.0, "method": "butterworth", "cutoff": 2.0 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub spline: SplineParams,
    pub filter: FilterParams,
}

impl PipelineConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.filter.validate().context("invalid filter settings")?;
        config.spline.validate().context("invalid spline settings")?;
        Ok(config)
    }
}
