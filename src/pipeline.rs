use std::path::PathBuf;

use thiserror::Error;

use crate::config::{DataLayout, PipelineConfig};
use crate::data::loader::{load_match_info, load_tracking};
use crate::data::model::{ExtractError, MatchInfo, TrackingTable, Trajectory};
use crate::render::court::{half_court, CourtShape};
use crate::render::figure::plot_player_trajectory;
use crate::signal::filter::{smooth, FilterParams};
use crate::signal::spline::fill_gaps;
use crate::signal::SignalError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why one player's trajectory could not be produced.
#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("match info unavailable for match {0}")]
    MissingMatchInfo(u32),
    #[error("tracking data unavailable for match {0}")]
    MissingTracking(u32),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("{stage} failed: {source}")]
    Signal {
        stage: &'static str,
        #[source]
        source: SignalError,
    },
}

fn at_stage(stage: &'static str) -> impl FnOnce(SignalError) -> TrajectoryError {
    move |source| TrajectoryError::Signal { stage, source }
}

// ---------------------------------------------------------------------------
// Trajectory assembly
// ---------------------------------------------------------------------------

/// Fill gaps in both coordinates, then low-pass them.
///
/// Short windows get their reflection padding reduced to `len - 1`.
pub fn clean_trajectory(
    raw: &Trajectory,
    config: &PipelineConfig,
) -> Result<Trajectory, TrajectoryError> {
    let missing = raw.missing_count();
    let filled = Trajectory {
        x: fill_gaps(&raw.x, &config.spline).map_err(at_stage("gap filling (x)"))?,
        y: fill_gaps(&raw.y, &config.spline).map_err(at_stage("gap filling (y)"))?,
    };
    if missing > 0 {
        log::debug!("filled {missing} of {} frames", raw.len());
    }

    let mut filter = config.filter.clone();
    let max_pad = filled.len().saturating_sub(1);
    if filter.padlen > max_pad {
        log::warn!(
            "padding of {} samples exceeds a {}-frame window, using {max_pad}",
            filter.padlen,
            filled.len()
        );
        filter = FilterParams {
            padlen: max_pad,
            ..filter
        };
    }

    smooth(&filled, &filter).map_err(at_stage("smoothing"))
}

/// Slice one player's window out of the match table and clean it.
pub fn build_player_trajectory(
    info: &MatchInfo,
    table: &TrackingTable,
    player_id: u32,
    config: &PipelineConfig,
) -> Result<Trajectory, TrajectoryError> {
    let raw = table.player_window(info.frame_start, info.frame_end, player_id)?;
    clean_trajectory(&raw, config)
}

/// Load a match from disk and build one player's cleaned trajectory.
pub fn get_match_player_data(
    layout: &DataLayout,
    match_id: u32,
    player_id: u32,
    config: &PipelineConfig,
) -> Result<Trajectory, TrajectoryError> {
    let info =
        load_match_info(layout, match_id).ok_or(TrajectoryError::MissingMatchInfo(match_id))?;
    let table =
        load_tracking(layout, match_id).ok_or(TrajectoryError::MissingTracking(match_id))?;
    build_player_trajectory(&info, &table, player_id, config)
}

// ---------------------------------------------------------------------------
// Per-match figure generation
// ---------------------------------------------------------------------------

/// Outcome of one player in a match run.
#[derive(Debug)]
pub enum PlayerOutcome {
    /// Figure produced; `path` is set when it was written to disk.
    Rendered { player_id: u32, path: Option<PathBuf> },
    Skipped { player_id: u32, reason: String },
}

/// What a match run produced, player by player.
#[derive(Debug, Default)]
pub struct MatchReport {
    pub match_id: u32,
    pub outcomes: Vec<PlayerOutcome>,
}

impl MatchReport {
    pub fn rendered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PlayerOutcome::Rendered { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.rendered()
    }
}

/// Loads, cleans and draws trajectories under one data layout.
pub struct TrackingFigures {
    pub layout: DataLayout,
    pub config: PipelineConfig,
    court: Vec<CourtShape>,
}

impl TrackingFigures {
    pub fn new(layout: DataLayout, config: PipelineConfig) -> Self {
        Self {
            layout,
            config,
            court: half_court(),
        }
    }

    /// Draw every rostered player of a match, one figure each.
    ///
    /// A failing player is logged and skipped; the others still render.
    pub fn create_fig_tracking(&self, match_id: u32, save: bool) -> MatchReport {
        let mut report = MatchReport {
            match_id,
            outcomes: Vec::new(),
        };

        let Some(info) = load_match_info(&self.layout, match_id) else {
            return report;
        };
        let Some(table) = load_tracking(&self.layout, match_id) else {
            return report;
        };

        for &player_id in &info.roster {
            let outcome = match self.player_figure(&info, &table, match_id, player_id, save) {
                Ok(path) => PlayerOutcome::Rendered { player_id, path },
                Err(e) => {
                    log::error!("Skipping match {match_id} player {player_id}: {e:#}");
                    PlayerOutcome::Skipped {
                        player_id,
                        reason: format!("{e:#}"),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        log::info!(
            "Match {match_id}: {} figure(s) produced, {} player(s) skipped",
            report.rendered(),
            report.skipped()
        );
        report
    }

    fn player_figure(
        &self,
        info: &MatchInfo,
        table: &TrackingTable,
        match_id: u32,
        player_id: u32,
        save: bool,
    ) -> anyhow::Result<Option<PathBuf>> {
        let trajectory = build_player_trajectory(info, table, player_id, &self.config)?;
        plot_player_trajectory(
            &trajectory,
            match_id,
            player_id,
            save,
            &self.layout,
            &self.court,
        )?;
        Ok(save.then(|| self.layout.figure_path(match_id, player_id)))
    }
}
