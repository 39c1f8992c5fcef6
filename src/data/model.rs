use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// MatchInfo – per-match metadata record
// ---------------------------------------------------------------------------

/// Valid frame window and roster of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    /// First frame of play (inclusive, position in the tracking file).
    pub frame_start: usize,
    /// Last frame of play (exclusive).
    pub frame_end: usize,
    /// Player indices, in first-seen order, without duplicates.
    pub roster: Vec<u32>,
}

impl MatchInfo {
    /// Number of frames in the match window.
    pub fn window_len(&self) -> usize {
        self.frame_end.saturating_sub(self.frame_start)
    }
}

// ---------------------------------------------------------------------------
// Axis / Column – one coordinate series of the tracking table
// ---------------------------------------------------------------------------

/// Which coordinate a tracking column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// A single coordinate column. `NaN` marks a missing sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub player: u32,
    pub axis: Axis,
    pub values: Vec<f64>,
}

impl Column {
    /// Synthetic column name, e.g. `x3` for player 3.
    pub fn name(&self) -> String {
        format!("{}{}", self.axis, self.player)
    }

    /// True when every sample is missing.
    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }
}

// ---------------------------------------------------------------------------
// TrackingTable – all players of one match, one row per frame
// ---------------------------------------------------------------------------

/// Column-major tracking table. Row order is frame order.
#[derive(Debug, Clone, Default)]
pub struct TrackingTable {
    columns: Vec<Column>,
    n_frames: usize,
}

/// Why a player window could not be extracted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("player {0} has no x/y columns in the tracking table")]
    NoPlayerColumns(u32),
    #[error("frame window {start}..{end} is empty (table has {frames} frames)")]
    EmptyWindow {
        start: usize,
        end: usize,
        frames: usize,
    },
}

impl TrackingTable {
    /// Build a table from columns of equal length, dropping the ones with no data.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let n_frames = columns.first().map(|c| c.values.len()).unwrap_or(0);
        debug_assert!(columns.iter().all(|c| c.values.len() == n_frames));

        let columns: Vec<Column> = columns
            .into_iter()
            .filter(|c| !c.is_all_missing())
            .collect();
        TrackingTable { columns, n_frames }
    }

    /// Number of frames (rows).
    pub fn len(&self) -> usize {
        self.n_frames
    }

    /// Whether the table has no frames.
    pub fn is_empty(&self) -> bool {
        self.n_frames == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Ordered list of column names.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(Column::name).collect()
    }

    fn column(&self, player: u32, axis: Axis) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.player == player && c.axis == axis)
    }

    /// Slice rows `[start, end)` by position and select one player's x/y series.
    ///
    /// `end` past the last frame is clipped to the table length.
    pub fn player_window(
        &self,
        start: usize,
        end: usize,
        player: u32,
    ) -> Result<Trajectory, ExtractError> {
        let (Some(x), Some(y)) = (self.column(player, Axis::X), self.column(player, Axis::Y))
        else {
            return Err(ExtractError::NoPlayerColumns(player));
        };

        let clipped_end = end.min(self.n_frames);
        if clipped_end < end {
            log::warn!(
                "frame window end {end} exceeds the {} tracked frames, clipping",
                self.n_frames
            );
        }
        if start >= clipped_end {
            return Err(ExtractError::EmptyWindow {
                start,
                end,
                frames: self.n_frames,
            });
        }

        Ok(Trajectory {
            x: x.values[start..clipped_end].to_vec(),
            y: y.values[start..clipped_end].to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Trajectory – one player's (x, y) path
// ---------------------------------------------------------------------------

/// Equal-length x/y sequences of one player over the match window.
///
/// The same type carries the raw slice (may contain `NaN`), the gap-filled
/// series and the smoothed series.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Trajectory {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the trajectory has no frames.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Count of frames where either coordinate is missing.
    pub fn missing_count(&self) -> usize {
        self.x
            .iter()
            .zip(&self.y)
            .filter(|(x, y)| x.is_nan() || y.is_nan())
            .count()
    }

    /// Iterate over `(x, y)` points.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}
