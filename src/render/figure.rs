use std::path::Path;

use anyhow::{bail, Context, Result};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};

use super::court::{Bounds, CourtShape};
use crate::config::DataLayout;
use crate::data::model::Trajectory;

// ---------------------------------------------------------------------------
// Figure geometry
// ---------------------------------------------------------------------------

/// Figure edge in inches (square figure).
pub const FIGURE_INCHES: f64 = 3.0;
/// Output resolution.
pub const DPI: f64 = 150.0;
/// Empty border between the drawing and the image edge, in pixels.
const MARGIN_PX: u32 = 8;
/// Data-space margin around the court and trajectory, in metres.
const MARGIN_M: f64 = 0.5;

const TRAJECTORY_COLOR: RGBColor = BLACK;
const TRAJECTORY_WIDTH: u32 = 2;

/// 8 pt bold at `DPI`.
const TITLE_SIZE: f64 = 8.0 * DPI / 72.0;

// ---------------------------------------------------------------------------
// Figure – rendered raster
// ---------------------------------------------------------------------------

/// An in-memory RGB raster with an opaque white background.
#[derive(Debug, Clone)]
pub struct Figure {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Figure {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB value at pixel `(x, y)`, origin top-left.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let at = ((y * self.width + x) * 3) as usize;
        [self.pixels[at], self.pixels[at + 1], self.pixels[at + 2]]
    }

    /// Number of pixels matching `pred`.
    pub fn count_pixels(&self, pred: impl Fn([u8; 3]) -> bool) -> usize {
        self.pixels
            .chunks_exact(3)
            .filter(|p| pred([p[0], p[1], p[2]]))
            .count()
    }

    /// Write the figure as PNG, creating the parent folder when needed.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating folder {}", dir.display()))?;
        }
        let image = RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .context("figure buffer does not match its dimensions")?;
        image
            .save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

/// Side of the square figure in pixels.
pub fn figure_side_px() -> u32 {
    (FIGURE_INCHES * DPI).round() as u32
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Title shown above a player's figure.
pub fn figure_title(match_id: u32, player_id: u32) -> String {
    format!("Trajetória | Jogo {match_id} - Atleta {player_id}")
}

/// Draw the court markings and the trajectory as a connected line, under an
/// optional bold title.
///
/// No ticks, labels or frame are drawn; both axes share one scale. A title
/// that cannot be typeset (no usable system font) is left out with a warning.
pub fn render_trajectory(
    trajectory: &Trajectory,
    court: &[CourtShape],
    title: Option<&str>,
) -> Result<Figure> {
    if trajectory.is_empty() {
        bail!("cannot draw an empty trajectory");
    }
    if trajectory.points().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        bail!("trajectory contains missing samples");
    }

    let side = figure_side_px();
    let mut pixels = vec![255u8; (side * side * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (side, side)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.margin(MARGIN_PX, MARGIN_PX, MARGIN_PX, MARGIN_PX);

        let area = match title {
            Some(text) => {
                let font = FontDesc::new(FontFamily::SansSerif, TITLE_SIZE, FontStyle::Bold);
                match root.titled(text, font) {
                    Ok(area) => area,
                    Err(e) => {
                        log::warn!("drawing without title '{text}': {e}");
                        root
                    }
                }
            }
            None => root,
        };

        let (w, h) = area.dim_in_pixel();
        let bounds = court
            .iter()
            .map(CourtShape::bounds)
            .fold(Bounds::around(trajectory.points()), Bounds::union)
            .fit_aspect(MARGIN_M, f64::from(w) / f64::from(h.max(1)));

        let mut chart = ChartBuilder::on(&area)
            .build_cartesian_2d(bounds.min.0..bounds.max.0, bounds.min.1..bounds.max.1)?;

        for shape in court {
            let (r, g, b) = shape.stroke.color;
            let style = RGBColor(r, g, b).stroke_width(shape.stroke.width);
            chart.draw_series(
                shape
                    .strokes()
                    .into_iter()
                    .map(|points| PathElement::new(points, style)),
            )?;
        }

        chart.draw_series(std::iter::once(PathElement::new(
            trajectory.points().collect::<Vec<_>>(),
            TRAJECTORY_COLOR.stroke_width(TRAJECTORY_WIDTH),
        )))?;

        area.present()?;
    }

    Ok(Figure {
        width: side,
        height: side,
        pixels,
    })
}

/// Render one player's titled trajectory over the half court and, if `save`
/// is set, write it to `results/figures/tracking/tracking_j{match}p{player}.png`.
pub fn plot_player_trajectory(
    trajectory: &Trajectory,
    match_id: u32,
    player_id: u32,
    save: bool,
    layout: &DataLayout,
    court: &[CourtShape],
) -> Result<Figure> {
    let title = figure_title(match_id, player_id);
    let figure = render_trajectory(trajectory, court, Some(&title))
        .with_context(|| format!("rendering match {match_id} player {player_id}"))?;

    if save {
        let path = layout.figure_path(match_id, player_id);
        figure.save_png(&path)?;
        log::info!("Saved trajectory figure {}", path.display());
    } else {
        log::debug!("Figure for match {match_id} player {player_id} not persisted");
    }
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::render::court::half_court;

    fn lap() -> Trajectory {
        let n = 120;
        let angle = |i: usize| i as f64 / n as f64 * std::f64::consts::TAU;
        Trajectory {
            x: (0..n).map(|i| 22.0 + 3.0 * angle(i).cos()).collect(),
            y: (0..n).map(|i| 7.5 + 4.0 * angle(i).sin()).collect(),
        }
    }

    /// Pixels darker than the court lines inside rows `rows`.
    fn dark_in_rows(fig: &Figure, rows: std::ops::Range<u32>) -> usize {
        rows.flat_map(|y| (0..fig.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| fig.pixel(x, y).iter().all(|&c| c < 35))
            .count()
    }

    #[test]
    fn figure_is_square_at_figure_dpi() {
        let fig = render_trajectory(&lap(), &half_court(), Some(&figure_title(1, 2))).unwrap();
        assert_eq!(fig.width(), 450);
        assert_eq!(fig.height(), 450);
        // Opaque white corner, nothing drawn in the margin.
        assert_eq!(fig.pixel(0, 0), [255, 255, 255]);
    }

    #[test]
    fn draws_trajectory_and_court() {
        let court = half_court();
        let fig = render_trajectory(&lap(), &court, None).unwrap();
        let bare = render_trajectory(&lap(), &[], None).unwrap();

        let dark = |p: [u8; 3]| p.iter().all(|&c| c < 35);
        let court_line = |p: [u8; 3]| p == [40, 40, 40];
        assert!(bare.count_pixels(dark) > 100);
        assert!(fig.count_pixels(court_line) > bare.count_pixels(court_line) + 500);
    }

    #[test]
    fn title_names_match_and_player() {
        assert_eq!(figure_title(3, 12), "Trajetória | Jogo 3 - Atleta 12");

        let court = half_court();
        let titled = render_trajectory(&lap(), &court, Some(&figure_title(3, 12))).unwrap();
        let plain = render_trajectory(&lap(), &court, None).unwrap();

        // Title text sits in the band above the court.
        assert!(dark_in_rows(&titled, MARGIN_PX..MARGIN_PX + 16) > 20);
        assert_eq!(dark_in_rows(&plain, MARGIN_PX..MARGIN_PX + 16), 0);
    }

    #[test]
    fn refuses_incomplete_trajectories() {
        let mut t = lap();
        t.x[3] = f64::NAN;
        assert!(render_trajectory(&t, &half_court(), None).is_err());
        let empty = Trajectory {
            x: vec![],
            y: vec![],
        };
        assert!(render_trajectory(&empty, &half_court(), None).is_err());
    }

    #[test]
    fn saving_twice_overwrites() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        let court = half_court();
        for _ in 0..2 {
            plot_player_trajectory(&lap(), 4, 9, true, &layout, &court).unwrap();
        }
        let path = layout.figure_path(4, 9);
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (450, 450));
        assert_eq!(std::fs::read_dir(layout.figure_dir()).unwrap().count(), 1);
    }

    #[test]
    fn display_only_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        plot_player_trajectory(&lap(), 4, 9, false, &layout, &half_court()).unwrap();
        assert!(!layout.figure_dir().exists());
    }
}
