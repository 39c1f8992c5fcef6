/// Rendering layer: static half-court diagram plus one trajectory per figure.
///
/// ```text
///   court::half_court()  ──►  Vec<CourtShape>  (pure data)
///                                   │
///   Trajectory, figure_title(m, p) ─┤
///                                   ▼
///                         figure::render_trajectory  → Figure (RGB raster)
///                                   │ save
///                                   ▼
///                 results/figures/tracking/tracking_j{m}p{p}.png
/// ```

pub mod court;
pub mod figure;
