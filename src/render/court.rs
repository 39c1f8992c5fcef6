//! Half-court diagram as data.
//!
//! Coordinates are metres on a 28 x 15 m FIBA court with the origin at a
//! corner; the right half spans `x` in `[14, 28]`, basket on the right.

use std::f64::consts::PI;

pub const COURT_LENGTH: f64 = 28.0;
pub const COURT_WIDTH: f64 = 15.0;
pub const MIDCOURT_X: f64 = COURT_LENGTH / 2.0;
const CENTER_Y: f64 = COURT_WIDTH / 2.0;

const HOOP_X: f64 = COURT_LENGTH - 1.575;
const HOOP_RADIUS: f64 = 0.225;
const BACKBOARD_X: f64 = COURT_LENGTH - 1.2;
const BACKBOARD_HALF_WIDTH: f64 = 0.9;
const FREE_THROW_X: f64 = COURT_LENGTH - 5.8;
const PAINT_HALF_WIDTH: f64 = 2.45;
const LANE_HALF_WIDTH: f64 = 1.8;
const FREE_THROW_RADIUS: f64 = 1.8;
const RESTRICTED_RADIUS: f64 = 1.25;
const THREE_POINT_RADIUS: f64 = 6.75;
const CORNER_THREE_OFFSET: f64 = 0.9;
const CENTER_CIRCLE_RADIUS: f64 = 1.8;
const CENTER_INNER_RADIUS: f64 = 0.6;

/// Samples per full turn when an arc is flattened to a polyline.
const ARC_SAMPLES_PER_TURN: usize = 180;
/// Samples per dash (and per gap) on dashed outlines.
const DASH_SAMPLES: usize = 4;

/// Geometry of one court marking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    Segment { from: (f64, f64), to: (f64, f64) },
    Rect { min: (f64, f64), max: (f64, f64) },
    Circle { center: (f64, f64), radius: f64 },
    /// Counter-clockwise from `start_deg` to `end_deg`.
    Arc {
        center: (f64, f64),
        radius: f64,
        start_deg: f64,
        end_deg: f64,
    },
}

/// Line colour, width in pixels and dash pattern of a marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub color: (u8, u8, u8),
    pub width: u32,
    pub dashed: bool,
}

const LINE: Stroke = Stroke {
    color: (40, 40, 40),
    width: 1,
    dashed: false,
};
const DASHED: Stroke = Stroke {
    dashed: true,
    ..LINE
};
const RIM: Stroke = Stroke {
    color: (230, 90, 20),
    width: 2,
    dashed: false,
};

/// A named court marking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourtShape {
    pub name: &'static str,
    pub kind: ShapeKind,
    pub stroke: Stroke,
}

impl CourtShape {
    const fn new(name: &'static str, kind: ShapeKind, stroke: Stroke) -> Self {
        Self { name, kind, stroke }
    }

    /// The marking flattened to one polyline.
    pub fn outline(&self) -> Vec<(f64, f64)> {
        match self.kind {
            ShapeKind::Segment { from, to } => vec![from, to],
            ShapeKind::Rect { min, max } => vec![
                min,
                (max.0, min.1),
                max,
                (min.0, max.1),
                min,
            ],
            ShapeKind::Circle { center, radius } => arc_points(center, radius, 0.0, 360.0),
            ShapeKind::Arc {
                center,
                radius,
                start_deg,
                end_deg,
            } => arc_points(center, radius, start_deg, end_deg),
        }
    }

    /// Polylines to stroke: the outline, or its dashes.
    pub fn strokes(&self) -> Vec<Vec<(f64, f64)>> {
        let outline = self.outline();
        if !self.stroke.dashed {
            return vec![outline];
        }
        outline
            .chunks(DASH_SAMPLES)
            .step_by(2)
            .filter(|dash| dash.len() > 1)
            .map(|dash| dash.to_vec())
            .collect()
    }

    /// Axis-aligned extent of the marking.
    pub fn bounds(&self) -> Bounds {
        Bounds::around(self.outline())
    }
}

fn arc_points(center: (f64, f64), radius: f64, start_deg: f64, end_deg: f64) -> Vec<(f64, f64)> {
    let sweep = end_deg - start_deg;
    let samples = ((sweep.abs() / 360.0) * ARC_SAMPLES_PER_TURN as f64).ceil().max(2.0) as usize;
    (0..=samples)
        .map(|i| {
            let theta = (start_deg + sweep * i as f64 / samples as f64) * PI / 180.0;
            (
                center.0 + radius * theta.cos(),
                center.1 + radius * theta.sin(),
            )
        })
        .collect()
}

/// Angle (degrees from the +x axis) where the three-point arc meets the
/// straight corner lines.
fn three_point_break_deg() -> f64 {
    let dy = CENTER_Y - CORNER_THREE_OFFSET;
    180.0 - (dy / THREE_POINT_RADIUS).asin().to_degrees()
}

/// Every marking of the right half court.
pub fn half_court() -> Vec<CourtShape> {
    let hoop = (HOOP_X, CENTER_Y);
    let free_throw = (FREE_THROW_X, CENTER_Y);
    let break_deg = three_point_break_deg();
    let corner_x = HOOP_X + THREE_POINT_RADIUS * break_deg.to_radians().cos();

    vec![
        CourtShape::new(
            "boundary",
            ShapeKind::Rect {
                min: (MIDCOURT_X, 0.0),
                max: (COURT_LENGTH, COURT_WIDTH),
            },
            LINE,
        ),
        CourtShape::new(
            "hoop",
            ShapeKind::Circle {
                center: hoop,
                radius: HOOP_RADIUS,
            },
            RIM,
        ),
        CourtShape::new(
            "backboard",
            ShapeKind::Segment {
                from: (BACKBOARD_X, CENTER_Y - BACKBOARD_HALF_WIDTH),
                to: (BACKBOARD_X, CENTER_Y + BACKBOARD_HALF_WIDTH),
            },
            Stroke { width: 2, ..LINE },
        ),
        CourtShape::new(
            "paint",
            ShapeKind::Rect {
                min: (FREE_THROW_X, CENTER_Y - PAINT_HALF_WIDTH),
                max: (COURT_LENGTH, CENTER_Y + PAINT_HALF_WIDTH),
            },
            LINE,
        ),
        CourtShape::new(
            "lane",
            ShapeKind::Rect {
                min: (FREE_THROW_X, CENTER_Y - LANE_HALF_WIDTH),
                max: (COURT_LENGTH, CENTER_Y + LANE_HALF_WIDTH),
            },
            LINE,
        ),
        CourtShape::new(
            "free-throw arc",
            ShapeKind::Arc {
                center: free_throw,
                radius: FREE_THROW_RADIUS,
                start_deg: 90.0,
                end_deg: 270.0,
            },
            LINE,
        ),
        CourtShape::new(
            "free-throw arc (inside paint)",
            ShapeKind::Arc {
                center: free_throw,
                radius: FREE_THROW_RADIUS,
                start_deg: -90.0,
                end_deg: 90.0,
            },
            DASHED,
        ),
        CourtShape::new(
            "restricted area",
            ShapeKind::Arc {
                center: hoop,
                radius: RESTRICTED_RADIUS,
                start_deg: 90.0,
                end_deg: 270.0,
            },
            LINE,
        ),
        CourtShape::new(
            "three-point arc",
            ShapeKind::Arc {
                center: hoop,
                radius: THREE_POINT_RADIUS,
                start_deg: break_deg,
                end_deg: 360.0 - break_deg,
            },
            LINE,
        ),
        CourtShape::new(
            "corner three (bottom)",
            ShapeKind::Segment {
                from: (COURT_LENGTH, CORNER_THREE_OFFSET),
                to: (corner_x, CORNER_THREE_OFFSET),
            },
            LINE,
        ),
        CourtShape::new(
            "corner three (top)",
            ShapeKind::Segment {
                from: (COURT_LENGTH, COURT_WIDTH - CORNER_THREE_OFFSET),
                to: (corner_x, COURT_WIDTH - CORNER_THREE_OFFSET),
            },
            LINE,
        ),
        CourtShape::new(
            "center circle",
            ShapeKind::Arc {
                center: (MIDCOURT_X, CENTER_Y),
                radius: CENTER_CIRCLE_RADIUS,
                start_deg: -90.0,
                end_deg: 90.0,
            },
            LINE,
        ),
        CourtShape::new(
            "center circle (inner)",
            ShapeKind::Arc {
                center: (MIDCOURT_X, CENTER_Y),
                radius: CENTER_INNER_RADIUS,
                start_deg: -90.0,
                end_deg: 90.0,
            },
            LINE,
        ),
    ]
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box in court metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: (f64, f64),
    pub max: (f64, f64),
}

impl Bounds {
    /// Box around finite points; an empty input gives an inverted box.
    pub fn around(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        points
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .fold(
                Bounds {
                    min: (f64::INFINITY, f64::INFINITY),
                    max: (f64::NEG_INFINITY, f64::NEG_INFINITY),
                },
                |b, (x, y)| Bounds {
                    min: (b.min.0.min(x), b.min.1.min(y)),
                    max: (b.max.0.max(x), b.max.1.max(y)),
                },
            )
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min: (self.min.0.min(other.min.0), self.min.1.min(other.min.1)),
            max: (self.max.0.max(other.max.0), self.max.1.max(other.max.1)),
        }
    }

    /// Grow by `margin`, then widen one side so that `width / height`
    /// equals `aspect` (pixel width over pixel height of the plot area).
    pub fn fit_aspect(self, margin: f64, aspect: f64) -> Bounds {
        let cx = 0.5 * (self.min.0 + self.max.0);
        let cy = 0.5 * (self.min.1 + self.max.1);
        let mut w = self.max.0 - self.min.0 + 2.0 * margin;
        let mut h = self.max.1 - self.min.1 + 2.0 * margin;
        if w < h * aspect {
            w = h * aspect;
        } else {
            h = w / aspect;
        }
        Bounds {
            min: (cx - 0.5 * w, cy - 0.5 * h),
            max: (cx + 0.5 * w, cy + 0.5 * h),
        }
    }
}
