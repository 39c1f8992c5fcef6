/// Data layer: core types and flat-file loading.
///
/// Architecture:
/// ```text
///  match_info_jogo{m}.xlsx        jogo{m}.2d
///        │                            │
///        ▼                            ▼
///   ┌──────────┐                ┌──────────┐
///   │  loader   │  → MatchInfo   │  loader   │  → TrackingTable
///   └──────────┘                └──────────┘
///                                     │
///                                     ▼
///                       TrackingTable::player_window
///                         frames [start, end), x{p} / y{p}
///                                     │
///                                     ▼
///                                Trajectory
/// ```

pub mod loader;
pub mod model;
