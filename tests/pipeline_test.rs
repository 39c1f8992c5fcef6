//! End-to-end tests: files on disk → cleaned trajectories → PNG figures.

use std::fs;
use std::path::Path;

use court_trace::config::{DataLayout, PipelineConfig};
use court_trace::data::loader::{load_match_info, load_tracking};
use court_trace::pipeline::{get_match_player_data, PlayerOutcome, TrackingFigures};
use court_trace::signal::filter::FilterMethod;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

/// 100 frames, 2 players, a few missing samples, plus an all-missing player 3.
fn write_tracking(layout: &DataLayout, match_id: u32) {
    let mut text = String::new();
    for frame in 0..100 {
        let t = frame as f64;
        let mut row = vec![
            format!("{:.4}", 16.0 + 0.08 * t),
            format!("{:.4}", 7.5 + 2.0 * (t * 0.07).sin()),
            format!("{:.4}", 25.0 - 0.05 * t),
            format!("{:.4}", 3.0 + 0.06 * t),
            "NaN".to_string(),
            "NaN".to_string(),
        ];
        if frame % 17 == 5 {
            row[0] = "NaN".to_string();
            row[1] = "NaN".to_string();
        }
        if frame == 33 {
            row[3] = "nan".to_string();
        }
        text.push_str(&row.join(" "));
        text.push('\n');
    }
    write(&layout.tracking_path(match_id), &text);
}

fn write_info(layout: &DataLayout, match_id: u32, roster: &[&str]) {
    let mut text = String::from("frame_inicial,frame_final,atleta_id\n");
    for (i, id) in roster.iter().enumerate() {
        if i == 0 {
            text.push_str(&format!("10,60,{id}\n"));
        } else {
            text.push_str(&format!(",,{id}\n"));
        }
    }
    let path = layout.match_info_path(match_id).with_extension("csv");
    write(&path, &text);
}

/// Match info as the spreadsheet the recording setup exports.
fn write_info_xlsx(layout: &DataLayout, match_id: u32, roster: &[u32]) {
    let path = layout.match_info_path(match_id);
    fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "frame_inicial").unwrap();
    sheet.write_string(0, 1, "frame_final").unwrap();
    sheet.write_string(0, 2, "atleta_id").unwrap();
    sheet.write_number(1, 0, 10.0).unwrap();
    sheet.write_number(1, 1, 60.0).unwrap();
    for (i, id) in roster.iter().enumerate() {
        sheet.write_number(1 + i as u32, 2, f64::from(*id)).unwrap();
    }
    workbook.save(&path).unwrap();
}

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn setup(roster: &[&str]) -> (TempDir, DataLayout) {
    let dir = TempDir::new().unwrap();
    let layout = DataLayout::new(dir.path());
    write_tracking(&layout, 1);
    write_info(&layout, 1, roster);
    (dir, layout)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn match_produces_one_figure_per_player() {
    let (_dir, layout) = setup(&["1", "2"]);
    let figures = TrackingFigures::new(layout.clone(), PipelineConfig::default());

    let report = figures.create_fig_tracking(1, true);
    assert_eq!(report.rendered(), 2);
    assert_eq!(report.skipped(), 0);

    for player in [1, 2] {
        let path = layout.figure_path(1, player);
        assert!(path.exists(), "{} missing", path.display());
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("tracking_j1p{player}.png")
        );
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (450, 450));
    }
}

#[test]
fn workbook_match_info_drives_the_run() {
    let dir = TempDir::new().unwrap();
    let layout = DataLayout::new(dir.path());
    write_tracking(&layout, 1);
    write_info_xlsx(&layout, 1, &[2, 1]);

    let info = load_match_info(&layout, 1).unwrap();
    assert_eq!((info.frame_start, info.frame_end), (10, 60));
    assert_eq!(info.roster, vec![2, 1]);

    let figures = TrackingFigures::new(layout.clone(), PipelineConfig::default());
    assert_eq!(figures.create_fig_tracking(1, true).rendered(), 2);
    assert!(layout.figure_path(1, 1).exists());
    assert!(layout.figure_path(1, 2).exists());
}

#[test]
fn trajectories_cover_the_match_window() {
    let (_dir, layout) = setup(&["1", "2"]);
    for player in [1, 2] {
        let t = get_match_player_data(&layout, 1, player, &PipelineConfig::default()).unwrap();
        assert_eq!(t.x.len(), 50);
        assert_eq!(t.y.len(), 50);
        assert_eq!(t.missing_count(), 0);
    }

    // Default 51-tap FIR on the 50-frame window.
    let mut fir = PipelineConfig::default();
    fir.filter.method = FilterMethod::Fir;
    let t = get_match_player_data(&layout, 1, 1, &fir).unwrap();
    assert_eq!(t.len(), 50);
    assert!(t.points().all(|(x, y)| x.is_finite() && y.is_finite()));

    let figures = TrackingFigures::new(layout.clone(), fir);
    assert_eq!(figures.create_fig_tracking(1, false).rendered(), 2);
}

#[test]
fn smoothing_keeps_a_straight_run_in_place() {
    let (_dir, layout) = setup(&["2"]);
    let t = get_match_player_data(&layout, 1, 2, &PipelineConfig::default()).unwrap();
    // Player 2 moves on a line; frame k of the window is raw frame 10 + k.
    // The mirrored padding bends the line at both ends, so check the middle.
    for (k, (x, y)) in t.points().enumerate().skip(15).take(20) {
        let raw = 10.0 + k as f64;
        assert!((x - (25.0 - 0.05 * raw)).abs() < 0.05, "frame {k}: x = {x}");
        assert!((y - (3.0 + 0.06 * raw)).abs() < 0.05, "frame {k}: y = {y}");
    }
}

#[test]
fn failing_player_does_not_stop_the_match() {
    // Player 3 has no data at all, player 7 is not tracked, "x" is not an id.
    let (_dir, layout) = setup(&["1", "3", "x", "7", "2"]);
    let figures = TrackingFigures::new(layout.clone(), PipelineConfig::default());

    let report = figures.create_fig_tracking(1, true);
    let skipped: Vec<u32> = report
        .outcomes
        .iter()
        .filter_map(|o| match o {
            PlayerOutcome::Skipped { player_id, .. } => Some(*player_id),
            PlayerOutcome::Rendered { .. } => None,
        })
        .collect();
    assert_eq!(skipped, vec![3, 7]);
    assert_eq!(report.rendered(), 2);
    assert!(!layout.figure_path(1, 3).exists());
    assert!(!layout.figure_path(1, 7).exists());
}

#[test]
fn display_only_run_writes_no_files() {
    let (_dir, layout) = setup(&["1", "2"]);
    let figures = TrackingFigures::new(layout.clone(), PipelineConfig::default());
    let report = figures.create_fig_tracking(1, false);
    assert_eq!(report.rendered(), 2);
    assert!(report.outcomes.iter().all(|o| matches!(
        o,
        PlayerOutcome::Rendered { path: None, .. }
    )));
    assert!(!layout.figure_dir().exists());
}

#[test]
fn existing_results_folder_is_reused() {
    let (_dir, layout) = setup(&["1"]);
    fs::create_dir_all(layout.figure_dir()).unwrap();
    let figures = TrackingFigures::new(layout.clone(), PipelineConfig::default());

    assert_eq!(figures.create_fig_tracking(1, true).rendered(), 1);
    assert_eq!(figures.create_fig_tracking(1, true).rendered(), 1);
    let entries: Vec<_> = fs::read_dir(layout.figure_dir()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn missing_files_yield_absent_results() {
    let dir = TempDir::new().unwrap();
    let layout = DataLayout::new(dir.path());
    assert!(load_match_info(&layout, 5).is_none());
    assert!(load_tracking(&layout, 5).is_none());

    let figures = TrackingFigures::new(layout.clone(), PipelineConfig::default());
    let report = figures.create_fig_tracking(5, true);
    assert!(report.outcomes.is_empty());
    assert!(!layout.figure_dir().exists());
}

#[test]
fn empty_tracking_file_is_absent() {
    let (_dir, layout) = setup(&["1"]);
    fs::write(layout.tracking_path(1), "").unwrap();
    assert!(load_tracking(&layout, 1).is_none());
    assert!(load_match_info(&layout, 1).is_some());
}
