use std::collections::HashSet;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;

use super::model::{Axis, Column, MatchInfo, TrackingTable};
use crate::config::DataLayout;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure kinds of the flat-file loaders.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found - {}", .0.display())]
    NotFound(PathBuf),
    #[error("File is empty or corrupted - {}", .0.display())]
    Empty(PathBuf),
    #[error("Malformed file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("Unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("Spreadsheet error in {}: {message}", path.display())]
    Sheet { path: PathBuf, message: String },
    #[error("I/O error reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn malformed(path: &Path, reason: impl Into<String>) -> LoadError {
    LoadError::Malformed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Public entry-points (logging, best-effort)
// ---------------------------------------------------------------------------

/// Load the metadata record of a match. Logs and returns `None` on any failure.
pub fn load_match_info(layout: &DataLayout, match_id: u32) -> Option<MatchInfo> {
    let path = layout.resolve_match_info(match_id);
    match read_match_info(&path) {
        Ok(info) => {
            log::info!("Successfully loaded match info for match {match_id}.");
            log::debug!(
                "match {match_id}: frames {}..{}, roster {:?}",
                info.frame_start,
                info.frame_end,
                info.roster
            );
            Some(info)
        }
        Err(e) => {
            log::error!("Error while loading match info: {e}");
            None
        }
    }
}

/// Load the tracking table of a match. Logs and returns `None` on any failure.
pub fn load_tracking(layout: &DataLayout, match_id: u32) -> Option<TrackingTable> {
    let path = layout.tracking_path(match_id);
    match read_tracking(&path) {
        Ok(table) => {
            log::info!(
                "Successfully loaded tracking data for match {match_id} ({} frames, {} columns).",
                table.len(),
                table.columns().len()
            );
            Some(table)
        }
        Err(e) => {
            log::error!("Error while loading tracking data: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Match info: .xlsx (or .csv export) with a header row
// ---------------------------------------------------------------------------

const FRAME_START_COL: &str = "frame_inicial";
const FRAME_END_COL: &str = "frame_final";
const PLAYER_COL: &str = "atleta_id";

/// A header plus numeric cells; non-numeric and blank cells are `None`.
struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl Sheet {
    fn column(&self, name: &str) -> Option<impl Iterator<Item = Option<f64>> + '_> {
        let idx = self.headers.iter().position(|h| h.trim() == name)?;
        Some(self.rows.iter().map(move |r| r.get(idx).copied().flatten()))
    }
}

/// Parse a match info file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` / `.ods` – first worksheet, header in the first row
/// * `.csv`                    – comma separated, header in the first row
pub fn read_match_info(path: &Path) -> Result<MatchInfo, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let sheet = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path)?,
        "csv" => read_csv(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    match_info_from_sheet(path, &sheet)
}

fn read_workbook(path: &Path) -> Result<Sheet, LoadError> {
    let sheet_err = |message: String| LoadError::Sheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::Empty(path.to_path_buf()))?
        .map_err(|e| sheet_err(e.to_string()))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| LoadError::Empty(path.to_path_buf()))?;
    let headers: Vec<String> = header.iter().map(|c| c.to_string()).collect();
    let rows: Vec<Vec<Option<f64>>> = rows
        .map(|r| r.iter().map(cell_to_f64).collect())
        .collect();

    Ok(Sheet { headers, rows })
}

fn cell_to_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::String(s) => parse_cell(s),
        _ => None,
    }
}

fn read_csv(path: &Path) -> Result<Sheet, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| malformed(path, e.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(path, e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let mut rows: Vec<Vec<Option<f64>>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| malformed(path, format!("CSV row {row_no}: {e}")))?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(Sheet { headers, rows })
}

fn parse_cell(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn match_info_from_sheet(path: &Path, sheet: &Sheet) -> Result<MatchInfo, LoadError> {
    if sheet.rows.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let first_frame = |name: &str| -> Result<usize, LoadError> {
        let mut column = sheet
            .column(name)
            .ok_or_else(|| malformed(path, format!("missing '{name}' column")))?;
        let value = column
            .find_map(|v| v)
            .ok_or_else(|| malformed(path, format!("'{name}' has no numeric value")))?;
        if value < 0.0 {
            return Err(malformed(path, format!("'{name}' is negative ({value})")));
        }
        Ok(value as usize)
    };

    let frame_start = first_frame(FRAME_START_COL)?;
    let frame_end = first_frame(FRAME_END_COL)?;
    if frame_end < frame_start {
        return Err(malformed(
            path,
            format!("{FRAME_END_COL} ({frame_end}) precedes {FRAME_START_COL} ({frame_start})"),
        ));
    }

    let players = sheet
        .column(PLAYER_COL)
        .ok_or_else(|| malformed(path, format!("missing '{PLAYER_COL}' column")))?;

    let mut seen = HashSet::new();
    let roster: Vec<u32> = players
        .flatten()
        .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as u32)
        .filter(|id| seen.insert(*id))
        .collect();

    Ok(MatchInfo {
        frame_start,
        frame_end,
        roster,
    })
}

// ---------------------------------------------------------------------------
// Tracking: whitespace separated, no header, x/y pair per player
// ---------------------------------------------------------------------------

/// Parse a `.2d` tracking file.
///
/// Layout: one row per frame, `2 * players` numeric columns, no header and no
/// frame counter. Pair `i` holds player `i + 1` as `x{i+1} y{i+1}`.
/// Missing samples are written as `NaN`.
pub fn read_tracking(path: &Path) -> Result<TrackingTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tracking(path, &text)
}

fn parse_tracking(path: &Path, text: &str) -> Result<TrackingTable, LoadError> {
    let mut width: Option<usize> = None;
    let mut series: Vec<Vec<f64>> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| {
                    malformed(path, format!("line {}: '{tok}' is not a number", line_no + 1))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        match width {
            None => {
                if row.len() % 2 != 0 {
                    return Err(malformed(
                        path,
                        format!(
                            "line {}: {} columns, expected an x/y pair per player",
                            line_no + 1,
                            row.len()
                        ),
                    ));
                }
                width = Some(row.len());
                series = vec![Vec::new(); row.len()];
            }
            Some(w) if w != row.len() => {
                return Err(malformed(
                    path,
                    format!("line {}: {} columns, expected {w}", line_no + 1, row.len()),
                ));
            }
            Some(_) => {}
        }

        for (col, value) in series.iter_mut().zip(row) {
            col.push(value);
        }
    }

    if width.is_none() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let columns = series
        .into_iter()
        .enumerate()
        .map(|(i, values)| Column {
            player: (i / 2 + 1) as u32,
            axis: if i % 2 == 0 { Axis::X } else { Axis::Y },
            values,
        })
        .collect();

    Ok(TrackingTable::from_columns(columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    #[test]
    fn parses_tracking_layout() {
        let text = "1.0 2.0 NaN 4.0\n1.5 2.5 nan 4.5\n\n2.0 3.0 NaN 5.0\n";
        let table = parse_tracking(Path::new("t.2d"), text).unwrap();
        assert_eq!(table.len(), 3);
        // x2 has no data at all and is dropped.
        assert_eq!(table.column_names(), vec!["x1", "y1", "y2"]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = parse_tracking(Path::new("t.2d"), "1 2 3 4\n1 2\n").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn rejects_odd_column_count() {
        let err = parse_tracking(Path::new("t.2d"), "0 1 2\n1 1 2\n").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn rejects_non_numeric_tokens() {
        let err = parse_tracking(Path::new("t.2d"), "1 2\nfoo 3\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn empty_tracking_is_reported() {
        let err = parse_tracking(Path::new("t.2d"), "\n  \n").unwrap_err();
        assert!(matches!(err, LoadError::Empty(_)));
    }

    #[test]
    fn missing_files_are_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_tracking(&dir.path().join("jogo9.2d")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
        assert!(err.to_string().starts_with("File not found"));

        let err = read_match_info(&dir.path().join("match_info_jogo9.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn reads_match_info_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("match_info_jogo1.csv");
        fs::write(
            &path,
            "frame_inicial,frame_final,atleta_id,nome\n\
             10,60,3,Ana\n\
             ,,1,Bia\n\
             ,,,Caio\n\
             ,,abc,Duda\n\
             ,,3,Ana\n",
        )
        .unwrap();

        let info = read_match_info(&path).unwrap();
        assert_eq!(info.frame_start, 10);
        assert_eq!(info.frame_end, 60);
        assert_eq!(info.roster, vec![3, 1]);
        assert_eq!(info.window_len(), 50);
    }

    #[test]
    fn match_info_requires_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("info.csv");
        fs::write(&path, "frame_inicial,atleta_id\n0,1\n").unwrap();
        let err = read_match_info(&path).unwrap_err();
        assert!(err.to_string().contains("frame_final"));
    }

    #[test]
    fn reads_match_info_workbook() {
        use rust_xlsxwriter::Workbook;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("match_info_jogo5.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["frame_inicial", "frame_final", "atleta_id", "nome"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_number(1, 0, 12.0).unwrap();
        sheet.write_number(1, 1, 75.0).unwrap();
        sheet.write_number(1, 2, 4.0).unwrap();
        sheet.write_string(1, 3, "Ana").unwrap();
        sheet.write_number(2, 2, 9.0).unwrap();
        sheet.write_string(2, 3, "Bia").unwrap();
        // Row 3 has no atleta_id at all.
        sheet.write_string(3, 3, "Caio").unwrap();
        sheet.write_string(4, 2, "sem id").unwrap();
        sheet.write_string(5, 2, "11").unwrap();
        sheet.write_number(6, 2, 4.0).unwrap();
        workbook.save(&path).unwrap();

        let info = read_match_info(&path).unwrap();
        assert_eq!(info.frame_start, 12);
        assert_eq!(info.frame_end, 75);
        assert_eq!(info.roster, vec![4, 9, 11]);
    }

    #[test]
    fn workbook_cells_become_numbers() {
        assert_eq!(cell_to_f64(&Data::Int(7)), Some(7.0));
        assert_eq!(cell_to_f64(&Data::Float(60.0)), Some(60.0));
        assert_eq!(cell_to_f64(&Data::String(" 12 ".into())), Some(12.0));
        assert_eq!(cell_to_f64(&Data::String("x".into())), None);
        assert_eq!(cell_to_f64(&Data::Empty), None);
        assert_eq!(cell_to_f64(&Data::Bool(true)), None);
    }

    #[test]
    fn corrupt_workbook_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("match_info_jogo2.xlsx");
        fs::write(&path, b"not a zip archive").unwrap();
        assert!(matches!(
            read_match_info(&path),
            Err(LoadError::Sheet { .. })
        ));
    }

    #[test]
    fn logging_loaders_return_none() {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        assert!(load_match_info(&layout, 42).is_none());
        assert!(load_tracking(&layout, 42).is_none());
    }
}
