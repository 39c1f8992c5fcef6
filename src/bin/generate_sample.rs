use std::f64::consts::TAU;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use court_trace::config::DataLayout;

/// Write a synthetic match (tracking file and match info) for demos.
#[derive(Parser, Debug)]
struct Args {
    /// Project folder to write data/ into
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Match id used in the file names
    #[arg(long, default_value_t = 1)]
    match_id: u32,

    /// Number of tracked players
    #[arg(long, default_value_t = 5)]
    players: u32,

    /// Number of frames (30 fps)
    #[arg(long, default_value_t = 1800)]
    frames: usize,

    /// Seed for the measurement noise and dropped detections
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Share of frames where a player's detection is lost
    #[arg(long, default_value_t = 0.02)]
    drop_rate: f64,
}

/// Tracker measurement noise, in metres.
const NOISE_SD: f64 = 0.08;

/// Player `p` drifts around an anchor on the right half with Lissajous motion.
fn position(p: u32, frame: usize, frames: usize) -> (f64, f64) {
    let t = frame as f64 / frames as f64;
    let anchor_x = 17.0 + 2.0 * p as f64;
    let anchor_y = 2.5 + 2.5 * p as f64 % 10.0;
    let x = anchor_x + 2.5 * (TAU * (1.0 + 0.3 * p as f64) * t).sin();
    let y = anchor_y + 2.0 * (TAU * (2.0 + 0.2 * p as f64) * t + p as f64).cos();
    (x.clamp(14.0, 28.0), y.clamp(0.0, 15.0))
}

/// Tracking rows for `frames` frames: an x/y pair per player, `NaN` for a
/// dropped detection. Also returns the number of dropped samples.
fn tracking_rows(
    players: u32,
    frames: usize,
    drop_rate: f64,
    rng: &mut ChaCha8Rng,
) -> Result<(Vec<String>, usize)> {
    let noise = Normal::new(0.0, NOISE_SD).context("invalid noise level")?;
    let drop_rate = drop_rate.clamp(0.0, 1.0);

    let mut dropped = 0usize;
    let mut rows = Vec::with_capacity(frames);
    for frame in 0..frames {
        let mut row = Vec::with_capacity(2 * players as usize);
        for p in 1..=players {
            let (x, y) = position(p, frame, frames);
            if rng.gen_bool(drop_rate) {
                dropped += 1;
                row.push("NaN".to_string());
                row.push("NaN".to_string());
            } else {
                row.push(format!("{:.4}", x + noise.sample(rng)));
                row.push(format!("{:.4}", y + noise.sample(rng)));
            }
        }
        rows.push(row.join(" "));
    }
    Ok((rows, dropped))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let layout = DataLayout::new(&args.base_dir);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let tracking_path = layout.tracking_path(args.match_id);
    fs::create_dir_all(tracking_path.parent().context("tracking path has no parent")?)?;
    let mut out = std::io::BufWriter::new(
        fs::File::create(&tracking_path)
            .with_context(|| format!("creating {}", tracking_path.display()))?,
    );
    let (rows, dropped) = tracking_rows(args.players, args.frames, args.drop_rate, &mut rng)?;
    for row in &rows {
        writeln!(out, "{row}")?;
    }
    out.flush()?;

    // Match info as the CSV export of the spreadsheet.
    let info_path = layout.match_info_path(args.match_id).with_extension("csv");
    fs::create_dir_all(info_path.parent().context("info path has no parent")?)?;
    let mut writer = csv::Writer::from_path(&info_path)
        .with_context(|| format!("creating {}", info_path.display()))?;
    writer.write_record(["frame_inicial", "frame_final", "atleta_id"])?;
    let start = args.frames / 10;
    let end = args.frames - args.frames / 10;
    for p in 1..=args.players {
        if p == 1 {
            writer.write_record([start.to_string(), end.to_string(), p.to_string()])?;
        } else {
            writer.write_record([String::new(), String::new(), p.to_string()])?;
        }
    }
    writer.flush()?;

    println!(
        "Wrote {} frames for {} players to {} ({dropped} dropped samples) and {}",
        args.frames,
        args.players,
        tracking_path.display(),
        info_path.display()
    );
    Ok(())
}
