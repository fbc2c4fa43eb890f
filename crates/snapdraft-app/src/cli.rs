//! Command-line interface.

use crate::script::{Session, parse_script};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use kurbo::Point;
use snapdraft_core::storage::dxf::load_dxf;
use snapdraft_core::storage::save_drawing;
use snapdraft_core::{AciColor, Canvas, Settings, SnapEngine};
use std::fs;
use std::path::{Path, PathBuf};

/// Command-line arguments for snapdraft.
#[derive(Debug, Clone, Parser)]
#[command(name = "snapdraft")]
#[command(about = "Line drafting with object snaps and construction inference")]
#[command(version)]
pub struct CliArgs {
    /// Settings file (defaults to the per-user config file)
    #[arg(long, global = true, env = "SNAPDRAFT_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Summarise the lines in a DXF file
    Info {
        path: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find the snap target nearest a world point
    Snap {
        path: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        /// Screen pixels per world unit
        #[arg(long, default_value = "1.0")]
        zoom: f64,
        /// Snap radius in screen pixels
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Replay an interaction script against a canvas
    Replay {
        script: PathBuf,
        /// DXF file to load before replaying
        #[arg(long)]
        input: Option<PathBuf>,
        /// DXF file to write afterwards
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the full drawing, dimensions included, as JSON
        #[arg(long)]
        drawing: Option<PathBuf>,
    },
}

/// Run a parsed command line.
pub fn run(args: CliArgs) -> Result<()> {
    let settings = load_settings(args.settings.as_deref())?;
    let report = match args.command {
        Command::Info { path, json } => info(&path, json)?,
        Command::Snap {
            path,
            x,
            y,
            zoom,
            threshold,
        } => snap(&path, Point::new(x, y), zoom, threshold, &settings)?,
        Command::Replay {
            script,
            input,
            output,
            drawing,
        } => replay(
            &script,
            input.as_deref(),
            output.as_deref(),
            drawing.as_deref(),
            settings,
        )?,
    };
    println!("{}", report);
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(Settings::default_path()
            .map(|path| Settings::load_or_default(&path))
            .unwrap_or_default()),
    }
}

fn info(path: &Path, json: bool) -> Result<String> {
    let segments = load_dxf(path)?;
    let total_length: f64 = segments.iter().map(|s| s.length()).sum();
    let bounds = segments
        .iter()
        .map(|s| s.bounds())
        .reduce(|acc, b| acc.union(b));
    let colors: Vec<(AciColor, usize)> = AciColor::ALL
        .iter()
        .map(|&aci| {
            let count = segments
                .iter()
                .filter(|s| AciColor::nearest(s.color) == aci)
                .count();
            (aci, count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();

    if json {
        let summary = serde_json::json!({
            "segments": segments.len(),
            "total_length": total_length,
            "bounds": bounds.map(|b| [b.x0, b.y0, b.x1, b.y1]),
            "colors": colors
                .iter()
                .map(|(aci, count)| serde_json::json!({ "index": aci.index(), "count": count }))
                .collect::<Vec<_>>(),
        });
        return Ok(serde_json::to_string_pretty(&summary)?);
    }

    let mut out = format!("Segments: {}\nTotal length: {:.3}\n", segments.len(), total_length);
    match bounds {
        Some(b) => out.push_str(&format!(
            "Bounds: ({:.3}, {:.3}) - ({:.3}, {:.3})\n",
            b.x0, b.y0, b.x1, b.y1
        )),
        None => out.push_str("Bounds: empty\n"),
    }
    for (aci, count) in colors {
        out.push_str(&format!("  {:?} ({}): {}\n", aci, aci.index(), count));
    }
    Ok(out.trim_end().to_string())
}

fn snap(
    path: &Path,
    point: Point,
    zoom: f64,
    threshold: Option<f64>,
    settings: &Settings,
) -> Result<String> {
    let segments = load_dxf(path)?;
    let mut engine = SnapEngine::new();
    engine.set_on_segment_multiplier(settings.on_segment_multiplier);
    engine.configure(threshold.unwrap_or(settings.snap_threshold), zoom, &segments);

    let candidate = engine.query(point);
    if candidate.is_active() {
        Ok(format!(
            "{} at ({:.6}, {:.6})",
            candidate.kind.label(),
            candidate.location.x,
            candidate.location.y
        ))
    } else {
        Ok(format!(
            "no snap within {:.6} of ({:.6}, {:.6})",
            engine.on_segment_radius(),
            point.x,
            point.y
        ))
    }
}

fn replay(
    script: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
    drawing: Option<&Path>,
    settings: Settings,
) -> Result<String> {
    let text = fs::read_to_string(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let commands = parse_script(&text)
        .with_context(|| format!("Invalid script {}", script.display()))?;

    let mut canvas = Canvas::with_settings(settings);
    if let Some(input) = input {
        let outcome = canvas.load_dxf(input);
        if !outcome.success {
            bail!(outcome.message);
        }
    }

    let mut session = Session::new(canvas);
    session.run(&commands);
    let canvas = &mut session.canvas;

    let mut out = format!(
        "Replayed {} commands: {} segments, {} dimensions\nStatus: {}",
        commands.len(),
        canvas.drawing.len(),
        canvas.drawing.dimensions().len(),
        canvas.status()
    );

    if let Some(output) = output {
        let outcome = canvas.save_dxf(output);
        if !outcome.success {
            bail!(outcome.message);
        }
        out.push('\n');
        out.push_str(&outcome.message);
    }
    if let Some(path) = drawing {
        save_drawing(path, &canvas.drawing)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapdraft_core::Segment;
    use snapdraft_core::storage::dxf::save_dxf;
    use snapdraft_core::storage::load_drawing;
    use tempfile::tempdir;

    fn sample(dir: &Path) -> PathBuf {
        let path = dir.join("sample.dxf");
        let segments = [
            Segment::with_color(Point::new(0.0, 0.0), Point::new(10.0, 0.0), AciColor::Red.color()),
            Segment::new(Point::new(0.0, -5.0), Point::new(0.0, 5.0)),
        ];
        save_dxf(&path, &segments).unwrap();
        path
    }

    #[test]
    fn test_parse_args() {
        let args = CliArgs::try_parse_from([
            "snapdraft", "snap", "plan.dxf", "--x", "-1.5", "--y", "2", "--zoom", "4",
        ])
        .unwrap();
        match args.command {
            Command::Snap { x, y, zoom, threshold, .. } => {
                assert_eq!((x, y, zoom), (-1.5, 2.0, 4.0));
                assert!(threshold.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(CliArgs::try_parse_from(["snapdraft", "explode"]).is_err());
    }

    #[test]
    fn test_info() {
        let dir = tempdir().unwrap();
        let path = sample(dir.path());
        let report = info(&path, false).unwrap();
        assert!(report.starts_with("Segments: 2\nTotal length: 20.000\n"));
        assert!(report.contains("Bounds: (0.000, -5.000) - (10.000, 5.000)"));
        assert!(report.contains("Red (1): 1"));
        assert!(report.contains("White (7): 1"));

        let json: serde_json::Value = serde_json::from_str(&info(&path, true).unwrap()).unwrap();
        assert_eq!(json["segments"], 2);
        assert_eq!(json["bounds"][3], 5.0);
    }

    #[test]
    fn test_snap_reports_kind() {
        let dir = tempdir().unwrap();
        let path = sample(dir.path());
        let settings = Settings::default();

        let hit = snap(&path, Point::new(9.0, 1.0), 1.0, None, &settings).unwrap();
        assert_eq!(hit, "endpoint at (10.000000, 0.000000)");

        // Endpoint (0, 0) wins over the crossing at the same location.
        let hit = snap(&path, Point::new(0.5, 0.5), 1.0, None, &settings).unwrap();
        assert!(hit.starts_with("endpoint"));

        let miss = snap(&path, Point::new(50.0, 50.0), 1.0, None, &settings).unwrap();
        assert!(miss.starts_with("no snap"));
    }

    #[test]
    fn test_replay_round_trip() {
        let dir = tempdir().unwrap();
        let input = sample(dir.path());
        let script = dir.path().join("session.txt");
        let output = dir.path().join("out.dxf");
        let drawing = dir.path().join("out.json");
        fs::write(
            &script,
            "# extend the drawing\nfit\ntool line\nclick 100 100\nclick 200 100\ntool dimension\nclick 100 100\nclick 200 100\n",
        )
        .unwrap();

        let report = replay(
            &script,
            Some(&input),
            Some(&output),
            Some(&drawing),
            Settings::default(),
        )
        .unwrap();
        assert!(report.starts_with("Replayed 7 commands: 3 segments, 1 dimensions"));

        assert_eq!(load_dxf(&output).unwrap().len(), 3);
        let saved = load_drawing(&drawing).unwrap();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved.dimensions().len(), 1);
    }

    #[test]
    fn test_replay_reports_bad_script() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("bad.txt");
        fs::write(&script, "tool line\nclick here\n").unwrap();
        let err = replay(&script, None, None, None, Settings::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));

        let missing = dir.path().join("missing.txt");
        assert!(replay(&missing, None, None, None, Settings::default()).is_err());
    }

    #[test]
    fn test_explicit_settings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "snap_threshold": 12.0 }"#).unwrap();
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.snap_threshold, 12.0);
        assert_eq!(settings.selection_radius, Settings::default().selection_radius);

        assert!(load_settings(Some(&dir.path().join("none.json"))).is_err());
    }
}
