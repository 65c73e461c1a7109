//! TrackVisu CLI
//!
//! Generate, inspect, play back and mesh road scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use trackvisu_core::{decode, encode, CodecConfig, Decoded, Scenario, TrackDesign};
use trackvisu_env::{frame_interval, ManualClock, MAX_FRAME_RATE, MIN_FRAME_RATE};
use trackvisu_sim::{
    write_obj_file, GeneratorConfig, PlaybackExport, ScenarioGenerator, ScenarioPlayer, TrackScene,
};

/// TrackVisu road scenario tooling
#[derive(Parser, Debug)]
#[command(name = "trackvisu")]
#[command(about = "Generate, inspect, play back and mesh road scenarios", long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a random scenario document
    Generate {
        /// Master seed for determinism
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Number of vehicles, ego included
        #[arg(long)]
        vehicles: Option<u32>,

        /// Number of track segments
        #[arg(long)]
        segments: Option<u32>,

        /// Decimals written for floating point fields
        #[arg(long, default_value = "2")]
        decimals: usize,

        /// JSON file with generator settings (flags take precedence)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Decode a scenario document and summarize it
    Inspect {
        file: PathBuf,

        /// Lane width used for the track width (metres)
        #[arg(long, default_value = "3.5")]
        lane_width: f64,

        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Play a scenario headlessly at a fixed frame rate
    Play {
        file: PathBuf,

        /// Frames per second of playback
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Playback speed factor
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Export frames to a JSON file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Build the track meshes of a scenario
    Mesh {
        file: PathBuf,

        /// Lane width (metres)
        #[arg(long, default_value = "3.5")]
        lane_width: f64,

        /// JSON file with track design settings
        #[arg(long)]
        design: Option<PathBuf>,

        /// Write the meshes as Wavefront OBJ
        #[arg(long)]
        obj: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match args.command {
        Command::Generate {
            seed,
            vehicles,
            segments,
            decimals,
            config,
            out,
        } => generate(seed, vehicles, segments, decimals, config.as_deref(), out.as_deref()),
        Command::Inspect {
            file,
            lane_width,
            json,
        } => inspect(&file, lane_width, json),
        Command::Play {
            file,
            fps,
            speed,
            export,
        } => play(&file, fps, speed, export.as_deref()),
        Command::Mesh {
            file,
            lane_width,
            design,
            obj,
        } => mesh(&file, lane_width, design.as_deref(), obj.as_deref()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn load_scenario(path: &Path) -> Result<Decoded<Scenario>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let decoded = decode(&text);

    if decoded.is_clean() {
        debug!("Decoded {} without diagnostics", path.display());
    } else {
        warn!(
            "{}: {} diagnostic(s) while decoding",
            path.display(),
            decoded.diagnostics.len()
        );
    }
    Ok(decoded)
}

fn generate(
    seed: u64,
    vehicles: Option<u32>,
    segments: Option<u32>,
    decimals: usize,
    config_path: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let mut config: GeneratorConfig = match config_path {
        Some(path) => read_json(path)?,
        None => GeneratorConfig::default(),
    };
    config.seed = seed;
    if let Some(vehicles) = vehicles {
        config.vehicles = vehicles;
    }
    if let Some(segments) = segments {
        config.segments = segments;
    }

    let scenario = ScenarioGenerator::new(config)?.generate();
    let text = encode(&scenario, &CodecConfig { decimals });

    match out {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote scenario to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn inspect(path: &Path, lane_width: f64, json: bool) -> Result<()> {
    let decoded = load_scenario(path)?;
    let scenario = &decoded.value;
    let track = &scenario.track;

    if json {
        let summary = serde_json::json!({
            "file": path.display().to_string(),
            "diagnostics": decoded.diagnostics.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            "track": {
                "segments": track.len(),
                "width": track.width(lane_width).ok(),
                "length": track.length().ok(),
            },
            "duration": scenario.duration(),
            "trajectories": scenario.ordered_trajectories().map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "role": t.role,
                    "keyframes": t.len(),
                    "end_time": t.end_time(),
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for diagnostic in &decoded.diagnostics {
        warn!("  {}", diagnostic);
    }

    info!("Scenario {}", path.display());
    match (track.width(lane_width), track.length()) {
        (Ok(width), Ok(length)) => info!(
            "  Track: {} segments, {:.1}m long, {:.1}m wide",
            track.len(),
            length,
            width
        ),
        _ => info!("  Track: empty"),
    }
    info!("  Trajectories: {}", scenario.trajectories.len());
    for trajectory in scenario.ordered_trajectories() {
        info!(
            "    {} ({:?}): {} keyframes, ends at {:.2}s",
            trajectory.name,
            trajectory.role,
            trajectory.len(),
            trajectory.end_time()
        );
    }
    info!("  Duration: {:.2}s", scenario.duration());
    Ok(())
}

fn play(path: &Path, fps: f64, speed: f64, export_path: Option<&Path>) -> Result<()> {
    let frame_time = frame_interval(fps).with_context(|| {
        format!("fps must lie between {} and {}", MIN_FRAME_RATE, MAX_FRAME_RATE)
    })?;

    let scenario = load_scenario(path)?.into_value();
    let clock = ManualClock::new();
    let mut player = ScenarioPlayer::new(scenario, clock.clone())
        .with_context(|| format!("{} cannot be played", path.display()))?;
    player.cursor_mut().set_speed(speed)?;
    if !player.cursor().is_playing() {
        bail!("speed x{} would never finish playback", speed);
    }

    let mut export = PlaybackExport::new(&path.display().to_string(), fps, speed);
    let report_every = fps.round().max(1.0) as usize;

    info!(
        "Playing {} ({:.2}s at x{:.1}, {} fps)",
        path.display(),
        player.cursor().duration(),
        speed,
        fps
    );

    export.add_frame(player.frame_at(0.0));
    let mut frames = 1usize;
    while !player.cursor().is_finished() {
        clock.advance(frame_time);
        export.add_frame(player.tick());
        frames += 1;

        if frames % report_every == 0 {
            debug!("{}", player.status());
        }
    }
    info!("{}", player.status());

    match export_path {
        Some(out) => {
            export
                .write_to_file(out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!("Exported {} frames to {}", export.frames.len(), out.display());
        }
        None => info!("Played {} frames", export.frames.len()),
    }
    Ok(())
}

fn mesh(path: &Path, lane_width: f64, design_path: Option<&Path>, obj: Option<&Path>) -> Result<()> {
    let design: TrackDesign = match design_path {
        Some(path) => read_json(path)?,
        None => TrackDesign::default(),
    };

    let scenario = load_scenario(path)?.into_value();
    let mut scene = TrackScene::new(design, lane_width);
    scene.realize(&scenario.track);

    info!(
        "Built {} meshes: {} vertices, {} triangles",
        scene.mesh_count(),
        scene.vertex_count(),
        scene.triangle_count()
    );
    for track_mesh in scene.meshes() {
        debug!(
            "  {} (lane {}): {} triangles",
            track_mesh.kind.name(),
            track_mesh.lane_index,
            track_mesh.mesh.triangle_count()
        );
    }

    if let Some(out) = obj {
        write_obj_file(&scene.to_meshes(), out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        info!("Wrote {}", out.display());
    }
    Ok(())
}
