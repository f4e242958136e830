use ardiscover::algorithms::{CameraOptics, CompressionMode, RenderSurface};
use ardiscover::api::{CameraFrame, FrameInput, OverlaySession, SessionSettings, TrackedMarker, TrackingState};
use ardiscover::scene::{MockScene, NodeKind, QueuedLabelFactory, SceneGraph};
use ardiscover::utils::logger;
use ardiscover::utils::ConfigurationManager;
use clap::{Parser, ValueEnum};
use log::info;
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use std::error::Error;
use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;

/// Approximate label text width in physical pixels per character
const LABEL_PX_PER_CHAR: f64 = 24.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Literal,
    Asymptotic,
}

impl From<ModeArg> for CompressionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Literal => CompressionMode::Literal,
            ModeArg::Asymptotic => CompressionMode::Asymptotic,
        }
    }
}

/// Replay a synthetic tracking session and print one JSON report per frame.
#[derive(Debug, Parser)]
#[command(author, version, about = "Geo-to-AR label placement replay")]
struct Args {
    /// Optional JSON configuration. The built-in Split dataset is used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this path and exit.
    #[arg(long)]
    dump_config: Option<PathBuf>,

    /// Marker asset name reported by the synthetic tracker.
    #[arg(long, default_value = "marker.jpg")]
    marker: String,

    /// Number of frames to replay.
    #[arg(long, default_value_t = 30)]
    frames: u64,

    /// Peak bearing noise added to each marker pose (degrees).
    #[arg(long, default_value_t = 2.0)]
    jitter_deg: f64,

    /// Pause the session before this frame.
    #[arg(long)]
    pause_at: Option<u64>,

    /// Override the compression curve.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Log per-frame details.
    #[arg(long)]
    verbose: bool,

    /// Pretty-print reports.
    #[arg(long)]
    pretty: bool,
}

/// Deterministic bearing noise for frame `index` (radians)
fn jitter(index: u64, peak_deg: f64) -> f64 {
    let t = index as f64;
    let noise = 0.6 * (t * 1.7).sin() + 0.4 * (t * 4.3 + 0.5).sin();
    noise * peak_deg.to_radians()
}

fn synthetic_frame(marker: &str, yaw: f64) -> FrameInput {
    let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);

    FrameInput {
        markers: vec![TrackedMarker::new(
            marker,
            TrackingState::Tracking,
            Isometry3::from_parts(Translation3::new(0.0, 0.0, -1.5), rotation),
        )],
        camera: CameraFrame {
            pose: Isometry3::identity(),
            optics: CameraOptics {
                focal_length_y: 1450.0,
                image_width: 1920.0,
                image_height: 1080.0,
            },
        },
        surface: RenderSurface {
            width_px: 1080.0,
            height_px: 2340.0,
            density: 2.75,
        },
    }
}

/// Complete every outstanding label request the way a renderer would
fn complete_labels(
    session: &mut OverlaySession<MockScene, QueuedLabelFactory>,
    density: f64,
) -> Result<(), Box<dyn Error>> {
    let requests = session.label_factory_mut().take_requests();
    for request in requests {
        let node = session.scene_mut().create_node(NodeKind::Label);
        session.on_label_ready(request.ticket, node)?;

        let width_px = request.text.chars().count() as f64 * LABEL_PX_PER_CHAR;
        let layout = session.on_label_measured(request.ticket, width_px, density)?;
        info!("Label '{}' is {:.2} m wide at 1 m", request.text, layout.width_m);
    }
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut manager = match &args.config {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    if let Some(mode) = args.mode {
        manager.set_compression_mode(mode.into());
    }

    let debug = args.verbose || manager.get_system_config().debug_logging;
    logger::init_with_level(logger::level_for(debug)).map_err(|e| e.to_string())?;

    if let Some(path) = &args.dump_config {
        manager.save_to_file(path)?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let settings = SessionSettings::from(manager.get_system_config());
    let mut session = OverlaySession::new(
        manager.anchors_cloned(),
        settings,
        MockScene::new(),
        QueuedLabelFactory::new(),
    );

    for index in 0..args.frames {
        if args.pause_at == Some(index) {
            session.on_session_paused();
        }

        let input = synthetic_frame(&args.marker, jitter(index, args.jitter_deg));
        let report = session.update_frame(&input);
        complete_labels(&mut session, input.surface.density)?;

        let json = if args.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{}", json);
    }

    info!(
        "Replayed {} frame(s), {} scene node(s) live",
        args.frames,
        session.scene().node_count()
    );

    Ok(())
}
