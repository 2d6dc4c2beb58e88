//! Heatmap viewer.
//!
//! Drives the animated water-quality heatmap headlessly and writes each
//! frame as a PNG.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use renderer::{ContourMethod, GradientMode, HeadlessScheduler, HeatmapView, PixmapSurface};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::ViewerConfig;

#[derive(Parser, Debug)]
#[command(name = "heatmap-viewer")]
#[command(about = "Render animated river water-quality heatmap frames")]
struct Args {
    /// Viewer config file (YAML or JSON)
    #[arg(short, long, env = "HEATMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Parameter layer to show (defaults to the first configured layer)
    #[arg(short, long)]
    parameter: Option<String>,

    /// Number of frames to render
    #[arg(short, long, default_value = "60")]
    frames: u32,

    /// Frame width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Animation speed factor (0-3)
    #[arg(long)]
    speed: Option<f64>,

    /// Hide iso-contours
    #[arg(long)]
    no_contours: bool,

    /// Hide sensor markers
    #[arg(long)]
    no_sensors: bool,

    /// Contour scan: sequential, grid_neighbors or marching_squares
    #[arg(long)]
    contour_method: Option<String>,

    /// Gradient lookup: stepped or linear
    #[arg(long)]
    gradient_mode: Option<String>,

    /// Directory for frame_NNNN.png files
    #[arg(short, long, env = "HEATMAP_OUTPUT_DIR", default_value = "frames")]
    output_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the configured layers and exit
    #[arg(long)]
    list_layers: bool,
}

fn parse_contour_method(value: &str) -> Result<ContourMethod> {
    Ok(match value.to_lowercase().replace('-', "_").as_str() {
        "sequential" => ContourMethod::Sequential,
        "grid_neighbors" => ContourMethod::GridNeighbors,
        "marching_squares" => ContourMethod::MarchingSquares,
        other => bail!("Unknown contour method: {}", other),
    })
}

fn parse_gradient_mode(value: &str) -> Result<GradientMode> {
    Ok(match value.to_lowercase().as_str() {
        "stepped" => GradientMode::Stepped,
        "linear" => GradientMode::Linear,
        other => bail!("Unknown gradient mode: {}", other),
    })
}

/// Fold command-line overrides into the loaded config.
fn apply_overrides(config: &mut ViewerConfig, args: &Args) -> Result<()> {
    let render = &mut config.render;
    if let Some(width) = args.width {
        render.width = width;
    }
    if let Some(height) = args.height {
        render.height = height;
    }
    if let Some(speed) = args.speed {
        render.speed_factor = speed;
    }
    if args.no_contours {
        render.show_contours = false;
    }
    if args.no_sensors {
        render.show_sensors = false;
    }
    if let Some(method) = &args.contour_method {
        render.contour_method = parse_contour_method(method)?;
    }
    if let Some(mode) = &args.gradient_mode {
        render.gradient_mode = parse_gradient_mode(mode)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    apply_overrides(&mut config, &args)?;

    let catalog = config.catalog()?;

    if args.list_layers {
        for layer in catalog.iter() {
            println!(
                "{:<12} {:<20} {:>12} {}",
                layer.key,
                layer.name,
                layer.range_label(),
                layer.unit
            );
        }
        return Ok(());
    }

    let parameter = match &args.parameter {
        Some(key) => key.clone(),
        None => catalog
            .first_key()
            .context("No parameter layers configured")?
            .to_string(),
    };

    info!(
        parameter = %parameter,
        frames = args.frames,
        width = config.render.width,
        height = config.render.height,
        output_dir = %args.output_dir.display(),
        "Starting heatmap viewer"
    );

    let mut view: HeatmapView<HeadlessScheduler, PixmapSurface> = HeatmapView::new(
        catalog,
        config.sensors.clone(),
        config.view_options(),
        HeadlessScheduler::new(),
        &parameter,
    )
    .with_context(|| format!("Failed to create view for parameter {}", parameter))?;

    view.attach_surface(PixmapSurface::new(
        config.render.width as f64,
        config.render.height as f64,
    ));

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory: {}", args.output_dir.display())
    })?;

    view.start();

    let mut written = 0u32;
    for n in 0..args.frames {
        if view.pump() == 0 {
            warn!(frame = n, "No frame drawn");
            continue;
        }

        let Some(encoded) = view.surface().and_then(|s| s.encode_png()) else {
            warn!(frame = n, "Surface has no frame to encode");
            continue;
        };
        let png = encoded.context("Failed to encode frame")?;

        let path = args.output_dir.join(format!("frame_{:04}.png", n));
        std::fs::write(&path, &png)
            .with_context(|| format!("Failed to write frame: {}", path.display()))?;
        written += 1;
    }

    view.stop();

    let info = view.layer_info();
    info!(
        parameter = %info.key,
        range = %info.range,
        data_points = info.data_points,
        frames_written = written,
        frames_skipped = view.frames_skipped(),
        t = view.t(),
        "Finished rendering"
    );

    Ok(())
}
