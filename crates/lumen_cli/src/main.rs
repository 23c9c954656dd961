use anyhow::{Context, Result};
use clap::Parser;
use lumen_renderer::{Camera, HittableList, RenderScheduler, SceneDescription};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Render a JSON scene to a PNG.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about)]
struct Args {
    /// Scene description (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Output image path
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Override the scene's image width
    #[arg(long)]
    width: Option<u32>,

    /// Override the scene's samples per pixel
    #[arg(long)]
    samples: Option<u32>,

    /// Override the scene's bounce limit
    #[arg(long)]
    max_depth: Option<u32>,

    /// Worker threads (defaults to available parallelism)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Seed for the per-row random streams
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Give up if no row arrives within this many seconds
    #[arg(long)]
    row_timeout: Option<f64>,
}

impl Args {
    fn apply_overrides(&self, camera: &mut Camera) {
        let settings = camera.settings_mut();
        if let Some(width) = self.width {
            settings.image_width = width;
        }
        if let Some(samples) = self.samples {
            settings.samples_per_pixel = samples;
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
    }

    fn row_timeout(&self) -> Result<Option<Duration>> {
        self.row_timeout
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("Invalid row timeout: {secs}"))
            })
            .transpose()
    }
}

fn render(args: &Args, camera: &Camera, world: &Arc<HittableList>) -> Result<()> {
    let scheduler = match args.threads {
        Some(threads) => RenderScheduler::new(threads)?,
        None => RenderScheduler::with_available_parallelism()?,
    };
    let timeout = args.row_timeout()?;

    let viewport = *camera.viewport()?;
    log::info!(
        "Rendering {}x{} @ {} spp, depth {} on {} threads",
        viewport.image_width,
        viewport.image_height,
        viewport.samples_per_pixel,
        viewport.max_depth,
        scheduler.workers()
    );

    let start = Instant::now();
    let mut handle = camera.render(world, &scheduler, args.seed)?;

    let mut next_report = 0.1;
    while handle.next_row(timeout)?.is_some() {
        let fraction = handle.progress().fraction();
        if fraction >= next_report {
            log::info!("{:>3.0}% ({:.1}s)", fraction * 100.0, start.elapsed().as_secs_f32());
            while next_report <= fraction {
                next_report += 0.1;
            }
        }
    }
    let image = handle.wait(timeout)?;
    log::info!("Rendered in {:.2}s", start.elapsed().as_secs_f32());

    image::save_buffer(
        &args.output,
        image.as_bytes(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("Failed to write {:?}", args.output))?;
    log::info!("Saved {:?}", args.output);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    log::info!("Starting Lumen");

    let description = SceneDescription::load(&args.scene)
        .with_context(|| format!("Failed to load scene {:?}", args.scene))?;
    let scene = description
        .build()
        .with_context(|| format!("Invalid scene {:?}", args.scene))?;

    let mut camera = scene.camera;
    args.apply_overrides(&mut camera);
    anyhow::ensure!(
        camera.settings().image_width > 0 && camera.settings().samples_per_pixel > 0,
        "Width and samples must be at least 1"
    );
    camera.initialize();

    render(&args, &camera, &scene.world)
}
