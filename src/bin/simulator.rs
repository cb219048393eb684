use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use kiss3d::window::Window;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use solar_orrery::file::{self, BodyRecord};
use solar_orrery::gui::{Kiss3dSurface, Viewer};
use solar_orrery::model::catalog;
use solar_orrery::model::BodyDescriptor;
use solar_orrery::render::headless::HeadlessSurface;
use solar_orrery::scene::{Scene, SceneConfig, SceneOptions};
use solar_orrery::textures::DirectorySource;

/// Animated model of the solar system.
#[derive(Debug, Parser)]
struct Args {
    /// Body table to load. Defaults to the built-in solar system.
    #[arg(long)]
    bodies: Option<PathBuf>,
    /// Directory holding one `<name>.jpg` texture per body.
    #[arg(long, default_value = "textures")]
    textures: PathBuf,
    /// Show a single body up close instead of the whole system.
    #[arg(long)]
    planet: Option<String>,
    /// Seed for orbital phases and the starfield.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    no_stars: bool,
    #[arg(long)]
    no_pan: bool,
    /// Run this many frames without a window, then report leaked resources.
    #[arg(long)]
    headless_frames: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let records: Vec<BodyRecord> = match &args.bodies {
        Some(path) => file::read_file(path)
            .with_context(|| format!("loading bodies from {}", path.display()))?,
        None => catalog::solar_system_catalog()
            .into_iter()
            .map(|entry| BodyRecord { entry, phase: None })
            .collect(),
    };

    let (descriptors, mut config) = match &args.planet {
        Some(name) => (
            vec![file::planet_viewer(&records, name)?],
            SceneConfig::planet_viewer(),
        ),
        None => (
            file::to_descriptors(&records, &mut rng),
            SceneConfig::default(),
        ),
    };
    if args.no_stars {
        config.starfield = None;
    }
    config.camera.enable_pan = !args.no_pan;
    config.seed = args.seed;

    let source = Arc::new(DirectorySource::new(
        &args.textures,
        &config.texture_extension,
    ));
    let options = SceneOptions::new(source).with_config(config);

    match args.headless_frames {
        Some(frames) => run_headless(descriptors, options, frames),
        None => run_window(descriptors, options),
    }
}

fn run_window(descriptors: Vec<BodyDescriptor>, options: SceneOptions) -> anyhow::Result<()> {
    let mut window = Window::new("Solar System");
    window.set_background_color(0.0, 0.0, 0.0);
    window.set_framerate_limit(Some(60));

    let surface = Kiss3dSurface::new(&mut window);
    let scene = Scene::init(surface, descriptors, options)?;
    window.render_loop(Viewer::new(scene));
    Ok(())
}

fn run_headless(
    descriptors: Vec<BodyDescriptor>,
    options: SceneOptions,
    frames: u64,
) -> anyhow::Result<()> {
    let mut scene = Scene::init(HeadlessSurface::new(800, 600), descriptors, options)?;
    for _ in 0..frames {
        scene.step();
        thread::sleep(Duration::from_millis(16));
    }
    info!(
        "ran {} frames over {:.2}s, {} textures still pending",
        scene.scheduler().ticks(),
        scene.elapsed(),
        scene.pending_textures()
    );

    scene.teardown();
    let surface = scene.surface();
    info!(
        "{} resources created, {} disposed",
        surface.created(),
        surface.disposed()
    );
    if surface.live_resources() > 0
        || surface.double_disposals() > 0
        || surface.created_after_release() > 0
    {
        bail!(
            "{} resources leaked, {} disposed twice, {} created after release",
            surface.live_resources(),
            surface.double_disposals(),
            surface.created_after_release()
        );
    }
    Ok(())
}
