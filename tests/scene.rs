use std::f64::consts::PI;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::Point2;
use solar_orrery::model::catalog::solar_system_catalog;
use solar_orrery::model::{BodyDescriptor, BodyID, Direction, Rgb};
use solar_orrery::render::headless::HeadlessSurface;
use solar_orrery::render::{Surface, TextureImage};
use solar_orrery::scene::{CameraInput, ManualClock, Scene, SceneConfig, SceneError, SceneOptions};
use solar_orrery::textures::{MemorySource, TextureEvent, TextureSource, TextureState};

const MARS_RED: u32 = 0xcd5c5c;

fn tiny_png() -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(4, 2);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png).unwrap();
    buf.into_inner()
}

fn body(name: &str, distance: f64, speed: f64, color: u32) -> BodyDescriptor {
    BodyDescriptor {
        name: name.to_owned(),
        mean_radius: 8.0,
        orbit_distance: distance,
        angular_speed_factor: speed,
        fallback_color: Rgb::from_hex(color),
        initial_phase: 0.0,
        direction: Direction::Prograde,
        is_emissive: false,
    }
}

fn sun() -> BodyDescriptor {
    BodyDescriptor {
        is_emissive: true,
        ..body("sun", 0.0, 0.0, 0xffa500)
    }
}

/// Sun, earth and mars, with textures for everything but mars.
fn small_system() -> Vec<BodyDescriptor> {
    vec![
        sun(),
        body("earth", 120.0, 1.0, 0x2233ff),
        body("mars", 150.0, 0.53, MARS_RED),
    ]
}

fn textures_without_mars() -> Arc<dyn TextureSource> {
    Arc::new(
        MemorySource::new()
            .with_image("sun", tiny_png())
            .with_image("earth", tiny_png()),
    )
}

fn options(clock: &ManualClock, textures: Arc<dyn TextureSource>) -> SceneOptions {
    let config = SceneConfig {
        seed: Some(7),
        ..SceneConfig::default()
    };
    SceneOptions::new(textures)
        .with_config(config)
        .with_clock(Box::new(clock.clone()))
}

fn start_scene(clock: &ManualClock) -> Scene<HeadlessSurface> {
    Scene::init(
        HeadlessSurface::new(800, 600),
        small_system(),
        options(clock, textures_without_mars()),
    )
    .unwrap()
}

/// Ticks until every texture has resolved one way or the other.
fn settle_textures(scene: &mut Scene<HeadlessSurface>, clock: &ManualClock) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while scene.pending_textures() > 0 {
        assert!(Instant::now() < deadline, "textures never resolved");
        clock.advance_secs(0.016);
        scene.step();
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_zero_sized_surface_is_rejected() {
    let clock = ManualClock::new();
    let result = Scene::init(
        HeadlessSurface::new(0, 600),
        small_system(),
        options(&clock, textures_without_mars()),
    );
    assert_eq!(
        result.err(),
        Some(SceneError::InvalidSurface {
            width: 0,
            height: 600
        })
    );
}

#[test]
fn test_init_builds_everything() {
    let clock = ManualClock::new();
    let scene = start_scene(&clock);

    assert_eq!(scene.bodies().len(), 3);
    assert_eq!(scene.orbit_guides().len(), 2);
    assert!(scene.scheduler().is_running());
    assert_eq!(scene.body("EARTH").map(|b| b.id()), Some(BodyID(1)));

    // 3 bodies and 2 guides at 3 resources each, a starfield, 2 lights
    assert_eq!(scene.surface().live_resources(), 3 * 3 + 2 * 3 + 3 + 2);
    assert_eq!(scene.surface().renders(), 0);
}

#[test]
fn test_earth_follows_its_orbit() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);

    assert!(scene.step());
    let earth = scene.body("earth").unwrap();
    assert_relative_eq!(earth.position(), Point2::new(120.0, 0.0), epsilon = 1e-9);

    clock.advance_secs(PI);
    assert!(scene.step());
    let earth = scene.body("earth").unwrap();
    assert_abs_diff_eq!(earth.position().x, -120.0, epsilon = 1e-6);
    assert_abs_diff_eq!(earth.position().y, 0.0, epsilon = 1e-6);

    // The mesh moved with it
    let mesh = scene.surface().mesh(earth.drawable().mesh).unwrap();
    assert_abs_diff_eq!(mesh.transform.translation.vector.x, -120.0, epsilon = 1e-3);

    // The sun stays put
    let sun = scene.body("sun").unwrap();
    assert_relative_eq!(sun.position(), Point2::origin());
    assert!(sun.rotation_y() > 0.0);
}

#[test]
fn test_retrograde_body_runs_backwards() {
    let clock = ManualClock::new();
    let mut retro = body("retro", 10.0, 1.0, 0xffffff);
    retro.direction = Direction::Retrograde;
    let mut scene = Scene::init(
        HeadlessSurface::new(800, 600),
        vec![sun(), retro],
        options(&clock, Arc::new(MemorySource::new())),
    )
    .unwrap();

    clock.advance_secs(PI / 2.0);
    scene.step();
    let retro = scene.body("retro").unwrap();
    assert_abs_diff_eq!(retro.position().y, -10.0, epsilon = 1e-6);
}

#[test]
fn test_spin_counts_ticks_not_time() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);

    clock.advance_secs(0.016);
    assert!(scene.step());
    let earth_before = scene.body("earth").unwrap().rotation_y();
    let sun_before = scene.body("sun").unwrap().rotation_y();

    // A long stall is still just one tick's worth of spin
    clock.advance_secs(1000.0);
    assert!(scene.step());
    let earth = scene.body("earth").unwrap();
    let sun = scene.body("sun").unwrap();
    assert_relative_eq!(earth.rotation_y() - earth_before, 0.005, epsilon = 1e-12);
    assert_relative_eq!(sun.rotation_y() - sun_before, 0.001, epsilon = 1e-12);

    // while the orbit follows the clock
    assert_abs_diff_eq!(
        earth.position(),
        Point2::new(120.0 * 1000.016f64.cos(), 120.0 * 1000.016f64.sin()),
        epsilon = 1e-6
    );
}

#[test]
fn test_zero_guide_segments_is_rejected() {
    let clock = ManualClock::new();
    let mut opts = options(&clock, textures_without_mars());
    opts.config.orbit_guide_segments = 0;

    let surface = HeadlessSurface::new(800, 600);
    let result = Scene::init(surface, small_system(), opts);
    assert!(matches!(result.err(), Some(SceneError::InvalidConfig(_))));

    // Fine without guides
    let mut opts = options(&clock, textures_without_mars());
    opts.config.orbit_guides = false;
    opts.config.orbit_guide_segments = 0;
    let scene = Scene::init(HeadlessSurface::new(800, 600), small_system(), opts).unwrap();
    assert!(scene.orbit_guides().is_empty());
}

#[test]
fn test_resize_updates_aspect_only() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);
    clock.advance_secs(1.0);
    scene.step();

    let before: Vec<_> = scene.bodies().iter().map(|b| b.position()).collect();
    assert!(scene.resize(400, 300));

    assert_eq!(scene.surface().size(), (400, 300));
    assert_relative_eq!(scene.camera().unwrap().aspect(), 400.0 / 300.0);
    let after: Vec<_> = scene.bodies().iter().map(|b| b.position()).collect();
    assert_eq!(before, after);

    // Degenerate sizes keep the last good projection
    assert!(!scene.resize(0, 0));
    assert_eq!(scene.surface().size(), (400, 300));

    // The next render picks up the new projection
    scene.step();
    let view = scene.surface().last_view().unwrap();
    assert_relative_eq!(
        view.projection.as_matrix()[(1, 1)] / view.projection.as_matrix()[(0, 0)],
        400.0 / 300.0,
        epsilon = 1e-4
    );
}

#[test]
fn test_missing_texture_falls_back_to_color() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);
    settle_textures(&mut scene, &clock);

    let mars = scene.body("mars").unwrap();
    assert_eq!(mars.texture_state(), TextureState::Failed);
    assert_eq!(mars.material().color, Rgb::from_hex(MARS_RED));
    let on_surface = scene.surface().material(mars.drawable().material).unwrap();
    assert_eq!(on_surface.color, Rgb::from_hex(MARS_RED));
    assert_eq!(on_surface.texture, None);

    for name in &["sun", "earth"] {
        let body = scene.body(name).unwrap();
        assert_eq!(body.texture_state(), TextureState::Loaded, "{}", name);
        assert_eq!(body.material().color, Rgb::WHITE);

        // Arrives decoded, ready to upload as is
        let texture = body.material().texture.unwrap();
        let image = scene.surface().texture(texture).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.pixels.len(), 4 * 2 * 4);
    }

    // The scene kept animating the whole time
    assert!(scene.scheduler().is_running());
    assert!(scene.surface().renders() > 0);
}

#[test]
fn test_stop_is_idempotent() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);
    assert!(scene.step());

    scene.stop();
    scene.stop();
    assert!(!scene.scheduler().is_running());
    assert!(!scene.step());

    let ticks = scene.scheduler().ticks();
    clock.advance_secs(5.0);
    assert!(!scene.step());
    assert_eq!(scene.scheduler().ticks(), ticks);
    assert!(scene.is_alive());
}

#[test]
fn test_start_twice_runs_one_loop() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);
    let first = scene.next_frame().unwrap();

    // Already running from init
    assert!(!scene.start());
    assert_eq!(scene.next_frame(), Some(first));

    for _ in 0..10 {
        assert!(scene.step());
    }
    assert_eq!(scene.scheduler().ticks(), 10);
    assert_eq!(scene.surface().renders(), 10);

    // Old tokens are dead
    assert_eq!(scene.on_frame(first), None);
    assert_eq!(scene.scheduler().ticks(), 10);
}

#[test]
fn test_restart_keeps_time_monotonic() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);
    clock.advance_secs(2.0);
    scene.step();

    scene.stop();
    clock.advance_secs(100.0);
    assert!(scene.start());
    clock.advance_secs(1.0);
    scene.step();

    assert_relative_eq!(scene.elapsed(), 3.0, epsilon = 1e-9);
}

#[test]
fn test_camera_glides_after_drag() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);

    // 100px drag right, half a radian of orbit in total
    scene.camera_input(CameraInput::Rotate { dx: 100.0, dy: 0.0 });
    scene.step();
    let one_frame = scene.camera().unwrap().eye();
    assert!(one_frame.x < 0.0);
    assert!(one_frame.x > -2.0);

    for _ in 0..200 {
        scene.step();
    }
    let settled = scene.camera().unwrap().eye();
    assert_abs_diff_eq!(settled.x, 50.0 * (-0.5f32).sin(), epsilon = 1e-2);
    assert_abs_diff_eq!(settled.coords.norm(), 50.0, epsilon = 1e-3);

    // Zoom isn't damped
    scene.camera_input(CameraInput::Zoom { steps: 5.0 });
    assert_relative_eq!(
        scene.camera().unwrap().distance(),
        50.0 * 0.95f32.powi(5),
        epsilon = 1e-4
    );
}

#[test]
fn test_teardown_releases_everything_once() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);
    settle_textures(&mut scene, &clock);
    let sink = scene.texture_sink().unwrap();
    let updates = scene.surface().material_updates();

    scene.teardown();
    assert!(!scene.is_alive());
    assert!(!scene.scheduler().is_running());
    assert_eq!(scene.surface().live_resources(), 0);
    assert_eq!(scene.surface().double_disposals(), 0);
    assert!(scene.surface().is_released());
    let disposed = scene.surface().disposed();

    scene.teardown();
    assert_eq!(scene.surface().disposed(), disposed);
    assert_eq!(scene.surface().double_disposals(), 0);

    // A load finishing late changes nothing
    let late = || TextureEvent {
        body: BodyID(2),
        result: Ok(TextureImage::solid("mars", 4, 2, [255, 0, 0, 255])),
    };
    assert!(!sink.complete(late()));
    assert!(!scene.deliver_texture(late()));
    assert!(!scene.step());
    assert_eq!(scene.surface().material_updates(), updates);
    assert_eq!(scene.surface().created_after_release(), 0);
    assert!(scene.bodies().is_empty());
}

#[test]
fn test_teardown_before_textures_arrive() {
    let clock = ManualClock::new();
    let mut scene = start_scene(&clock);

    // Workers may still be running; whatever they post is dropped
    scene.teardown();
    thread::sleep(Duration::from_millis(50));
    assert!(!scene.step());
    assert_eq!(scene.surface().live_resources(), 0);
    assert_eq!(scene.surface().double_disposals(), 0);
}

#[test]
fn test_full_catalog_runs_headless() {
    let clock = ManualClock::new();
    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(3);
    let descriptors: Vec<_> = solar_system_catalog()
        .iter()
        .map(|entry| entry.to_descriptor_random(&mut rng))
        .collect();
    let mut scene = Scene::init(
        HeadlessSurface::new(1280, 720),
        descriptors,
        options(&clock, Arc::new(MemorySource::new())),
    )
    .unwrap();

    for _ in 0..60 {
        clock.advance_secs(1.0 / 60.0);
        assert!(scene.step());
    }
    assert_eq!(scene.orbit_guides().len(), 8);
    for body in scene.bodies() {
        let expected = body.descriptor().orbit_distance;
        assert_relative_eq!(body.position().coords.norm(), expected, epsilon = 1e-9);
    }

    scene.teardown();
    assert_eq!(scene.surface().live_resources(), 0);
}
