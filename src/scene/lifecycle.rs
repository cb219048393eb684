//! The scene as a whole: built once, animated frame by frame, torn down
//! exactly once.

use std::collections::HashSet;
use std::sync::Arc;

use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::camera::{CameraInput, OrbitCamera};
use super::config::SceneConfig;
use super::error::SceneError;
use super::factory::{
    build_body, build_lights, build_orbit_guide, build_starfield, CelestialBody, Drawable,
    OrbitGuide,
};
use super::resize::ViewportResizeHandler;
use super::scheduler::{AnimationScheduler, Clock, FrameToken, SystemClock};
use crate::model::motion::{advance_spin, compute_position, to_scene_point};
use crate::model::{BodyDescriptor, BodyID};
use crate::render::{LightID, Resource, Surface};
use crate::textures::{
    Liveness, TextureEvent, TextureLoader, TextureSink, TextureSource, TextureState,
};

/// Everything a scene needs besides its surface and bodies.
pub struct SceneOptions {
    pub config: SceneConfig,
    pub textures: Arc<dyn TextureSource>,
    pub clock: Box<dyn Clock>,
}

impl SceneOptions {
    pub fn new(textures: Arc<dyn TextureSource>) -> Self {
        SceneOptions {
            config: SceneConfig::default(),
            textures,
            clock: Box::new(SystemClock::new()),
        }
    }

    pub fn with_config(mut self, config: SceneConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

// Everything that only exists between init and teardown
struct LiveScene {
    config: SceneConfig,
    bodies: Vec<CelestialBody>,
    guides: Vec<OrbitGuide>,
    starfield: Option<Drawable>,
    lights: Vec<LightID>,
    camera: OrbitCamera,
    loader: TextureLoader,
    resize: ViewportResizeHandler,
}

impl LiveScene {
    fn deliver<S: Surface>(&mut self, surface: &mut S, event: TextureEvent) -> bool {
        match self.bodies.get_mut(event.body.0) {
            Some(body) => body.resolve_texture(surface, event.result),
            None => {
                warn!("texture arrived for unknown body {}", event.body);
                false
            }
        }
    }

    fn advance<S: Surface>(&mut self, surface: &mut S, elapsed: f64) {
        let spin = &self.config.spin;
        for body in self.bodies.iter_mut() {
            let descriptor = body.descriptor();
            let (position, rate) = if descriptor.is_central() {
                (body.position(), spin.central)
            } else {
                (compute_position(descriptor, elapsed), spin.orbiting)
            };
            let rotation_y = advance_spin(body.rotation_y(), rate);
            body.set_motion(position, rotation_y);
            body.sync_transform(surface);
        }
    }

    fn resources(&self) -> Vec<Resource> {
        let mut resources: Vec<Resource> = self
            .bodies
            .iter()
            .flat_map(|body| body.resources())
            .collect();
        for guide in &self.guides {
            resources.extend_from_slice(&guide.drawable.resources());
        }
        if let Some(stars) = &self.starfield {
            resources.extend_from_slice(&stars.resources());
        }
        resources.extend(self.lights.iter().map(|&id| Resource::Light(id)));

        // Meshes go first, before anything they reference
        resources.sort_by_key(|r| !matches!(r, Resource::Mesh(_)));
        resources
    }
}

pub struct Scene<S: Surface> {
    surface: S,
    scheduler: AnimationScheduler,
    liveness: Liveness,
    live: Option<LiveScene>,
    next_frame: Option<FrameToken>,
}

fn validate_config(config: &SceneConfig) -> Result<(), SceneError> {
    if config.orbit_guides && config.orbit_guide_segments == 0 {
        return Err(SceneError::InvalidConfig(String::from(
            "orbit guides need at least one segment",
        )));
    }
    Ok(())
}

fn validate_descriptors(descriptors: &[BodyDescriptor]) -> Result<(), SceneError> {
    let mut seen = HashSet::new();
    for descriptor in descriptors {
        descriptor
            .validate()
            .map_err(|reason| SceneError::InvalidDescriptor {
                name: descriptor.name.clone(),
                reason,
            })?;
        if !seen.insert(descriptor.name.to_lowercase()) {
            return Err(SceneError::DuplicateBody(descriptor.name.clone()));
        }
    }
    Ok(())
}

impl<S: Surface> Scene<S> {
    /// Builds every body, guide and light, starts the texture loads, and arms
    /// the first frame. Inputs are checked before anything is allocated, so
    /// an error leaves the surface untouched.
    pub fn init(
        mut surface: S,
        descriptors: Vec<BodyDescriptor>,
        options: SceneOptions,
    ) -> Result<Self, SceneError> {
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            return Err(SceneError::InvalidSurface { width, height });
        }
        validate_config(&options.config)?;
        validate_descriptors(&descriptors)?;

        let SceneOptions {
            config,
            textures,
            clock,
        } = options;

        let liveness = Liveness::new();
        let loader = TextureLoader::new(textures, liveness.clone());
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // The key light sits inside the emissive body, wherever that starts
        let center: Point3<f32> = descriptors
            .iter()
            .find(|d| d.is_emissive)
            .map(|d| nalgebra::convert(to_scene_point(compute_position(d, 0.0))))
            .unwrap_or_else(Point3::origin);
        let lights = build_lights(&mut surface, &config, center);
        let starfield = build_starfield(&mut surface, &mut rng, &config);

        let mut guides = vec![];
        let mut bodies = Vec::with_capacity(descriptors.len());
        for (idx, descriptor) in descriptors.into_iter().enumerate() {
            let id = BodyID(idx);
            if config.orbit_guides && !descriptor.is_central() {
                guides.push(build_orbit_guide(&mut surface, id, &descriptor, &config));
            }
            bodies.push(build_body(&mut surface, id, descriptor, &config, &loader));
        }

        let camera = OrbitCamera::new(&config.camera, width, height);
        let resize = ViewportResizeHandler::new(width, height);
        let mut scheduler = AnimationScheduler::new(clock);
        let next_frame = scheduler.start();

        info!(
            "scene up with {} bodies at {}x{}",
            bodies.len(),
            width,
            height
        );

        Ok(Scene {
            surface,
            scheduler,
            liveness,
            live: Some(LiveScene {
                config,
                bodies,
                guides,
                starfield,
                lights,
                camera,
                loader,
                resize,
            }),
            next_frame,
        })
    }

    /// The frame the scheduler has armed, if it's running.
    pub fn next_frame(&self) -> Option<FrameToken> {
        self.next_frame
    }

    /// One animation tick: apply any finished texture loads, move the camera
    /// and the bodies, then draw. Returns the token for the following frame,
    /// or `None` if `token` was stale or the scene is stopped.
    pub fn on_frame(&mut self, token: FrameToken) -> Option<FrameToken> {
        let live = match self.live.as_mut() {
            Some(live) => live,
            None => return None,
        };
        let surface = &mut self.surface;

        let next = self.scheduler.tick(token, |elapsed| {
            for event in live.loader.drain() {
                live.deliver(surface, event);
            }
            live.camera.update();
            live.advance(surface, elapsed);
            surface.render(&live.camera.view());
        });

        self.next_frame = next;
        next
    }

    /// Runs the armed frame, if there is one.
    pub fn step(&mut self) -> bool {
        match self.next_frame {
            Some(token) => self.on_frame(token).is_some(),
            None => false,
        }
    }

    /// Restarts a stopped scene. Returns whether a loop was started; a
    /// running or torn-down scene is left alone.
    pub fn start(&mut self) -> bool {
        if self.live.is_none() {
            warn!("can't start a scene that has been torn down");
            return false;
        }
        match self.scheduler.start() {
            Some(token) => {
                self.next_frame = Some(token);
                true
            }
            None => false,
        }
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.next_frame = None;
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        match self.live.as_mut() {
            Some(live) => live
                .resize
                .apply(&mut live.camera, &mut self.surface, width, height),
            None => false,
        }
    }

    pub fn camera_input(&mut self, input: CameraInput) {
        if let Some(live) = self.live.as_mut() {
            live.camera.handle_input(input);
        }
    }

    /// Applies a texture outcome right away rather than waiting for the next
    /// frame. After teardown this does nothing and returns `false`.
    pub fn deliver_texture(&mut self, event: TextureEvent) -> bool {
        if !self.liveness.is_alive() {
            debug!("scene is gone, dropping texture for {}", event.body);
            return false;
        }
        match self.live.as_mut() {
            Some(live) => live.deliver(&mut self.surface, event),
            None => false,
        }
    }

    /// A handle that can post texture outcomes from any thread. They're
    /// applied on the next frame.
    pub fn texture_sink(&self) -> Option<TextureSink> {
        self.live.as_ref().map(|live| live.loader.sink())
    }

    /// Stops the loop, cuts off outstanding texture loads and disposes every
    /// resource the scene created, then releases the surface. Safe to call
    /// any number of times; only the first does anything.
    pub fn teardown(&mut self) {
        let live = match self.live.take() {
            Some(live) => live,
            None => {
                debug!("scene already torn down");
                return;
            }
        };

        self.stop();
        self.liveness.kill();

        let resources = live.resources();
        let count = resources.len();
        for resource in resources {
            self.surface.dispose(resource);
        }
        self.surface.release();

        info!(
            "scene torn down after {:.2}s and {} ticks, {} resources disposed",
            self.scheduler.elapsed(),
            self.scheduler.ticks(),
            count
        );
    }

    pub fn is_alive(&self) -> bool {
        self.live.is_some()
    }

    /// Empty once the scene is torn down.
    pub fn bodies(&self) -> &[CelestialBody] {
        match &self.live {
            Some(live) => &live.bodies,
            None => &[],
        }
    }

    pub fn body(&self, name: &str) -> Option<&CelestialBody> {
        self.bodies()
            .iter()
            .find(|body| body.name().eq_ignore_ascii_case(name))
    }

    pub fn orbit_guides(&self) -> &[OrbitGuide] {
        match &self.live {
            Some(live) => &live.guides,
            None => &[],
        }
    }

    pub fn camera(&self) -> Option<&OrbitCamera> {
        self.live.as_ref().map(|live| &live.camera)
    }

    pub fn config(&self) -> Option<&SceneConfig> {
        self.live.as_ref().map(|live| &live.config)
    }

    /// Bodies still waiting on their texture.
    pub fn pending_textures(&self) -> usize {
        self.bodies()
            .iter()
            .filter(|body| body.texture_state() == TextureState::Pending)
            .count()
    }

    pub fn elapsed(&self) -> f64 {
        self.scheduler.elapsed()
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

impl<S: Surface> Drop for Scene<S> {
    fn drop(&mut self) {
        if self.is_alive() {
            self.teardown();
        }
    }
}
