use crate::model::Rgb;

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view, in degrees.
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub initial_distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// `None` disables damping: input moves the camera immediately.
    pub damping_factor: Option<f32>,
    pub enable_pan: bool,
    pub enable_zoom: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            fovy_degrees: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            initial_distance: 50.0,
            min_distance: 20.0,
            max_distance: 200.0,
            damping_factor: Some(0.05),
            enable_pan: true,
            enable_zoom: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lighting {
    /// A point light inside the central body, plus ambient fill.
    CentralPoint {
        intensity: f32,
        shadow_map_size: Option<u32>,
        ambient: f32,
    },
    /// A fixed directional light, plus ambient fill.
    Directional {
        position: [f32; 3],
        intensity: f32,
        ambient: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarfieldConfig {
    pub count: usize,
    /// Side length of the cube the stars are scattered through.
    pub spread: f32,
    pub point_size: f32,
    pub color: Rgb,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        StarfieldConfig {
            count: 10_000,
            spread: 2000.0,
            point_size: 0.1,
            color: Rgb::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinRates {
    /// Radians per tick.
    pub central: f64,
    /// Radians per tick.
    pub orbiting: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub lighting: Lighting,
    pub starfield: Option<StarfieldConfig>,
    /// Seed for the starfield. `None` draws from the OS.
    pub seed: Option<u64>,
    pub orbit_guides: bool,
    pub orbit_guide_segments: usize,
    pub orbit_guide_opacity: f32,
    pub sphere_segments: u32,
    /// Multiplies a descriptor's mean radius to get the rendered radius.
    pub radius_scale: f64,
    pub spin: SpinRates,
    pub texture_extension: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            camera: CameraConfig::default(),
            lighting: Lighting::CentralPoint {
                intensity: 500.0,
                shadow_map_size: Some(2048),
                ambient: 0.25,
            },
            starfield: Some(StarfieldConfig::default()),
            seed: None,
            orbit_guides: true,
            orbit_guide_segments: 128,
            orbit_guide_opacity: 0.2,
            sphere_segments: 32,
            radius_scale: 1.0 / 12.0,
            spin: SpinRates {
                central: 0.001,
                orbiting: 0.005,
            },
            texture_extension: String::from("jpg"),
        }
    }
}

impl SceneConfig {
    /// Close-up view of one body: no stars, no guides, a fixed key light.
    pub fn planet_viewer() -> Self {
        SceneConfig {
            camera: CameraConfig {
                initial_distance: 80.0,
                ..CameraConfig::default()
            },
            lighting: Lighting::Directional {
                position: [10.0, 5.0, 20.0],
                intensity: 2.0,
                ambient: 0.2,
            },
            starfield: None,
            orbit_guides: false,
            sphere_segments: 64,
            radius_scale: 1.0,
            spin: SpinRates {
                central: 0.005,
                orbiting: 0.005,
            },
            ..SceneConfig::default()
        }
    }
}
