use std::fmt;

use nalgebra::Point3;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BodyID(pub usize);

impl fmt::Display for BodyID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which way a body travels around its orbit, looking down the +z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prograde,
    Retrograde,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Prograde => 1.0,
            Direction::Retrograde => -1.0,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Prograde
    }
}

/// Linear RGB, each channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Rgb { r, g, b }
    }

    /// Unpacks a 0xRRGGBB literal.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Rgb::new(channel(16), channel(8), channel(0))
    }

    pub fn scaled(self, factor: f32) -> Self {
        Rgb::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_point(self) -> Point3<f32> {
        Point3::new(self.r, self.g, self.b)
    }
}

// All the immutable info about a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDescriptor {
    /// Unique within a scene. Also names the body's texture.
    pub name: String,
    pub mean_radius: f64,
    /// Zero for the central body.
    pub orbit_distance: f64,
    pub angular_speed_factor: f64,
    pub fallback_color: Rgb,
    /// Radians.
    pub initial_phase: f64,
    pub direction: Direction,
    pub is_emissive: bool,
}

impl BodyDescriptor {
    /// Central bodies sit at the origin: they spin but never orbit, and get
    /// no orbit guide.
    pub fn is_central(&self) -> bool {
        self.is_emissive || self.orbit_distance == 0.0
    }

    /// Checks the fields that would otherwise produce NaN positions or
    /// degenerate geometry. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(String::from("name is empty"));
        }
        if !(self.mean_radius.is_finite() && self.mean_radius > 0.0) {
            return Err(format!("mean radius {} is not positive", self.mean_radius));
        }
        if !(self.orbit_distance.is_finite() && self.orbit_distance >= 0.0) {
            return Err(format!(
                "orbit distance {} is negative or not finite",
                self.orbit_distance
            ));
        }
        if !self.angular_speed_factor.is_finite() {
            return Err(String::from("angular speed factor is not finite"));
        }
        if !self.initial_phase.is_finite() {
            return Err(String::from("initial phase is not finite"));
        }
        Ok(())
    }

    /// Location of the body's texture relative to a texture root.
    pub fn texture_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.name, extension)
    }
}
