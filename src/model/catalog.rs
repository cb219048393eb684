//! Built-in body tables.
//!
//! Catalog entries are in "catalog units": radii and distances are relative
//! sizes, and speeds are relative angular rates with Earth at 1.0. Converting
//! to a [BodyDescriptor] applies the scene scale factors.

use std::f64::consts::TAU;

use rand::Rng;

use super::body::{BodyDescriptor, Direction, Rgb};

/// Catalog distances are divided down by this much to get scene units.
pub const DISTANCE_SCALE: f64 = 1.0 / 10.0;
/// Catalog speeds are multiplied by this to get radians per second.
pub const SPEED_SCALE: f64 = 0.1;
/// Display radius of the lone body in the planet viewer, in scene units.
pub const VIEWER_BODY_RADIUS: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub radius: f64,
    pub distance: f64,
    pub speed: f64,
    pub color: Rgb,
    pub direction: Direction,
}

impl CatalogEntry {
    fn new(name: &str, radius: f64, distance: f64, speed: f64, color: u32) -> Self {
        CatalogEntry {
            name: name.to_owned(),
            radius,
            distance,
            speed,
            color: Rgb::from_hex(color),
            direction: Direction::Prograde,
        }
    }

    pub fn is_star(&self) -> bool {
        self.distance == 0.0
    }

    pub fn to_descriptor(&self, initial_phase: f64) -> BodyDescriptor {
        BodyDescriptor {
            name: self.name.clone(),
            mean_radius: self.radius,
            orbit_distance: self.distance * DISTANCE_SCALE,
            angular_speed_factor: self.speed * SPEED_SCALE,
            fallback_color: self.color,
            initial_phase,
            direction: self.direction,
            is_emissive: self.is_star(),
        }
    }

    /// Like [CatalogEntry::to_descriptor], but with the phase drawn uniformly
    /// from [0, 2pi) so that bodies don't start out lined up.
    pub fn to_descriptor_random<R: Rng + ?Sized>(&self, rng: &mut R) -> BodyDescriptor {
        let phase = if self.is_star() {
            0.0
        } else {
            rng.gen_range(0.0..TAU)
        };
        self.to_descriptor(phase)
    }
}

/// The Sun and its eight planets. The Sun comes first.
pub fn solar_system_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("sun", 40.0, 0.0, 0.0, 0xffa500),
        CatalogEntry::new("mercury", 4.0, 60.0, 4.15, 0x8c7853),
        CatalogEntry::new("venus", 7.0, 90.0, 1.62, 0xffc649),
        CatalogEntry::new("earth", 8.0, 120.0, 1.00, 0x2233ff),
        CatalogEntry::new("mars", 6.0, 150.0, 0.53, 0xcd5c5c),
        CatalogEntry::new("jupiter", 20.0, 210.0, 0.08, 0xc88b3a),
        CatalogEntry::new("saturn", 17.0, 270.0, 0.03, 0xfad5a5),
        CatalogEntry::new("uranus", 12.0, 330.0, 0.01, 0x4fd0e0),
        CatalogEntry::new("neptune", 12.0, 380.0, 0.006, 0x4166f5),
    ]
}

pub fn solar_system<R: Rng + ?Sized>(rng: &mut R) -> Vec<BodyDescriptor> {
    solar_system_catalog()
        .iter()
        .map(|entry| entry.to_descriptor_random(rng))
        .collect()
}

pub fn find_entry<'a>(catalog: &'a [CatalogEntry], name: &str) -> Option<&'a CatalogEntry> {
    catalog
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
}

/// A single body parked at the origin, for close-up viewing. Returns `None`
/// if the name isn't in the catalog.
pub fn planet_viewer(catalog: &[CatalogEntry], name: &str) -> Option<BodyDescriptor> {
    let entry = find_entry(catalog, name)?;
    Some(BodyDescriptor {
        name: entry.name.clone(),
        mean_radius: VIEWER_BODY_RADIUS,
        orbit_distance: 0.0,
        angular_speed_factor: 0.0,
        fallback_color: entry.color,
        initial_phase: 0.0,
        direction: Direction::Prograde,
        // Even the sun is lit normally in the viewer
        is_emissive: false,
    })
}
