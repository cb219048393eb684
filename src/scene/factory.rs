//! Builds the drawable objects of a scene: bodies, orbit guides, the
//! starfield and the lights.

use nalgebra::{Point2, Point3};
use rand::Rng;
use tracing::{debug, error, info};

use super::config::{Lighting, SceneConfig};
use crate::math::paths::{circle_points, starfield_points};
use crate::model::motion::{body_transform, compute_position};
use crate::model::{BodyDescriptor, BodyID, Rgb};
use crate::render::{
    Geometry, GeometryID, Light, LightID, Material, MaterialID, MeshID, Resource, ShadowFlags,
    Shading, Surface, TextureID, TextureImage,
};
use crate::textures::{TextureError, TextureLoader, TextureState};

/// Tint of a lit body whose texture hasn't shown up yet. Light enough not to
/// muddy the texture once it does.
const PLACEHOLDER_TINT: u32 = 0xaaaaaa;
const BODY_ROUGHNESS: f32 = 0.8;
const BODY_METALNESS: f32 = 0.1;

/// A mesh plus the geometry and material it was built from.
#[derive(Debug, Clone, Copy)]
pub struct Drawable {
    pub mesh: MeshID,
    pub geometry: GeometryID,
    pub material: MaterialID,
}

impl Drawable {
    fn create<S: Surface>(
        surface: &mut S,
        geometry: Geometry,
        material: Material,
        shadows: ShadowFlags,
    ) -> Self {
        let geometry = surface.create_geometry(geometry);
        let material = surface.create_material(material);
        let mesh = surface.create_mesh(geometry, material, shadows);
        Drawable {
            mesh,
            geometry,
            material,
        }
    }

    /// Mesh first, so nothing is ever left pointing at a freed resource.
    pub fn resources(&self) -> [Resource; 3] {
        [
            Resource::Mesh(self.mesh),
            Resource::Material(self.material),
            Resource::Geometry(self.geometry),
        ]
    }
}

#[derive(Debug)]
pub struct CelestialBody {
    id: BodyID,
    descriptor: BodyDescriptor,
    drawable: Drawable,
    // What we last told the surface the material looks like
    material: Material,
    texture: Option<TextureID>,
    texture_state: TextureState,
    position: Point2<f64>,
    rotation_y: f64,
}

impl CelestialBody {
    pub fn id(&self) -> BodyID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &BodyDescriptor {
        &self.descriptor
    }

    pub fn drawable(&self) -> &Drawable {
        &self.drawable
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn texture_state(&self) -> TextureState {
        self.texture_state
    }

    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    pub fn rotation_y(&self) -> f64 {
        self.rotation_y
    }

    pub(crate) fn set_motion(&mut self, position: Point2<f64>, rotation_y: f64) {
        self.position = position;
        self.rotation_y = rotation_y;
    }

    pub(crate) fn sync_transform<S: Surface>(&self, surface: &mut S) {
        surface.set_transform(
            self.drawable.mesh,
            &body_transform(self.position, self.rotation_y),
        );
    }

    /// Applies the outcome of this body's texture load. Only the first
    /// outcome counts; later ones are ignored and return `false`.
    pub(crate) fn resolve_texture<S: Surface>(
        &mut self,
        surface: &mut S,
        result: Result<TextureImage, TextureError>,
    ) -> bool {
        if self.texture_state != TextureState::Pending {
            debug!(
                "{} already resolved its texture ({:?}); ignoring",
                self.name(),
                self.texture_state
            );
            return false;
        }

        match result {
            Ok(image) => {
                let (width, height) = (image.width, image.height);
                let texture = surface.create_texture(image);
                self.texture = Some(texture);
                self.material.texture = Some(texture);
                // Neutral tint, so the texture shows unfiltered
                self.material.color = Rgb::WHITE;
                self.texture_state = TextureState::Loaded;
                info!("texture for {} loaded ({}x{})", self.name(), width, height);
            }
            Err(err) => {
                error!(
                    "failed to load texture for {}, falling back to color: {}",
                    self.name(),
                    err
                );
                self.material.color = self.descriptor.fallback_color;
                self.texture_state = TextureState::Failed;
            }
        }

        surface.update_material(self.drawable.material, &self.material);
        true
    }

    pub fn resources(&self) -> Vec<Resource> {
        let mut resources = self.drawable.resources().to_vec();
        if let Some(texture) = self.texture {
            resources.push(Resource::Texture(texture));
        }
        resources
    }
}

/// Makes the body's mesh, places it at its starting point, and kicks off its
/// texture load. The load finishes whenever it finishes; the body is fully
/// usable in the meantime.
pub fn build_body<S: Surface>(
    surface: &mut S,
    id: BodyID,
    descriptor: BodyDescriptor,
    config: &SceneConfig,
    loader: &TextureLoader,
) -> CelestialBody {
    let radius = (descriptor.mean_radius * config.radius_scale) as f32;
    let geometry = Geometry::Sphere {
        radius,
        segments: config.sphere_segments,
    };

    let (material, shadows) = if descriptor.is_emissive {
        (Material::new(Shading::Unlit, Rgb::WHITE), ShadowFlags::NONE)
    } else {
        let shading = Shading::Standard {
            roughness: BODY_ROUGHNESS,
            metalness: BODY_METALNESS,
        };
        (
            Material::new(shading, Rgb::from_hex(PLACEHOLDER_TINT)),
            ShadowFlags::BOTH,
        )
    };

    let drawable = Drawable::create(surface, geometry, material.clone(), shadows);
    let body = CelestialBody {
        id,
        position: compute_position(&descriptor, 0.0),
        rotation_y: 0.0,
        descriptor,
        drawable,
        material,
        texture: None,
        texture_state: TextureState::Pending,
    };
    body.sync_transform(surface);

    loader.request(id, body.name());
    debug!("built body {} {} with radius {}", id, body.name(), radius);
    body
}

/// Static circle tracing a body's orbit.
#[derive(Debug, Clone, Copy)]
pub struct OrbitGuide {
    pub body: BodyID,
    pub drawable: Drawable,
}

pub fn build_orbit_guide<S: Surface>(
    surface: &mut S,
    body: BodyID,
    descriptor: &BodyDescriptor,
    config: &SceneConfig,
) -> OrbitGuide {
    let points = circle_points(descriptor.orbit_distance as f32, config.orbit_guide_segments);
    let material = Material::new(
        Shading::Line {
            opacity: config.orbit_guide_opacity,
        },
        Rgb::WHITE,
    );
    let drawable = Drawable::create(
        surface,
        Geometry::LineLoop { points },
        material,
        ShadowFlags::NONE,
    );
    OrbitGuide { body, drawable }
}

pub fn build_starfield<S: Surface, R: Rng + ?Sized>(
    surface: &mut S,
    rng: &mut R,
    config: &SceneConfig,
) -> Option<Drawable> {
    let stars = config.starfield.as_ref()?;
    let points = starfield_points(rng, stars.count, stars.spread);
    let material = Material::new(
        Shading::Points {
            size: stars.point_size,
        },
        stars.color,
    );
    Some(Drawable::create(
        surface,
        Geometry::PointCloud { points },
        material,
        ShadowFlags::NONE,
    ))
}

/// Lights for the scene. A central point light sits at `center`.
pub fn build_lights<S: Surface>(
    surface: &mut S,
    config: &SceneConfig,
    center: Point3<f32>,
) -> Vec<LightID> {
    let lights = match config.lighting {
        Lighting::CentralPoint {
            intensity,
            shadow_map_size,
            ambient,
        } => vec![
            Light::Point {
                position: center,
                color: Rgb::WHITE,
                intensity,
                range: 0.0,
                shadow_map_size,
            },
            Light::Ambient {
                color: Rgb::WHITE,
                intensity: ambient,
            },
        ],
        Lighting::Directional {
            position,
            intensity,
            ambient,
        } => vec![
            Light::Directional {
                position: Point3::from(position),
                color: Rgb::WHITE,
                intensity,
                shadow_map_size: Some(2048),
            },
            Light::Ambient {
                color: Rgb::WHITE,
                intensity: ambient,
            },
        ],
    };

    let shadows = lights.iter().any(Light::casts_shadows);
    debug!("shadow mapping {}", if shadows { "on" } else { "off" });
    surface.set_shadow_mapping(shadows);

    lights
        .into_iter()
        .map(|light| surface.create_light(light))
        .collect()
}
