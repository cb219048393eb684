//! The drawing-surface contract.
//!
//! A [Surface] owns GPU-side objects and hands out typed IDs for them. The
//! scene never touches a graphics API directly; it only allocates, mutates
//! and disposes resources through this trait. That keeps the lifecycle rules
//! (everything allocated at init is disposed exactly once at teardown)
//! checkable without a GPU, see [headless::HeadlessSurface].

use std::fmt;

use image::{Rgba, RgbaImage};
use nalgebra::{Isometry3, Matrix4, Perspective3, Point3};

use crate::model::Rgb;

pub mod headless;

macro_rules! resource_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

resource_id!(GeometryID);
resource_id!(MaterialID);
resource_id!(TextureID);
resource_id!(MeshID);
resource_id!(LightID);

/// Anything a surface can be asked to dispose.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Resource {
    Geometry(GeometryID),
    Material(MaterialID),
    Texture(TextureID),
    Mesh(MeshID),
    Light(LightID),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Sphere { radius: f32, segments: u32 },
    /// Closed polyline; the last point connects back to the first.
    LineLoop { points: Vec<Point3<f32>> },
    PointCloud { points: Vec<Point3<f32>> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Self-illuminated; ignores lights entirely.
    Unlit,
    Standard { roughness: f32, metalness: f32 },
    Line { opacity: f32 },
    Points { size: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub shading: Shading,
    /// Base color. Multiplies the texture when one is bound.
    pub color: Rgb,
    pub texture: Option<TextureID>,
}

impl Material {
    pub fn new(shading: Shading, color: Rgb) -> Self {
        Material {
            shading,
            color,
            texture: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowFlags {
    pub cast: bool,
    pub receive: bool,
}

impl ShadowFlags {
    pub const NONE: ShadowFlags = ShadowFlags {
        cast: false,
        receive: false,
    };
    pub const BOTH: ShadowFlags = ShadowFlags {
        cast: true,
        receive: true,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Point {
        position: Point3<f32>,
        color: Rgb,
        intensity: f32,
        /// Zero means no falloff with distance.
        range: f32,
        shadow_map_size: Option<u32>,
    },
    Directional {
        position: Point3<f32>,
        color: Rgb,
        intensity: f32,
        shadow_map_size: Option<u32>,
    },
    Ambient {
        color: Rgb,
        intensity: f32,
    },
}

impl Light {
    pub fn casts_shadows(&self) -> bool {
        match self {
            Light::Point {
                shadow_map_size, ..
            }
            | Light::Directional {
                shadow_map_size, ..
            } => shadow_map_size.is_some(),
            Light::Ambient { .. } => false,
        }
    }
}

/// Decoded image data ready to be uploaded: tightly packed RGBA8 rows, top
/// row first. Decoding happens on the loader's worker thread, so handing one
/// of these to a surface costs no more than the upload itself.
#[derive(Clone)]
pub struct TextureImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn from_rgba(name: &str, image: RgbaImage) -> Self {
        TextureImage {
            name: name.to_owned(),
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        }
    }

    /// A single-color image.
    pub fn solid(name: &str, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::from_rgba(name, RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }
}

impl fmt::Debug for TextureImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureImage")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

/// Everything a surface needs to know about the viewpoint for one frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraView {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub view: Isometry3<f32>,
    pub projection: Perspective3<f32>,
}

impl CameraView {
    pub fn transformation(&self) -> Matrix4<f32> {
        self.projection.as_matrix() * self.view.to_homogeneous()
    }
}

pub trait Surface {
    /// Drawable size in pixels.
    fn size(&self) -> (u32, u32);

    fn set_size(&mut self, width: u32, height: u32);

    fn create_geometry(&mut self, geometry: Geometry) -> GeometryID;

    fn create_material(&mut self, material: Material) -> MaterialID;

    /// Replaces a material's state in place. Every mesh using it picks up the
    /// change on the next render.
    fn update_material(&mut self, id: MaterialID, material: &Material);

    fn create_texture(&mut self, image: TextureImage) -> TextureID;

    fn create_mesh(
        &mut self,
        geometry: GeometryID,
        material: MaterialID,
        shadows: ShadowFlags,
    ) -> MeshID;

    fn set_transform(&mut self, mesh: MeshID, transform: &Isometry3<f32>);

    fn create_light(&mut self, light: Light) -> LightID;

    /// Turns shadow-map rendering on or off for the whole surface.
    fn set_shadow_mapping(&mut self, enabled: bool);

    fn render(&mut self, view: &CameraView);

    fn dispose(&mut self, resource: Resource);

    /// Releases the surface's own backing resources (framebuffers, shadow
    /// maps, the drawing context). Nothing may be created afterwards.
    fn release(&mut self);
}
