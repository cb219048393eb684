//! [Surface] on top of a kiss3d window.
//!
//! Spheres become kiss3d scene nodes under one group node. Line loops and
//! point clouds have no retained-mode counterpart in kiss3d, so they're kept
//! here and re-queued into a [SceneRenderer] on every render.
//!
//! kiss3d's lighting is a single light with no intensity, ambient term or
//! shadow maps. The surface keeps the full light list anyway and exposes the
//! first positional light for the viewer to hand to the window. Unlit
//! spheres get their own shader, see [UnlitMaterial].
//!
//! Textures are uploaded straight to GL rather than through kiss3d's global
//! texture manager, which never lets go of anything. Dropping the last `Rc`
//! deletes the GL texture.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use kiss3d::context::Context;
use kiss3d::light::Light as WindowLight;
use kiss3d::resource::{Material as WindowMaterial, Texture};
use kiss3d::scene::SceneNode;
use kiss3d::window::Window;
use nalgebra::Isometry3;
use tracing::{debug, warn};

use super::renderers::SceneRenderer;
use super::unlit::UnlitMaterial;
use crate::render::{
    CameraView, Geometry, GeometryID, Light, LightID, Material, MaterialID, MeshID, Resource,
    ShadowFlags, Shading, Surface, TextureID, TextureImage,
};

type SharedMaterial = Rc<RefCell<Box<dyn WindowMaterial + 'static>>>;

/// Which kiss3d shader a sphere node should be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeShader {
    Default,
    Unlit,
}

impl NodeShader {
    fn for_material(material: &Material) -> Self {
        match material.shading {
            Shading::Unlit => NodeShader::Unlit,
            _ => NodeShader::Default,
        }
    }
}

enum MeshEntry {
    Node {
        node: SceneNode,
        material: MaterialID,
    },
    Immediate {
        geometry: GeometryID,
        material: MaterialID,
        transform: Isometry3<f32>,
    },
}

pub struct Kiss3dSurface {
    width: u32,
    height: u32,
    root: SceneNode,
    next_id: usize,
    geometries: HashMap<GeometryID, Geometry>,
    materials: HashMap<MaterialID, Material>,
    textures: HashMap<TextureID, Rc<Texture>>,
    meshes: HashMap<MeshID, MeshEntry>,
    lights: HashMap<LightID, Light>,
    renderer: SceneRenderer,
    // Shared by every unlit node
    unlit: Option<SharedMaterial>,
    shadow_mapping: bool,
    released: bool,
}

impl Kiss3dSurface {
    pub fn new(window: &mut Window) -> Self {
        let unlit = UnlitMaterial::new().map(|m| {
            let material: Box<dyn WindowMaterial> = Box::new(m);
            Rc::new(RefCell::new(material))
        });
        if unlit.is_none() {
            warn!("unlit shader unavailable; emissive bodies will be shaded");
        }

        Kiss3dSurface {
            width: window.width(),
            height: window.height(),
            root: window.add_group(),
            next_id: 0,
            geometries: HashMap::new(),
            materials: HashMap::new(),
            textures: HashMap::new(),
            meshes: HashMap::new(),
            lights: HashMap::new(),
            renderer: SceneRenderer::new(),
            unlit,
            shadow_mapping: false,
            released: false,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn renderer_mut(&mut self) -> &mut SceneRenderer {
        &mut self.renderer
    }

    /// The light kiss3d should use, if the scene has a positional one.
    pub fn window_light(&self) -> Option<WindowLight> {
        let mut ids: Vec<_> = self.lights.keys().collect();
        ids.sort();
        ids.into_iter().find_map(|id| match &self.lights[id] {
            Light::Point { position, .. } | Light::Directional { position, .. } => {
                Some(WindowLight::Absolute(*position))
            }
            Light::Ambient { .. } => None,
        })
    }

    /// Whether shadow maps were asked for. kiss3d can't draw them, so this
    /// is only reported.
    pub fn shadow_mapping(&self) -> bool {
        self.shadow_mapping
    }

    fn apply_material(&self, node: &mut SceneNode, material: &Material) {
        let c = material.color;
        node.set_color(c.r, c.g, c.b);
        if let Some(texture) = material.texture.and_then(|id| self.textures.get(&id)) {
            node.set_texture(texture.clone());
        }
        if let (NodeShader::Unlit, Some(unlit)) = (NodeShader::for_material(material), &self.unlit)
        {
            node.set_material(unlit.clone());
        }
    }
}

/// Uploads tightly packed RGBA8 pixels into a fresh GL texture.
fn upload_texture(image: &TextureImage) -> Rc<Texture> {
    let ctxt = Context::get();
    let texture = Texture::new();

    ctxt.active_texture(Context::TEXTURE0);
    ctxt.bind_texture(Context::TEXTURE_2D, Some(&*texture));
    // Rows aren't padded
    ctxt.pixel_storei(Context::UNPACK_ALIGNMENT, 1);
    ctxt.tex_image2d(
        Context::TEXTURE_2D,
        0,
        Context::RGBA as i32,
        image.width as i32,
        image.height as i32,
        0,
        Context::RGBA,
        Some(&image.pixels[..]),
    );
    for (param, value) in [
        (Context::TEXTURE_WRAP_S, Context::CLAMP_TO_EDGE),
        (Context::TEXTURE_WRAP_T, Context::CLAMP_TO_EDGE),
        (Context::TEXTURE_MIN_FILTER, Context::LINEAR),
        (Context::TEXTURE_MAG_FILTER, Context::LINEAR),
    ]
    .iter()
    {
        ctxt.tex_parameteri(Context::TEXTURE_2D, *param, *value as i32);
    }

    texture
}

impl Surface for Kiss3dSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_size(&mut self, width: u32, height: u32) {
        // The window owns the framebuffer; nothing to reallocate here
        self.width = width;
        self.height = height;
    }

    fn create_geometry(&mut self, geometry: Geometry) -> GeometryID {
        let id = GeometryID(self.next_id());
        self.geometries.insert(id, geometry);
        id
    }

    fn create_material(&mut self, material: Material) -> MaterialID {
        let id = MaterialID(self.next_id());
        self.materials.insert(id, material);
        id
    }

    fn update_material(&mut self, id: MaterialID, material: &Material) {
        if !self.materials.contains_key(&id) {
            warn!("update of unknown material {}", id);
            return;
        }
        self.materials.insert(id, material.clone());

        let mut nodes: Vec<SceneNode> = self
            .meshes
            .values()
            .filter_map(|entry| match entry {
                MeshEntry::Node { node, material } if *material == id => Some(node.clone()),
                _ => None,
            })
            .collect();
        for node in nodes.iter_mut() {
            self.apply_material(node, material);
        }
    }

    fn create_texture(&mut self, image: TextureImage) -> TextureID {
        let id = TextureID(self.next_id());
        debug!(
            "uploading {} texture, {}x{}",
            image.name, image.width, image.height
        );
        self.textures.insert(id, upload_texture(&image));
        id
    }

    fn create_mesh(
        &mut self,
        geometry: GeometryID,
        material: MaterialID,
        _shadows: ShadowFlags,
    ) -> MeshID {
        let id = MeshID(self.next_id());
        let entry = match self.geometries.get(&geometry) {
            Some(Geometry::Sphere { radius, .. }) => {
                let mut node = self.root.add_sphere(*radius);
                if let Some(m) = self.materials.get(&material) {
                    self.apply_material(&mut node, m);
                }
                MeshEntry::Node { node, material }
            }
            _ => MeshEntry::Immediate {
                geometry,
                material,
                transform: Isometry3::identity(),
            },
        };
        self.meshes.insert(id, entry);
        id
    }

    fn set_transform(&mut self, mesh: MeshID, transform: &Isometry3<f32>) {
        match self.meshes.get_mut(&mesh) {
            Some(MeshEntry::Node { node, .. }) => node.set_local_transformation(*transform),
            Some(MeshEntry::Immediate { transform: t, .. }) => *t = *transform,
            None => {}
        }
    }

    fn create_light(&mut self, light: Light) -> LightID {
        let id = LightID(self.next_id());
        self.lights.insert(id, light);
        id
    }

    fn set_shadow_mapping(&mut self, enabled: bool) {
        if enabled {
            debug!("shadow mapping requested; kiss3d has none");
        }
        self.shadow_mapping = enabled;
    }

    fn render(&mut self, _view: &CameraView) {
        // kiss3d draws the nodes itself; queue up the immediate-mode pieces
        for entry in self.meshes.values() {
            let (geometry, material, transform) = match entry {
                MeshEntry::Immediate {
                    geometry,
                    material,
                    transform,
                } => (geometry, material, transform),
                MeshEntry::Node { .. } => continue,
            };
            let (geometry, material) =
                match (self.geometries.get(geometry), self.materials.get(material)) {
                    (Some(g), Some(m)) => (g, m),
                    _ => continue,
                };

            match (geometry, material.shading) {
                (Geometry::LineLoop { points }, Shading::Line { opacity }) => {
                    // No blending for lines, so fade toward the black backdrop
                    let color = material.color.scaled(opacity).to_point();
                    self.renderer.draw_loop(points, color, transform);
                }
                (Geometry::LineLoop { points }, _) => {
                    self.renderer
                        .draw_loop(points, material.color.to_point(), transform);
                }
                (Geometry::PointCloud { points }, Shading::Points { size }) => {
                    self.renderer
                        .draw_points(points, material.color.to_point(), size, transform);
                }
                (Geometry::PointCloud { points }, _) => {
                    self.renderer
                        .draw_points(points, material.color.to_point(), 1.0, transform);
                }
                (Geometry::Sphere { .. }, _) => {}
            }
        }
    }

    fn dispose(&mut self, resource: Resource) {
        let found = match resource {
            Resource::Geometry(id) => self.geometries.remove(&id).is_some(),
            Resource::Material(id) => self.materials.remove(&id).is_some(),
            // Nodes holding a clone are unlinked before their textures go
            Resource::Texture(id) => self.textures.remove(&id).is_some(),
            Resource::Mesh(id) => match self.meshes.remove(&id) {
                Some(MeshEntry::Node { mut node, .. }) => {
                    node.unlink();
                    true
                }
                Some(MeshEntry::Immediate { .. }) => true,
                None => false,
            },
            Resource::Light(id) => self.lights.remove(&id).is_some(),
        };

        if !found {
            warn!("{:?} disposed twice, or never created", resource);
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.root.unlink();
        debug!(
            "kiss3d surface released, {} meshes still attached",
            self.meshes.len()
        );
        self.released = true;
    }
}
