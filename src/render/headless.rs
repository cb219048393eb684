//! A surface with no GPU behind it.
//!
//! Keeps every live resource in a table so tests (and the `--headless-frames`
//! mode of the simulator) can check what a scene allocated, what it mutated
//! and what it leaked.

use std::collections::HashMap;

use nalgebra::Isometry3;
use tracing::{debug, warn};

use super::{
    CameraView, Geometry, GeometryID, Light, LightID, Material, MaterialID, MeshID, Resource,
    ShadowFlags, Surface, TextureID, TextureImage,
};

#[derive(Debug, Clone)]
pub struct MeshRecord {
    pub geometry: GeometryID,
    pub material: MaterialID,
    pub shadows: ShadowFlags,
    pub transform: Isometry3<f32>,
}

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    next_id: usize,
    geometries: HashMap<GeometryID, Geometry>,
    materials: HashMap<MaterialID, Material>,
    textures: HashMap<TextureID, TextureImage>,
    meshes: HashMap<MeshID, MeshRecord>,
    lights: HashMap<LightID, Light>,
    // -- bookkeeping --
    created: usize,
    disposed: usize,
    double_disposals: usize,
    created_after_release: usize,
    material_updates: usize,
    renders: usize,
    shadow_mapping: bool,
    released: bool,
    last_view: Option<CameraView>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        HeadlessSurface {
            width,
            height,
            ..Default::default()
        }
    }

    fn next_id(&mut self) -> usize {
        if self.released {
            warn!("resource created after surface release");
            self.created_after_release += 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.created += 1;
        id
    }

    pub fn live_resources(&self) -> usize {
        self.geometries.len()
            + self.materials.len()
            + self.textures.len()
            + self.meshes.len()
            + self.lights.len()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn disposed(&self) -> usize {
        self.disposed
    }

    pub fn double_disposals(&self) -> usize {
        self.double_disposals
    }

    /// Resources allocated after [Surface::release]; always a lifecycle bug.
    pub fn created_after_release(&self) -> usize {
        self.created_after_release
    }

    pub fn material_updates(&self) -> usize {
        self.material_updates
    }

    pub fn renders(&self) -> usize {
        self.renders
    }

    pub fn shadow_mapping(&self) -> bool {
        self.shadow_mapping
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn last_view(&self) -> Option<&CameraView> {
        self.last_view.as_ref()
    }

    pub fn material(&self, id: MaterialID) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn mesh(&self, id: MeshID) -> Option<&MeshRecord> {
        self.meshes.get(&id)
    }

    pub fn geometry(&self, id: GeometryID) -> Option<&Geometry> {
        self.geometries.get(&id)
    }

    pub fn texture(&self, id: TextureID) -> Option<&TextureImage> {
        self.textures.get(&id)
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.values()
    }

    pub fn meshes(&self) -> impl Iterator<Item = (&MeshID, &MeshRecord)> {
        self.meshes.iter()
    }

    pub fn geometries(&self) -> impl Iterator<Item = &Geometry> {
        self.geometries.values()
    }
}

impl Surface for HeadlessSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_size(&mut self, width: u32, height: u32) {
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
        match self.materials.get_mut(&id) {
            Some(m) => {
                *m = material.clone();
                self.material_updates += 1;
            }
            None => warn!("update of unknown material {}", id),
        }
    }

    fn create_texture(&mut self, image: TextureImage) -> TextureID {
        let id = TextureID(self.next_id());
        self.textures.insert(id, image);
        id
    }

    fn create_mesh(
        &mut self,
        geometry: GeometryID,
        material: MaterialID,
        shadows: ShadowFlags,
    ) -> MeshID {
        let id = MeshID(self.next_id());
        self.meshes.insert(
            id,
            MeshRecord {
                geometry,
                material,
                shadows,
                transform: Isometry3::identity(),
            },
        );
        id
    }

    fn set_transform(&mut self, mesh: MeshID, transform: &Isometry3<f32>) {
        if let Some(record) = self.meshes.get_mut(&mesh) {
            record.transform = *transform;
        }
    }

    fn create_light(&mut self, light: Light) -> LightID {
        let id = LightID(self.next_id());
        self.lights.insert(id, light);
        id
    }

    fn set_shadow_mapping(&mut self, enabled: bool) {
        self.shadow_mapping = enabled;
    }

    fn render(&mut self, view: &CameraView) {
        self.renders += 1;
        self.last_view = Some(*view);
    }

    fn dispose(&mut self, resource: Resource) {
        let found = match resource {
            Resource::Geometry(id) => self.geometries.remove(&id).is_some(),
            Resource::Material(id) => self.materials.remove(&id).is_some(),
            Resource::Texture(id) => self.textures.remove(&id).is_some(),
            Resource::Mesh(id) => self.meshes.remove(&id).is_some(),
            Resource::Light(id) => self.lights.remove(&id).is_some(),
        };

        if found {
            self.disposed += 1;
        } else {
            warn!("{:?} disposed twice, or never created", resource);
            self.double_disposals += 1;
        }
    }

    fn release(&mut self) {
        debug!(
            "headless surface released, {} resources still live",
            self.live_resources()
        );
        self.released = true;
    }
}
