use kiss3d::camera::Camera;
use kiss3d::event::WindowEvent;
use kiss3d::resource::ShaderUniform;
use kiss3d::window::Canvas;
use nalgebra::{Isometry3, Matrix4, Point3};

use crate::render::CameraView;

// kiss3d wants to own the camera, but ours lives in the scene and moves with
// damping every tick. This just mirrors whatever the scene camera last
// reported, and ignores window events; the viewer turns those into
// `CameraInput` itself.
pub struct MirrorCamera {
    view: CameraView,
}

impl MirrorCamera {
    pub fn new(view: CameraView) -> Self {
        MirrorCamera { view }
    }

    pub fn set_view(&mut self, view: CameraView) {
        self.view = view;
    }

    fn projection_matrix(&self) -> Matrix4<f32> {
        self.view.projection.into_inner()
    }

    fn view_matrix(&self) -> Matrix4<f32> {
        self.view.view.to_homogeneous()
    }
}

impl Camera for MirrorCamera {
    fn handle_event(&mut self, _canvas: &Canvas, _event: &WindowEvent) {}

    fn eye(&self) -> Point3<f32> {
        self.view.eye
    }

    fn view_transform(&self) -> Isometry3<f32> {
        self.view.view
    }

    fn transformation(&self) -> Matrix4<f32> {
        self.view.transformation()
    }

    fn inverse_transformation(&self) -> Matrix4<f32> {
        self.transformation()
            .try_inverse()
            .unwrap_or_else(Matrix4::identity)
    }

    fn clip_planes(&self) -> (f32, f32) {
        (self.view.projection.znear(), self.view.projection.zfar())
    }

    fn update(&mut self, _canvas: &Canvas) {}

    fn upload(
        &self,
        _: usize,
        proj: &mut ShaderUniform<Matrix4<f32>>,
        view: &mut ShaderUniform<Matrix4<f32>>,
    ) {
        proj.upload(&self.projection_matrix());
        view.upload(&self.view_matrix());
    }
}
