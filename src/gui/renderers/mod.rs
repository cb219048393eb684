use kiss3d::camera::Camera;
use kiss3d::renderer::{LineRenderer, PointRenderer, Renderer};
use nalgebra::{Isometry3, Point3};

mod utils;

// Smallest point kiss3d will draw visibly, in pixels
const MIN_POINT_SIZE: f32 = 1.0;

/// Immediate-mode lines and points. Everything queued is drawn on the next
/// render pass and then forgotten, so callers re-queue every frame.
pub struct SceneRenderer {
    line_renderer: LineRenderer,
    point_renderer: PointRenderer,
}

impl SceneRenderer {
    pub fn new() -> Self {
        SceneRenderer {
            line_renderer: LineRenderer::new(),
            point_renderer: PointRenderer::new(),
        }
    }

    pub fn draw_loop(
        &mut self,
        points: &[Point3<f32>],
        color: Point3<f32>,
        transform: &Isometry3<f32>,
    ) {
        let transformed: Vec<_> = points.iter().map(|p| transform * p).collect();
        utils::draw_loop(&mut self.line_renderer, &transformed, &color);
    }

    pub fn draw_points(
        &mut self,
        points: &[Point3<f32>],
        color: Point3<f32>,
        size: f32,
        transform: &Isometry3<f32>,
    ) {
        // kiss3d sizes points in pixels rather than scene units
        self.point_renderer.set_point_size(size.max(MIN_POINT_SIZE));
        for p in points {
            self.point_renderer.draw_point(transform * p, color);
        }
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for SceneRenderer {
    fn render(&mut self, pass: usize, camera: &mut dyn Camera) {
        self.point_renderer.render(pass, camera);
        self.line_renderer.render(pass, camera);
    }
}
