use std::f32::consts::PI;

use nalgebra::{Isometry3, Perspective3, Point3, Vector3};

use super::config::CameraConfig;
use crate::render::CameraView;

/// User input, already translated out of whatever windowing system the host
/// uses. Distances are in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraInput {
    /// Orbit around the target; drag-style deltas.
    Rotate { dx: f32, dy: f32 },
    /// Slide the target sideways in screen space.
    Pan { dx: f32, dy: f32 },
    /// Positive steps zoom in, negative zoom out.
    Zoom { steps: f32 },
}

// A close cousin of the usual orbit controls: the camera sits on a sphere
// around a target point and can be dragged around it, zoomed in and out,
// and (optionally) panned. Unlike a z-up planner camera, this one uses y as
// up, so the default view looks straight down +z onto the orbital plane.
//
// With damping on, input doesn't move the camera directly. It accumulates
// into a pending delta, and each `update` applies a fraction of what's left.
// That means `update` has to run every frame, input or not, or the camera
// stops dead mid-glide.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    // -- position --
    theta: f32,  // azimuthal angle, around y
    phi: f32,    // polar angle, from +y
    radius: f32, // distance from target
    target: Point3<f32>,
    // -- perspective --
    width: u32,
    height: u32,
    fovy: f32,
    znear: f32,
    zfar: f32,
    // -- pending motion --
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vector3<f32>,
    // -- knobs to fiddle with --
    theta_step: f32,
    phi_step: f32,
    zoom_ratio: f32,
    phi_limit: f32,
    radius_limits: (f32, f32),
    damping: Option<f32>,
    enable_pan: bool,
    enable_zoom: bool,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig, width: u32, height: u32) -> Self {
        let radius_limits = (config.min_distance, config.max_distance);
        OrbitCamera {
            theta: 0.0,
            phi: PI / 2.0,
            radius: nalgebra::clamp(config.initial_distance, radius_limits.0, radius_limits.1),
            target: Point3::origin(),
            width: width.max(1),
            height: height.max(1),
            fovy: config.fovy_degrees.to_radians(),
            znear: config.znear,
            zfar: config.zfar,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vector3::zeros(),
            theta_step: 0.005,
            phi_step: 0.005,
            zoom_ratio: 0.95,
            phi_limit: 0.001,
            radius_limits,
            damping: config.damping_factor,
            enable_pan: config.enable_pan,
            enable_zoom: config.enable_zoom,
        }
    }

    pub fn handle_input(&mut self, input: CameraInput) {
        match input {
            // Rotate the opposite direction as the mouse moves (drag right == camera glides
            // left)
            CameraInput::Rotate { dx, dy } => {
                self.rotate(-dx * self.theta_step, -dy * self.phi_step)
            }
            CameraInput::Pan { dx, dy } => self.pan(dx, dy),
            CameraInput::Zoom { steps } => self.zoom(self.zoom_ratio.powf(steps)),
        }
    }

    pub fn rotate(&mut self, dtheta: f32, dphi: f32) {
        self.delta_theta += dtheta;
        self.delta_phi += dphi;
        if self.damping.is_none() {
            self.update();
        }
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !self.enable_pan {
            return;
        }

        // How much world one pixel covers at the target's depth
        let half_height = self.radius * (self.fovy / 2.0).tan();
        let pixel_size = 2.0 * half_height / self.height as f32;

        // Screen x and y, in world space
        let camera_transform = self.view_transform().inverse();
        let x_vec = camera_transform.transform_vector(&Vector3::x());
        let y_vec = camera_transform.transform_vector(&Vector3::y());

        // Drag right == scene follows the cursor, so the target moves left
        self.pan_offset += (-x_vec * dx + y_vec * dy) * pixel_size;
        if self.damping.is_none() {
            self.update();
        }
    }

    /// Multiplies the distance to the target by `factor`, within limits.
    /// Zoom is never damped.
    pub fn zoom(&mut self, factor: f32) {
        if !self.enable_zoom {
            return;
        }
        self.radius = nalgebra::clamp(
            self.radius * factor,
            self.radius_limits.0,
            self.radius_limits.1,
        );
    }

    /// Applies pending motion. Call once per frame.
    pub fn update(&mut self) {
        let fraction = self.damping.unwrap_or(1.0);

        self.theta = (self.theta + self.delta_theta * fraction) % (2.0 * PI);
        self.phi = nalgebra::clamp(
            self.phi + self.delta_phi * fraction,
            self.phi_limit,
            PI - self.phi_limit,
        );
        self.target += self.pan_offset * fraction;

        let remaining = 1.0 - fraction;
        self.delta_theta *= remaining;
        self.delta_phi *= remaining;
        self.pan_offset *= remaining;
    }

    /// Whether there's still motion waiting to be applied.
    pub fn is_moving(&self) -> bool {
        const EPSILON: f32 = 1e-6;
        self.delta_theta.abs() > EPSILON
            || self.delta_phi.abs() > EPSILON
            || self.pan_offset.norm() > EPSILON
    }

    /// Zero-sized viewports are ignored; the previous one stays in effect.
    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fovy(&self) -> f32 {
        self.fovy
    }

    pub fn eye(&self) -> Point3<f32> {
        self.target
            + Vector3::new(
                self.radius * self.phi.sin() * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * self.phi.sin() * self.theta.cos(),
            )
    }

    pub fn view_transform(&self) -> Isometry3<f32> {
        Isometry3::look_at_rh(&self.eye(), &self.target, &Vector3::y())
    }

    pub fn projection(&self) -> Perspective3<f32> {
        Perspective3::new(self.aspect(), self.fovy, self.znear, self.zfar)
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            eye: self.eye(),
            target: self.target,
            view: self.view_transform(),
            projection: self.projection(),
        }
    }
}
