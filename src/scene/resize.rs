use tracing::{debug, warn};

use super::camera::OrbitCamera;
use crate::render::Surface;

/// Keeps the camera's aspect ratio and the surface's drawable size in step
/// with the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportResizeHandler {
    last: (u32, u32),
}

impl ViewportResizeHandler {
    pub fn new(width: u32, height: u32) -> Self {
        ViewportResizeHandler {
            last: (width, height),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.last
    }

    /// Returns whether anything changed. A zero-sized viewport (minimized
    /// window, collapsed container) is ignored and the last good size kept.
    pub fn apply<S: Surface>(
        &mut self,
        camera: &mut OrbitCamera,
        surface: &mut S,
        width: u32,
        height: u32,
    ) -> bool {
        if width == 0 || height == 0 {
            warn!("ignoring resize to {}x{}", width, height);
            return false;
        }
        if (width, height) == self.last {
            return false;
        }

        camera.set_viewport(width, height);
        surface.set_size(width, height);
        self.last = (width, height);
        debug!("viewport resized to {}x{}", width, height);
        true
    }
}
