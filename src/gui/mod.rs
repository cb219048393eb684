//! Desktop host: runs a [Scene] inside a kiss3d window.

use kiss3d::camera::Camera;
use kiss3d::event::{Action, Key, MouseButton, WindowEvent};
use kiss3d::planar_camera::PlanarCamera;
use kiss3d::post_processing::PostProcessingEffect;
use kiss3d::renderer::Renderer;
use kiss3d::window::{State, Window};
use nalgebra::Vector2;
use tracing::{debug, info};

use self::camera::MirrorCamera;
use crate::scene::{CameraConfig, CameraInput, OrbitCamera, Scene};

mod camera;
mod renderers;
mod surface;
mod unlit;

pub use self::renderers::SceneRenderer;
pub use self::surface::Kiss3dSurface;

const KEY_CAMERA_MOVE_UP: Key = Key::W;
const KEY_CAMERA_MOVE_DOWN: Key = Key::S;
const KEY_CAMERA_MOVE_LEFT: Key = Key::A;
const KEY_CAMERA_MOVE_RIGHT: Key = Key::D;

// Keyboard orbiting pretends to be a drag of this many pixels
const KEY_DRAG_PIXELS: f32 = 20.0;
const FPS_LOG_INTERVAL: u64 = 300;

/// Which mouse buttons are held, as far as the event stream has told us.
/// The window itself can't be asked.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DragButtons {
    rotating: bool,
    panning: bool,
}

impl DragButtons {
    fn on_button(&mut self, button: MouseButton, action: Action) {
        let held = action == Action::Press;
        match button {
            MouseButton::Button1 => self.rotating = held,
            MouseButton::Button2 => self.panning = held,
            _ => {}
        }
    }

    /// What a cursor move of `dpos` means right now. Rotation wins if both
    /// buttons are down.
    fn drag(&self, dpos: Vector2<f32>) -> Option<CameraInput> {
        if self.rotating {
            Some(CameraInput::Rotate {
                dx: dpos.x,
                dy: dpos.y,
            })
        } else if self.panning {
            Some(CameraInput::Pan {
                dx: dpos.x,
                dy: dpos.y,
            })
        } else {
            None
        }
    }
}

pub struct Viewer {
    scene: Scene<Kiss3dSurface>,
    camera: MirrorCamera,
    buttons: DragButtons,
    last_cursor_pos: Vector2<f32>,
    last_fps_log: u64,
}

impl Viewer {
    pub fn new(scene: Scene<Kiss3dSurface>) -> Self {
        let view = match scene.camera() {
            Some(camera) => camera.view(),
            None => OrbitCamera::new(&CameraConfig::default(), 800, 600).view(),
        };
        Viewer {
            scene,
            camera: MirrorCamera::new(view),
            buttons: DragButtons::default(),
            last_cursor_pos: Vector2::zeros(),
            last_fps_log: 0,
        }
    }

    pub fn scene(&self) -> &Scene<Kiss3dSurface> {
        &self.scene
    }

    fn process_user_input(&mut self, window: &mut Window) {
        for mut event in window.events().iter() {
            match event.value {
                WindowEvent::CursorPos(x, y, _) => {
                    let curr_pos = Vector2::new(x as f32, y as f32);
                    let dpos = curr_pos - self.last_cursor_pos;
                    self.last_cursor_pos = curr_pos;

                    if let Some(input) = self.buttons.drag(dpos) {
                        self.scene.camera_input(input);
                    }
                }
                WindowEvent::MouseButton(button, action, _) => {
                    self.buttons.on_button(button, action);
                }
                WindowEvent::Scroll(_, off, _) => {
                    // scroll up == zoom in
                    self.scene.camera_input(CameraInput::Zoom { steps: off as f32 });
                }
                WindowEvent::FramebufferSize(w, h) => {
                    self.scene.resize(w, h);
                }
                WindowEvent::Key(key, Action::Press, _) => {
                    if let Some(input) = key_input(key) {
                        self.scene.camera_input(input);
                    }
                }
                WindowEvent::Key(Key::Escape, Action::Release, _) | WindowEvent::Close => {
                    info!("window closing");
                    self.scene.teardown();
                }
                _ => {}
            }
            // Nobody else gets to interpret our input
            event.inhibited = true;
        }
    }
}

fn key_input(key: Key) -> Option<CameraInput> {
    let input = match key {
        KEY_CAMERA_MOVE_UP => CameraInput::Rotate {
            dx: 0.0,
            dy: -KEY_DRAG_PIXELS,
        },
        KEY_CAMERA_MOVE_DOWN => CameraInput::Rotate {
            dx: 0.0,
            dy: KEY_DRAG_PIXELS,
        },
        KEY_CAMERA_MOVE_LEFT => CameraInput::Rotate {
            dx: -KEY_DRAG_PIXELS,
            dy: 0.0,
        },
        KEY_CAMERA_MOVE_RIGHT => CameraInput::Rotate {
            dx: KEY_DRAG_PIXELS,
            dy: 0.0,
        },
        Key::Equals | Key::Add => CameraInput::Zoom { steps: 1.0 },
        Key::Minus | Key::Subtract => CameraInput::Zoom { steps: -1.0 },
        _ => return None,
    };
    Some(input)
}

impl State for Viewer {
    fn cameras_and_effect_and_renderer(
        &mut self,
    ) -> (
        Option<&mut dyn Camera>,
        Option<&mut dyn PlanarCamera>,
        Option<&mut dyn Renderer>,
        Option<&mut dyn PostProcessingEffect>,
    ) {
        (
            Some(&mut self.camera),
            None,
            Some(self.scene.surface_mut().renderer_mut()),
            None,
        )
    }

    fn step(&mut self, window: &mut Window) {
        self.process_user_input(window);
        if !self.scene.is_alive() {
            window.close();
            return;
        }

        self.scene.step();

        if let Some(camera) = self.scene.camera() {
            self.camera.set_view(camera.view());
        }
        if let Some(light) = self.scene.surface().window_light() {
            window.set_light(light);
        }

        let ticks = self.scene.scheduler().ticks();
        if ticks >= self.last_fps_log + FPS_LOG_INTERVAL {
            self.last_fps_log = ticks;
            debug!(
                "{:.1} fps, {:.1}s elapsed",
                self.scene.scheduler().fps(),
                self.scene.elapsed()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(
            key_input(Key::W),
            Some(CameraInput::Rotate {
                dx: 0.0,
                dy: -KEY_DRAG_PIXELS
            })
        );
        assert_eq!(key_input(Key::Equals), Some(CameraInput::Zoom { steps: 1.0 }));
        assert_eq!(key_input(Key::Minus), Some(CameraInput::Zoom { steps: -1.0 }));
        assert_eq!(key_input(Key::Q), None);
    }

    #[test]
    fn test_drag_follows_button_events() {
        let mut buttons = DragButtons::default();
        let dpos = Vector2::new(3.0, -2.0);
        assert_eq!(buttons.drag(dpos), None);

        buttons.on_button(MouseButton::Button2, Action::Press);
        assert_eq!(buttons.drag(dpos), Some(CameraInput::Pan { dx: 3.0, dy: -2.0 }));

        buttons.on_button(MouseButton::Button1, Action::Press);
        assert_eq!(
            buttons.drag(dpos),
            Some(CameraInput::Rotate { dx: 3.0, dy: -2.0 })
        );

        buttons.on_button(MouseButton::Button1, Action::Release);
        buttons.on_button(MouseButton::Button2, Action::Release);
        buttons.on_button(MouseButton::Button3, Action::Press);
        assert_eq!(buttons.drag(dpos), None);
    }
}
