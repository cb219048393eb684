//! Scene lifecycle: build, animate, resize, tear down.

pub mod camera;
pub mod config;
pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod resize;
pub mod scheduler;

pub use camera::{CameraInput, OrbitCamera};
pub use config::{CameraConfig, Lighting, SceneConfig, SpinRates, StarfieldConfig};
pub use error::SceneError;
pub use factory::CelestialBody;
pub use lifecycle::{Scene, SceneOptions};
pub use scheduler::{AnimationScheduler, Clock, FrameToken, ManualClock, SystemClock};
