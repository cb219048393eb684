pub mod file;
pub mod gui;
pub mod math;
pub mod model;
pub mod render;
pub mod scene;
pub mod textures;
