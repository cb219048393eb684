//! Static description of the bodies in a scene, and how they move.

pub mod body;
pub mod catalog;
pub mod motion;

pub use body::{BodyDescriptor, BodyID, Direction, Rgb};
pub use catalog::CatalogEntry;
