//! Shared types for the scene graph core.

pub mod bounds;
pub mod types;

pub use bounds::{Aabb, BoundField, BoundsPatch, ClipBounds, Containment};
pub use types::{AttrValue, NodeHandle};
