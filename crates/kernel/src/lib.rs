//! Scene graph kernel: typed nodes, the id-indexed tree, declarative
//! descriptions and clip-box operations.
//!
//! # Invariants
//! - Every id in the index refers to a node reachable from the root.
//! - Traversal is depth-first pre-order, children in insertion order.
//! - Failed mutations leave the graph untouched; every applied mutation
//!   produces an event record.

pub mod clip;
pub mod description;
pub mod error;
pub mod graph;
pub mod node;

pub use description::NodeDescription;
pub use error::{DescriptionError, GraphError};
pub use graph::{GraphEvent, SceneGraph, Traverse};
pub use node::{
    CameraParams, Geometry, LightMode, LightParams, MaterialParams, Node, NodeFlags, NodeKind,
};
