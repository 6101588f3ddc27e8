//! Developer tooling: read-only inspection of a scene graph.
//!
//! # Invariants
//! - Tools never mutate the graph.

pub mod inspector;

pub use inspector::{GraphInspector, GraphSummary, NodeInfo};

pub fn crate_info() -> &'static str {
    "scenegraph-tools v0.1.0"
}
