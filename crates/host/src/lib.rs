//! Host loop plumbing: owns the graph, its dispatcher and the render
//! coordinator, and turns pointer/idle input into commands.
//!
//! # Invariants
//! - No process-wide state; every loop owns its own [`HostContext`].
//! - Input never mutates the graph directly. Events become commands first.

mod config;
mod context;
mod error;
mod input;

pub use config::HostConfig;
pub use context::HostContext;
pub use error::HostError;
pub use input::{DragState, InputEvent};

pub fn crate_info() -> &'static str {
    "scenegraph-host v0.1.0"
}
