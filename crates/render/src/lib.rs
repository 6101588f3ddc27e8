//! Render coordination: walks the scene graph once per frame and emits
//! draw records to a pluggable [`Renderer`].
//!
//! # Invariants
//! - Renderers read frame records only; they cannot mutate the graph.
//! - Every frame is derived from the graph as it stands when the pass starts.
//! - Draw order is document order.

mod coordinator;
mod frame;
mod renderer;

pub use coordinator::{Coordinator, RenderConfig, TraversalState};
pub use frame::{DrawRecord, FrameRecord, LightState};
pub use renderer::{DebugTextRenderer, RecordingRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "scenegraph-render v0.1.0"
}
