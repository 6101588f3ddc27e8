//! Command dispatch: named, typed requests that mutate the scene graph.
//!
//! # Invariants
//! - Callers never touch graph internals; mutations arrive as commands.
//! - A failed dispatch leaves the graph unmodified.
//! - The dispatcher holds no graph state and no process-wide registry.

mod builtins;
pub mod command;
pub mod dispatcher;

pub use command::{BUILTIN_NAMES, Command, RawCommand};
pub use dispatcher::{CommandDispatcher, DispatchError, Handler};

pub fn crate_info() -> &'static str {
    "scenegraph-dispatch v0.1.0"
}
