//! Handlers for the built-in command names.
//!
//! Each handler accepts only its own [`Command`] variant. Graph operations
//! validate before mutating, so a failed handler leaves the graph as it was.

use scenegraph_kernel::SceneGraph;

use crate::command::Command;
use crate::dispatcher::DispatchError;

fn mismatch(cmd: &Command, expected: &'static str) -> DispatchError {
    DispatchError::PayloadMismatch {
        command: cmd.name().to_string(),
        expected,
        found: variant_name(cmd).to_string(),
    }
}

fn variant_name(cmd: &Command) -> &'static str {
    match cmd {
        Command::ClipBoxCreate { .. } => "clip box create",
        Command::ClipBoxUpdate { .. } => "clip box update",
        Command::SetAttribute { .. } => "set attribute",
        Command::SetFlag { .. } => "set flag",
        Command::InsertNode { .. } => "insert node",
        Command::RemoveNode { .. } => "remove node",
        Command::Custom { .. } => "custom",
    }
}

pub(crate) fn clip_box_create(graph: &mut SceneGraph, cmd: &Command) -> Result<(), DispatchError> {
    let Command::ClipBoxCreate { target, bounds } = cmd else {
        return Err(mismatch(cmd, "clip box create"));
    };
    graph.create_clip_box(target, bounds)?;
    Ok(())
}

pub(crate) fn clip_box_update(graph: &mut SceneGraph, cmd: &Command) -> Result<(), DispatchError> {
    let Command::ClipBoxUpdate { target, patch } = cmd else {
        return Err(mismatch(cmd, "clip box update"));
    };
    if patch.is_empty() {
        // Still require the clip box to exist.
        graph.clip_box_under(target)?;
        return Ok(());
    }
    graph.update_clip_box(target, patch)?;
    Ok(())
}

pub(crate) fn set_attribute(graph: &mut SceneGraph, cmd: &Command) -> Result<(), DispatchError> {
    let Command::SetAttribute {
        target,
        name,
        value,
    } = cmd
    else {
        return Err(mismatch(cmd, "set attribute"));
    };
    graph.set_attribute(target, name, *value)?;
    Ok(())
}

pub(crate) fn set_flag(graph: &mut SceneGraph, cmd: &Command) -> Result<(), DispatchError> {
    let Command::SetFlag {
        target,
        flag,
        value,
    } = cmd
    else {
        return Err(mismatch(cmd, "set flag"));
    };
    graph.set_flag(target, flag, *value)?;
    Ok(())
}

pub(crate) fn insert_node(graph: &mut SceneGraph, cmd: &Command) -> Result<(), DispatchError> {
    let Command::InsertNode { target, node } = cmd else {
        return Err(mismatch(cmd, "insert node"));
    };
    graph.insert_child(target, node)?;
    Ok(())
}

pub(crate) fn remove_node(graph: &mut SceneGraph, cmd: &Command) -> Result<(), DispatchError> {
    let Command::RemoveNode { target } = cmd else {
        return Err(mismatch(cmd, "remove node"));
    };
    graph.remove(target)?;
    Ok(())
}
