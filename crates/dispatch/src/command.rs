use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use scenegraph_common::{AttrValue, BoundsPatch};
use scenegraph_kernel::NodeDescription;

use crate::dispatcher::DispatchError;

pub const CLIP_BOX_CREATE: &str = "clip.clipbox.create";
pub const CLIP_BOX_UPDATE: &str = "clip.clipbox.update";
pub const NODE_SET: &str = "node.set";
pub const NODE_SET_FLAG: &str = "node.flags.set";
pub const NODE_INSERT: &str = "node.insert";
pub const NODE_REMOVE: &str = "node.remove";

/// Names handled by [`CommandDispatcher::with_builtins`](crate::CommandDispatcher::with_builtins).
pub const BUILTIN_NAMES: [&str; 6] = [
    CLIP_BOX_CREATE,
    CLIP_BOX_UPDATE,
    NODE_SET,
    NODE_SET_FLAG,
    NODE_INSERT,
    NODE_REMOVE,
];

/// A named request to mutate the graph at `target`.
///
/// Known commands carry typed payloads. Anything else travels as
/// [`Command::Custom`] and is only accepted by a dispatcher that has a
/// handler registered under its name. Built-in commands reject payload keys
/// they do not read.
///
/// On the wire a command is a flat object: `{"command": "clip.clipbox.update",
/// "target": "box", "ymin": -2.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCommand", into = "RawCommand")]
pub enum Command {
    /// Append a clip box under `target`; missing bounds are unbounded.
    ClipBoxCreate { target: String, bounds: BoundsPatch },
    /// Patch the clip box under `target`; missing fields stay as they are.
    ClipBoxUpdate { target: String, patch: BoundsPatch },
    SetAttribute {
        target: String,
        name: String,
        value: AttrValue,
    },
    SetFlag {
        target: String,
        flag: String,
        value: bool,
    },
    InsertNode {
        target: String,
        node: NodeDescription,
    },
    RemoveNode { target: String },
    /// Payload keys other than `command` and `target`, kept as an object.
    Custom {
        name: String,
        target: String,
        payload: Map<String, Value>,
    },
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Self::ClipBoxCreate { .. } => CLIP_BOX_CREATE,
            Self::ClipBoxUpdate { .. } => CLIP_BOX_UPDATE,
            Self::SetAttribute { .. } => NODE_SET,
            Self::SetFlag { .. } => NODE_SET_FLAG,
            Self::InsertNode { .. } => NODE_INSERT,
            Self::RemoveNode { .. } => NODE_REMOVE,
            Self::Custom { name, .. } => name.as_str(),
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::ClipBoxCreate { target, .. }
            | Self::ClipBoxUpdate { target, .. }
            | Self::SetAttribute { target, .. }
            | Self::SetFlag { target, .. }
            | Self::InsertNode { target, .. }
            | Self::RemoveNode { target }
            | Self::Custom { target, .. } => target,
        }
    }

    pub fn set(target: impl Into<String>, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self::SetAttribute {
            target: target.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn custom(
        name: impl Into<String>,
        target: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Self {
        Self::Custom {
            name: name.into(),
            target: target.into(),
            payload,
        }
    }

    /// Parse a JSON array of commands.
    pub fn list_from_json(s: &str) -> Result<Vec<Command>, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Flat wire form shared by every command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommand {
    pub command: String,
    pub target: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[derive(Deserialize)]
struct SetPayload {
    name: String,
    value: AttrValue,
}

#[derive(Deserialize)]
struct FlagPayload {
    flag: String,
    value: bool,
}

#[derive(Deserialize)]
struct InsertPayload {
    node: NodeDescription,
}

const BOUND_KEYS: &[&str] = &["xmin", "ymin", "zmin", "xmax", "ymax", "zmax"];

/// Payload keys a built-in command reads, or `None` for custom commands.
fn payload_keys(command: &str) -> Option<&'static [&'static str]> {
    match command {
        CLIP_BOX_CREATE | CLIP_BOX_UPDATE => Some(BOUND_KEYS),
        NODE_SET => Some(&["name", "value"]),
        NODE_SET_FLAG => Some(&["flag", "value"]),
        NODE_INSERT => Some(&["node"]),
        NODE_REMOVE => Some(&[]),
        _ => None,
    }
}

fn parse<T: serde::de::DeserializeOwned>(command: &str, payload: Value) -> Result<T, DispatchError> {
    serde_json::from_value(payload).map_err(|err| DispatchError::InvalidPayload {
        command: command.to_string(),
        reason: err.to_string(),
    })
}

impl TryFrom<RawCommand> for Command {
    type Error = DispatchError;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        let RawCommand {
            command,
            target,
            payload,
        } = raw;
        let Some(allowed) = payload_keys(&command) else {
            return Ok(Self::Custom {
                name: command,
                target,
                payload,
            });
        };
        if let Some(key) = payload.keys().find(|k| !allowed.contains(&k.as_str())) {
            return Err(DispatchError::InvalidPayload {
                reason: format!("unknown field '{key}'"),
                command,
            });
        }
        let payload = Value::Object(payload);
        let cmd = match command.as_str() {
            CLIP_BOX_CREATE => Self::ClipBoxCreate {
                target,
                bounds: parse(&command, payload)?,
            },
            CLIP_BOX_UPDATE => Self::ClipBoxUpdate {
                target,
                patch: parse(&command, payload)?,
            },
            NODE_SET => {
                let p: SetPayload = parse(&command, payload)?;
                Self::SetAttribute {
                    target,
                    name: p.name,
                    value: p.value,
                }
            }
            NODE_SET_FLAG => {
                let p: FlagPayload = parse(&command, payload)?;
                Self::SetFlag {
                    target,
                    flag: p.flag,
                    value: p.value,
                }
            }
            NODE_INSERT => {
                let p: InsertPayload = parse(&command, payload)?;
                Self::InsertNode {
                    target,
                    node: p.node,
                }
            }
            // Only `node.remove` is left with a key list.
            _ => Self::RemoveNode { target },
        };
        Ok(cmd)
    }
}

fn object(value: impl Serialize) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

impl From<Command> for RawCommand {
    fn from(cmd: Command) -> Self {
        let command = cmd.name().to_string();
        let (target, payload) = match cmd {
            Command::ClipBoxCreate { target, bounds } => (target, object(bounds)),
            Command::ClipBoxUpdate { target, patch } => (target, object(patch)),
            Command::SetAttribute {
                target,
                name,
                value,
            } => (
                target,
                object(serde_json::json!({ "name": name, "value": value })),
            ),
            Command::SetFlag {
                target,
                flag,
                value,
            } => (
                target,
                object(serde_json::json!({ "flag": flag, "value": value })),
            ),
            Command::InsertNode { target, node } => {
                (target, object(serde_json::json!({ "node": node })))
            }
            Command::RemoveNode { target } => (target, Map::new()),
            Command::Custom {
                target, payload, ..
            } => (target, payload),
        };
        Self {
            command,
            target,
            payload,
        }
    }
}
