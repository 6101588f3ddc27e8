use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal handle of a node stored in a scene graph.
///
/// Handles are never reused; string ids are the caller-facing way to address
/// nodes, handles are what the graph uses to link parents and children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(pub Uuid);

impl NodeHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines and debug output.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for NodeHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Value written to or read from a node attribute.
///
/// Deserializes from a bare number (`2.0`) or a three-element array
/// (`[0.0, 1.0, 0.0]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f32),
    Vector(Vec3),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            Self::Vector(v) => Some(*v),
            Self::Number(_) => None,
        }
    }

    /// Shape name used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Vector(_) => "vector",
        }
    }
}

impl From<f32> for AttrValue {
    fn from(n: f32) -> Self {
        Self::Number(n)
    }
}

impl From<Vec3> for AttrValue {
    fn from(v: Vec3) -> Self {
        Self::Vector(v)
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n:.3}"),
            Self::Vector(v) => write!(f, "({:.3}, {:.3}, {:.3})", v.x, v.y, v.z),
        }
    }
}
