//! Declarative node trees.
//!
//! A description is the only input shape the graph is built from. It reads
//! from JSON or YAML:
//!
//! ```json
//! { "type": "scene", "id": "theScene", "nodes": [
//!     { "type": "rotate", "id": "yaw", "angle": 30, "y": 1, "nodes": [
//!         { "type": "sphere", "radius": 2 } ] } ] }
//! ```
//!
//! or is assembled with the typed constructors below.

use std::collections::HashSet;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use scenegraph_common::ClipBounds;

use crate::error::{DescriptionError, GraphError};
use crate::node::{CameraParams, LightParams, MaterialParams, NodeFlags, NodeKind};

/// One node of a declarative tree, with its nested children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "NodeFlags::is_empty")]
    pub flags: NodeFlags,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeDescription>,
}

impl NodeDescription {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: None,
            kind,
            flags: NodeFlags::default(),
            nodes: Vec::new(),
        }
    }

    pub fn scene() -> Self {
        Self::new(NodeKind::Scene)
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    /// Rotation of `angle` degrees about `axis`.
    pub fn rotate(angle: f32, axis: Vec3) -> Self {
        Self::new(NodeKind::Rotate {
            angle,
            x: axis.x,
            y: axis.y,
            z: axis.z,
        })
    }

    pub fn translate(offset: Vec3) -> Self {
        Self::new(NodeKind::Translate {
            x: offset.x,
            y: offset.y,
            z: offset.z,
        })
    }

    pub fn scale(factor: Vec3) -> Self {
        Self::new(NodeKind::Scale {
            x: factor.x,
            y: factor.y,
            z: factor.z,
        })
    }

    pub fn camera(params: CameraParams) -> Self {
        Self::new(NodeKind::Camera(params))
    }

    pub fn light(params: LightParams) -> Self {
        Self::new(NodeKind::Light(params))
    }

    pub fn material(params: MaterialParams) -> Self {
        Self::new(NodeKind::Material(params))
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(NodeKind::Sphere {
            radius,
            slices: 30,
            rings: 30,
        })
    }

    pub fn cube(half_extents: Vec3) -> Self {
        Self::new(NodeKind::Cube {
            x: half_extents.x,
            y: half_extents.y,
            z: half_extents.z,
        })
    }

    pub fn clip_box(bounds: ClipBounds) -> Self {
        Self::new(NodeKind::ClipBox(bounds))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_clipping(mut self, clipping: bool) -> Self {
        self.flags.clipping = Some(clipping);
        self
    }

    pub fn with_child(mut self, child: NodeDescription) -> Self {
        self.nodes.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeDescription>) -> Self {
        self.nodes.extend(children);
        self
    }

    /// Addressable id: present and non-empty.
    pub fn addressable_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(&node.nodes);
        }
        count
    }

    /// Check every node's kind constraints and that no non-empty id repeats.
    ///
    /// A `scene` node is only allowed at the root.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen = HashSet::new();
        self.validate_subtree(true, &mut seen)
    }

    /// Validate a subtree in pre-order, collecting its ids into `seen`.
    pub(crate) fn validate_subtree<'a>(
        &'a self,
        is_root: bool,
        seen: &mut HashSet<&'a str>,
    ) -> Result<(), GraphError> {
        let mut pending = vec![(self, is_root)];
        while let Some((node, is_root)) = pending.pop() {
            if matches!(node.kind, NodeKind::Scene) != is_root {
                return Err(GraphError::InvalidDescription(if is_root {
                    format!("root must be a scene, found {}", node.kind.name())
                } else {
                    "a scene node may only appear at the root".into()
                }));
            }
            node.kind.validate().map_err(|reason| {
                GraphError::InvalidDescription(format!(
                    "{} '{}': {reason}",
                    node.kind.name(),
                    node.addressable_id().unwrap_or("<anonymous>")
                ))
            })?;
            if let Some(id) = node.addressable_id() {
                if !seen.insert(id) {
                    return Err(GraphError::DuplicateId(id.to_string()));
                }
            }
            pending.extend(node.nodes.iter().rev().map(|child| (child, false)));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self, DescriptionError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, DescriptionError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DescriptionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a description file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptionError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let text = std::fs::read_to_string(path)?;
        match ext.as_str() {
            "json" => Self::from_json_str(&text),
            "yaml" | "yml" => Self::from_yaml_str(&text),
            _ => Err(DescriptionError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENE_JSON: &str = r#"{
        "type": "scene", "id": "theScene",
        "nodes": [
            { "type": "rotate", "id": "yaw", "angle": 30, "y": 1,
              "nodes": [ { "type": "sphere", "radius": 2 } ] },
            { "type": "group", "flags": { "clipping": false } }
        ]
    }"#;

    #[test]
    fn parses_nested_json() {
        let desc = NodeDescription::from_json_str(SCENE_JSON).unwrap();
        assert_eq!(desc.id.as_deref(), Some("theScene"));
        assert_eq!(desc.kind, NodeKind::Scene);
        assert_eq!(desc.nodes.len(), 2);
        assert_eq!(desc.nodes[0].nodes[0].kind.name(), "sphere");
        assert_eq!(desc.nodes[1].flags.clipping, Some(false));
        assert_eq!(desc.node_count(), 4);
        desc.validate().unwrap();
    }

    #[test]
    fn parses_yaml() {
        let yaml = "
type: scene
nodes:
  - type: translate
    x: 1.5
    nodes:
      - type: cube
        x: 0.5
";
        let desc = NodeDescription::from_yaml_str(yaml).unwrap();
        assert_eq!(
            desc.nodes[0].kind,
            NodeKind::Translate {
                x: 1.5,
                y: 0.0,
                z: 0.0
            }
        );
        assert_eq!(desc.nodes[0].nodes[0].kind.name(), "cube");
    }

    #[test]
    fn builder_matches_parsed_form() {
        let built = NodeDescription::scene()
            .with_id("theScene")
            .with_child(
                NodeDescription::rotate(30.0, Vec3::Y)
                    .with_id("yaw")
                    .with_child(NodeDescription::sphere(2.0)),
            )
            .with_child(NodeDescription::group().with_clipping(false));
        let parsed = NodeDescription::from_json_str(SCENE_JSON).unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn json_round_trip_preserves_tree() {
        let desc = NodeDescription::from_json_str(SCENE_JSON).unwrap();
        let text = desc.to_json_pretty().unwrap();
        assert_eq!(NodeDescription::from_json_str(&text).unwrap(), desc);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let desc = NodeDescription::scene()
            .with_child(NodeDescription::group().with_id("a"))
            .with_child(NodeDescription::group().with_id("a"));
        assert_eq!(desc.validate(), Err(GraphError::DuplicateId("a".into())));
    }

    #[test]
    fn empty_ids_are_not_duplicates() {
        let desc = NodeDescription::scene()
            .with_child(NodeDescription::group().with_id(""))
            .with_child(NodeDescription::group().with_id(""));
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn root_must_be_scene() {
        let desc = NodeDescription::group();
        assert!(matches!(
            desc.validate(),
            Err(GraphError::InvalidDescription(_))
        ));
        let nested = NodeDescription::scene().with_child(NodeDescription::scene());
        assert!(matches!(
            nested.validate(),
            Err(GraphError::InvalidDescription(_))
        ));
    }

    #[test]
    fn invalid_kind_rejected_at_construction() {
        let desc = NodeDescription::scene().with_child(NodeDescription::sphere(0.0));
        assert!(matches!(
            desc.validate(),
            Err(GraphError::InvalidDescription(_))
        ));
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(SCENE_JSON.as_bytes())
            .unwrap();
        let desc = NodeDescription::load(&path).unwrap();
        assert_eq!(desc.node_count(), 4);

        let bad = dir.path().join("scene.toml");
        std::fs::write(&bad, "x").unwrap();
        assert!(matches!(
            NodeDescription::load(&bad),
            Err(DescriptionError::UnsupportedFormat(_))
        ));
    }
}
