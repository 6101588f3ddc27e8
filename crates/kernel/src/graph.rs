use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use scenegraph_common::{AttrValue, ClipBounds, NodeHandle};

use crate::description::NodeDescription;
use crate::error::GraphError;
use crate::node::{AttributeError, Node, NodeKind};

/// A record produced by every mutation of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphEvent {
    /// Node was inserted under `parent` (`None` for the root).
    Inserted {
        handle: NodeHandle,
        parent: Option<NodeHandle>,
        id: Option<String>,
    },
    /// Subtree rooted at `handle` was removed.
    Removed {
        handle: NodeHandle,
        id: Option<String>,
        node_count: usize,
    },
    AttributeChanged {
        handle: NodeHandle,
        name: String,
        old: AttrValue,
        new: AttrValue,
    },
    FlagChanged {
        handle: NodeHandle,
        flag: String,
        old: Option<bool>,
        new: bool,
    },
    ClipBoundsChanged {
        handle: NodeHandle,
        old: ClipBounds,
        new: ClipBounds,
    },
}

/// The scene graph: a tree of typed nodes plus an id index.
///
/// Nodes live in a handle-keyed store; each parent owns the ordered list of
/// its children's handles. Every id in the index refers to a node reachable
/// from the root.
///
/// The graph is plain owned data with no interior mutability. Callers must
/// serialize mutations and traversals; nothing here locks.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeHandle, Node>,
    root: NodeHandle,
    index: BTreeMap<String, NodeHandle>,
    event_log: Vec<GraphEvent>,
}

impl SceneGraph {
    /// Build a graph from a description. The root must be a `scene` node.
    pub fn from_description(description: &NodeDescription) -> Result<Self, GraphError> {
        description.validate()?;

        let mut graph = Self {
            nodes: BTreeMap::new(),
            root: NodeHandle::new(),
            index: BTreeMap::new(),
            event_log: Vec::new(),
        };
        graph.root = graph.build(None, description);
        tracing::info!(
            nodes = graph.node_count(),
            ids = graph.index.len(),
            "scene graph built"
        );
        Ok(graph)
    }

    /// An empty scene with only a root node.
    pub fn empty() -> Self {
        // A bare scene always passes validation.
        let mut graph = Self {
            nodes: BTreeMap::new(),
            root: NodeHandle::new(),
            index: BTreeMap::new(),
            event_log: Vec::new(),
        };
        graph.root = graph.build(None, &NodeDescription::scene());
        graph
    }

    /// Insert a described subtree under `parent` in pre-order and return the
    /// handle of its top node.
    fn build(&mut self, parent: Option<NodeHandle>, description: &NodeDescription) -> NodeHandle {
        let top = NodeHandle::new();
        let mut pending = vec![(top, parent, description)];

        while let Some((handle, parent, description)) = pending.pop() {
            let id = description.addressable_id().map(str::to_string);
            if let Some(ref id) = id {
                self.index.insert(id.clone(), handle);
            }
            let children: Vec<NodeHandle> =
                description.nodes.iter().map(|_| NodeHandle::new()).collect();
            pending.extend(
                children
                    .iter()
                    .zip(&description.nodes)
                    .rev()
                    .map(|(child, desc)| (*child, Some(handle), desc)),
            );
            self.nodes.insert(
                handle,
                Node {
                    handle,
                    id: id.clone(),
                    kind: description.kind.clone(),
                    flags: description.flags,
                    parent,
                    children,
                },
            );
            self.event_log.push(GraphEvent::Inserted { handle, parent, id });
        }
        top
    }

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[&self.root]
    }

    /// Number of nodes in the graph, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(&handle)
    }

    pub(crate) fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(&handle)
    }

    /// Handle registered for `id`.
    pub fn handle_of(&self, id: &str) -> Result<NodeHandle, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn find_by_id(&self, id: &str) -> Result<&Node, GraphError> {
        let handle = self.handle_of(id)?;
        Ok(&self.nodes[&handle])
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Append a described subtree as the last child of `parent_id`.
    ///
    /// The subtree is validated in full, including id clashes with the
    /// existing graph, before anything is inserted.
    pub fn insert_child(
        &mut self,
        parent_id: &str,
        description: &NodeDescription,
    ) -> Result<NodeHandle, GraphError> {
        let parent = self.handle_of(parent_id)?;
        let mut seen = HashSet::new();
        description.validate_subtree(false, &mut seen)?;
        if let Some(taken) = seen.iter().find(|id| self.index.contains_key(**id)) {
            return Err(GraphError::DuplicateId((*taken).to_string()));
        }

        let handle = self.build(Some(parent), description);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(handle);
        }
        tracing::debug!(
            parent = parent_id,
            kind = description.kind.name(),
            nodes = description.node_count(),
            "subtree inserted"
        );
        Ok(handle)
    }

    /// Remove the node `id` and its whole subtree. Returns how many nodes
    /// were removed.
    pub fn remove(&mut self, id: &str) -> Result<usize, GraphError> {
        let handle = self.handle_of(id)?;
        if handle == self.root {
            return Err(GraphError::RootRemoval);
        }

        let doomed: Vec<NodeHandle> = self.descendants(handle).collect();
        if let Some(parent) = self.nodes[&handle].parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.retain(|c| *c != handle);
            }
        }
        for h in &doomed {
            if let Some(node) = self.nodes.remove(h) {
                if let Some(ref node_id) = node.id {
                    self.index.remove(node_id);
                }
            }
        }
        self.event_log.push(GraphEvent::Removed {
            handle,
            id: Some(id.to_string()),
            node_count: doomed.len(),
        });
        tracing::debug!(id, removed = doomed.len(), "subtree removed");
        Ok(doomed.len())
    }

    /// Write one attribute of the node `id`. Writing the current value
    /// records nothing.
    pub fn set_attribute(
        &mut self,
        id: &str,
        name: &str,
        value: AttrValue,
    ) -> Result<(), GraphError> {
        let handle = self.handle_of(id)?;
        let node = self
            .nodes
            .get_mut(&handle)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        let kind_name = node.kind.name();
        let old_bounds = node.kind.clip_bounds().copied();
        let old = node
            .kind
            .set_attribute(name, value)
            .map_err(|err| match err {
                AttributeError::Unknown => GraphError::UnknownAttribute {
                    node: id.to_string(),
                    kind: kind_name,
                    name: name.to_string(),
                },
                AttributeError::Invalid(reason) => GraphError::InvalidAttributeValue {
                    node: id.to_string(),
                    name: name.to_string(),
                    reason,
                },
            })?;
        if old == value {
            return Ok(());
        }

        match (old_bounds, node.kind.clip_bounds().copied()) {
            (Some(old), Some(new)) => {
                self.event_log
                    .push(GraphEvent::ClipBoundsChanged { handle, old, new });
            }
            _ => {
                self.event_log.push(GraphEvent::AttributeChanged {
                    handle,
                    name: name.to_string(),
                    old,
                    new: value,
                });
            }
        }
        tracing::trace!(id, name, %value, "attribute set");
        Ok(())
    }

    /// Override a capability flag on the node `id`.
    pub fn set_flag(&mut self, id: &str, flag: &str, value: bool) -> Result<(), GraphError> {
        let handle = self.handle_of(id)?;
        let node = self
            .nodes
            .get_mut(&handle)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        let old = node
            .flags
            .set(flag, value)
            .ok_or_else(|| GraphError::UnknownFlag(flag.to_string()))?;
        if old == Some(value) {
            return Ok(());
        }
        self.event_log.push(GraphEvent::FlagChanged {
            handle,
            flag: flag.to_string(),
            old,
            new: value,
        });
        Ok(())
    }

    /// Depth-first pre-order walk from the root, children in insertion order.
    pub fn traverse(&self) -> Traverse<'_> {
        self.descendants(self.root)
    }

    /// Pre-order walk of the subtree rooted at `handle`, `handle` first.
    pub fn descendants(&self, handle: NodeHandle) -> Traverse<'_> {
        let stack = if self.nodes.contains_key(&handle) {
            vec![handle]
        } else {
            Vec::new()
        };
        Traverse { graph: self, stack }
    }

    /// Number of ancestors between `handle` and the root.
    pub fn depth(&self, handle: NodeHandle) -> usize {
        let mut depth = 0;
        let mut cursor = self.nodes.get(&handle).and_then(|n| n.parent);
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.nodes.get(&parent).and_then(|n| n.parent);
        }
        depth
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[GraphEvent] {
        &self.event_log
    }

    pub(crate) fn record(&mut self, event: GraphEvent) {
        self.event_log.push(event);
    }

    /// Hash of the graph's content in document order.
    ///
    /// Handles are excluded, so two graphs built from the same description
    /// hash equal.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        for handle in self.traverse() {
            let node = &self.nodes[&handle];
            mix(&mut h, &self.depth(handle).to_le_bytes());
            mix(&mut h, node.id.as_deref().unwrap_or("").as_bytes());
            mix(&mut h, format!("{:?}{:?}", node.kind, node.flags).as_bytes());
            mix(&mut h, &node.children.len().to_le_bytes());
        }
        h
    }

    /// Kinds of the nodes in traversal order, paired with their ids.
    pub fn visit_order(&self) -> Vec<(&'static str, Option<String>)> {
        self.traverse()
            .map(|h| {
                let node = &self.nodes[&h];
                (node.kind.name(), node.id.clone())
            })
            .collect()
    }

    /// Reconstruct a description equivalent to the current tree.
    pub fn to_description(&self) -> NodeDescription {
        self.describe(self.root)
    }

    fn describe(&self, top: NodeHandle) -> NodeDescription {
        let order: Vec<NodeHandle> = self.descendants(top).collect();
        let mut done: BTreeMap<NodeHandle, NodeDescription> = BTreeMap::new();
        // Reverse pre-order finishes every child before its parent.
        for handle in order.into_iter().rev() {
            let node = &self.nodes[&handle];
            let nodes = node
                .children
                .iter()
                .filter_map(|c| done.remove(c))
                .collect();
            done.insert(
                handle,
                NodeDescription {
                    id: node.id.clone(),
                    kind: node.kind.clone(),
                    flags: node.flags,
                    nodes,
                },
            );
        }
        done.remove(&top).unwrap_or_else(NodeDescription::scene)
    }

    /// Count of nodes of a given kind.
    pub fn count_kind(&self, pred: impl Fn(&NodeKind) -> bool) -> usize {
        self.nodes.values().filter(|n| pred(&n.kind)).count()
    }
}

/// Pre-order iterator over node handles.
pub struct Traverse<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeHandle>,
}

impl Iterator for Traverse<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        let handle = self.stack.pop()?;
        if let Some(node) = self.graph.nodes.get(&handle) {
            self.stack.extend(node.children.iter().rev());
        }
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn sample() -> NodeDescription {
        NodeDescription::scene().with_id("theScene").with_children([
            NodeDescription::rotate(0.0, Vec3::Y)
                .with_id("yaw")
                .with_child(
                    NodeDescription::rotate(0.0, Vec3::X)
                        .with_id("pitch")
                        .with_child(NodeDescription::sphere(1.0).with_id("ball")),
                ),
            NodeDescription::group()
                .with_id("side")
                .with_child(NodeDescription::cube(Vec3::ONE)),
        ])
    }

    #[test]
    fn every_id_is_indexed_once() {
        let g = SceneGraph::from_description(&sample()).unwrap();
        let ids: Vec<&str> = g.ids().collect();
        assert_eq!(ids, vec!["ball", "pitch", "side", "theScene", "yaw"]);
        for id in ids {
            assert_eq!(g.find_by_id(id).unwrap().id(), Some(id));
        }
        assert_eq!(g.node_count(), 6);
    }

    #[test]
    fn duplicate_ids_fail_to_build() {
        let desc = NodeDescription::scene()
            .with_child(NodeDescription::group().with_id("dup"))
            .with_child(NodeDescription::group().with_id("dup"));
        assert_eq!(
            SceneGraph::from_description(&desc).unwrap_err(),
            GraphError::DuplicateId("dup".into())
        );
    }

    #[test]
    fn find_missing_id_fails() {
        let g = SceneGraph::from_description(&sample()).unwrap();
        assert_eq!(
            g.find_by_id("nope").unwrap_err(),
            GraphError::NodeNotFound("nope".into())
        );
    }

    #[test]
    fn traversal_is_document_order() {
        let g = SceneGraph::from_description(&sample()).unwrap();
        let order: Vec<&str> = g.visit_order().iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            order,
            vec!["scene", "rotate", "rotate", "sphere", "group", "cube"]
        );
    }

    #[test]
    fn traversal_round_trip_through_description() {
        let g1 = SceneGraph::from_description(&sample()).unwrap();
        let g2 = SceneGraph::from_description(&g1.to_description()).unwrap();
        assert_eq!(g1.visit_order(), g2.visit_order());
        assert_eq!(g1.state_hash(), g2.state_hash());
    }

    #[test]
    fn insert_child_appends_last() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        let h = g
            .insert_child("side", &NodeDescription::sphere(0.5).with_id("late"))
            .unwrap();
        let side = g.find_by_id("side").unwrap();
        assert_eq!(side.children().last(), Some(&h));
        assert_eq!(g.node(h).unwrap().parent(), Some(side.handle()));
        assert!(g.contains_id("late"));
    }

    #[test]
    fn insert_child_unknown_parent_fails_without_mutation() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        let before = (g.state_hash(), g.events().len());
        let err = g.insert_child("ghost", &NodeDescription::group()).unwrap_err();
        assert_eq!(err, GraphError::NodeNotFound("ghost".into()));
        assert_eq!((g.state_hash(), g.events().len()), before);
    }

    #[test]
    fn insert_child_rejects_clashing_ids() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        let count = g.node_count();
        let err = g
            .insert_child(
                "side",
                &NodeDescription::group()
                    .with_child(NodeDescription::group().with_id("yaw")),
            )
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateId("yaw".into()));
        assert_eq!(g.node_count(), count);
    }

    #[test]
    fn remove_drops_subtree_ids() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        assert_eq!(g.remove("yaw").unwrap(), 3);
        assert!(!g.contains_id("yaw"));
        assert!(!g.contains_id("pitch"));
        assert!(!g.contains_id("ball"));
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.root_node().children().len(), 1);
        for id in g.ids() {
            assert!(g.traverse().any(|h| g.node(h).unwrap().id() == Some(id)));
        }
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        assert_eq!(g.remove("theScene").unwrap_err(), GraphError::RootRemoval);
    }

    #[test]
    fn set_attribute_logs_change() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        g.drain_events();
        g.set_attribute("yaw", "angle", AttrValue::Number(90.0)).unwrap();
        assert_eq!(
            g.find_by_id("yaw").unwrap().attribute("angle"),
            Some(AttrValue::Number(90.0))
        );
        assert!(matches!(
            g.events(),
            [GraphEvent::AttributeChanged { name, .. }] if name == "angle"
        ));
    }

    #[test]
    fn set_attribute_errors() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        assert!(matches!(
            g.set_attribute("side", "angle", AttrValue::Number(1.0)),
            Err(GraphError::UnknownAttribute { .. })
        ));
        assert!(matches!(
            g.set_attribute("ball", "radius", AttrValue::Number(-1.0)),
            Err(GraphError::InvalidAttributeValue { .. })
        ));
        assert!(matches!(
            g.set_attribute("missing", "angle", AttrValue::Number(1.0)),
            Err(GraphError::NodeNotFound(_))
        ));
    }

    #[test]
    fn set_flag_known_and_unknown() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        g.set_flag("side", "clipping", false).unwrap();
        assert_eq!(g.find_by_id("side").unwrap().flags().clipping, Some(false));
        assert_eq!(
            g.set_flag("side", "wobble", true).unwrap_err(),
            GraphError::UnknownFlag("wobble".into())
        );
    }

    #[test]
    fn state_hash_changes_with_attributes() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        let before = g.state_hash();
        g.set_attribute("pitch", "angle", AttrValue::Number(10.0)).unwrap();
        assert_ne!(before, g.state_hash());
    }

    #[test]
    fn unchanged_writes_record_nothing() {
        let mut g = SceneGraph::from_description(&sample()).unwrap();
        g.set_flag("side", "clipping", false).unwrap();
        g.drain_events();
        let hash = g.state_hash();

        g.set_attribute("yaw", "angle", AttrValue::Number(0.0)).unwrap();
        g.set_flag("side", "clipping", false).unwrap();
        assert!(g.events().is_empty());
        assert_eq!(g.state_hash(), hash);

        g.set_attribute("yaw", "angle", AttrValue::Number(5.0)).unwrap();
        assert_eq!(g.events().len(), 1);
    }

    #[test]
    fn deep_chain_builds_and_describes() {
        let mut desc = NodeDescription::sphere(1.0).with_id("tip");
        for _ in 0..2000 {
            desc = NodeDescription::group().with_child(desc);
        }
        let desc = NodeDescription::scene().with_child(desc);
        assert_eq!(desc.node_count(), 2003);
        desc.validate().unwrap();

        let g = SceneGraph::from_description(&desc).unwrap();
        assert_eq!(g.node_count(), 2003);
        assert_eq!(g.traverse().count(), 2003);
        let tip = g.find_by_id("tip").unwrap().handle();
        assert_eq!(g.depth(tip), 2001);
        assert!(matches!(g.events().first(), Some(GraphEvent::Inserted { parent: None, .. })));

        let rebuilt = SceneGraph::from_description(&g.to_description()).unwrap();
        assert_eq!(rebuilt.node_count(), 2003);
        assert_eq!(rebuilt.state_hash(), g.state_hash());
    }

    #[test]
    fn build_keeps_document_order() {
        let g = SceneGraph::from_description(&sample()).unwrap();
        let ids: Vec<_> = g
            .events()
            .iter()
            .filter_map(|e| match e {
                GraphEvent::Inserted { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            ids,
            vec![
                Some("theScene".into()),
                Some("yaw".into()),
                Some("pitch".into()),
                Some("ball".into()),
                Some("side".into()),
                None,
            ]
        );
        assert_eq!(g.to_description(), sample());
    }

    #[test]
    fn depth_counts_ancestors() {
        let g = SceneGraph::from_description(&sample()).unwrap();
        assert_eq!(g.depth(g.root()), 0);
        assert_eq!(g.depth(g.handle_of("ball").unwrap()), 3);
    }

    #[test]
    fn empty_graph_has_only_root() {
        let g = SceneGraph::empty();
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.root_node().kind(), &NodeKind::Scene);
    }
}
