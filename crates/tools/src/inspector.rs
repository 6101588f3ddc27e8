use std::fmt::{self, Write as _};

use scenegraph_common::{AttrValue, NodeHandle};
use scenegraph_kernel::{GraphError, NodeFlags, NodeKind, SceneGraph};

/// Read-only queries against a scene graph for debugging and the CLI.
pub struct GraphInspector;

impl GraphInspector {
    pub fn summary(graph: &SceneGraph) -> GraphSummary {
        let max_depth = graph
            .traverse()
            .map(|h| graph.depth(h))
            .max()
            .unwrap_or(0);
        GraphSummary {
            node_count: graph.node_count(),
            indexed_ids: graph.ids().count(),
            clip_boxes: graph.count_kind(|k| matches!(k, NodeKind::ClipBox(_))),
            geometry: graph.count_kind(|k| k.geometry().is_some()),
            max_depth,
            pending_events: graph.events().len(),
        }
    }

    /// Details of the node addressed by `id`.
    pub fn inspect_node(graph: &SceneGraph, id: &str) -> Result<NodeInfo, GraphError> {
        let node = graph.find_by_id(id)?;
        let attributes = node
            .kind()
            .attribute_names()
            .iter()
            .filter_map(|name| node.attribute(name).map(|v| (*name, v)))
            .collect();
        Ok(NodeInfo {
            handle: node.handle(),
            label: node.label(),
            kind: node.kind().name(),
            attributes,
            flags: *node.flags(),
            child_count: node.children().len(),
            depth: graph.depth(node.handle()),
        })
    }

    /// Indented tree in document order, one node per line.
    pub fn outline(graph: &SceneGraph) -> String {
        let mut out = String::new();
        for handle in graph.traverse() {
            let Some(node) = graph.node(handle) else {
                continue;
            };
            let indent = "  ".repeat(graph.depth(handle));
            let _ = write!(out, "{indent}{}", node.kind().name());
            if let Some(id) = node.id() {
                let _ = write!(out, " #{id}");
            }
            if let Some(bounds) = node.kind().clip_bounds() {
                let _ = write!(
                    out,
                    " [{}..{}, {}..{}, {}..{}]",
                    bounds.xmin, bounds.xmax, bounds.ymin, bounds.ymax, bounds.zmin, bounds.zmax
                );
            }
            if node.flags().clipping == Some(false) {
                out.push_str(" (no clipping)");
            }
            if node.flags().enabled == Some(false) {
                out.push_str(" (disabled)");
            }
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    pub node_count: usize,
    pub indexed_ids: usize,
    pub clip_boxes: usize,
    pub geometry: usize,
    pub max_depth: usize,
    pub pending_events: usize,
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Graph: nodes={} ids={} clip_boxes={} geometry={} depth={} pending_events={}",
            self.node_count,
            self.indexed_ids,
            self.clip_boxes,
            self.geometry,
            self.max_depth,
            self.pending_events
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub handle: NodeHandle,
    pub label: String,
    pub kind: &'static str,
    pub attributes: Vec<(&'static str, AttrValue)>,
    pub flags: NodeFlags,
    pub child_count: usize,
    pub depth: usize,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} depth={} children={}",
            self.label,
            self.handle.short(),
            self.kind,
            self.depth,
            self.child_count
        )?;
        for (name, value) in &self.attributes {
            write!(f, "\n  {name} = {value}")?;
        }
        for name in NodeFlags::NAMES {
            if let Some(Some(value)) = self.flags.get(name) {
                write!(f, "\n  flags.{name} = {value}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use scenegraph_common::{BoundsPatch, ClipBounds};
    use scenegraph_kernel::NodeDescription;

    fn graph() -> SceneGraph {
        let mut g = SceneGraph::from_description(
            &NodeDescription::scene().with_child(
                NodeDescription::rotate(30.0, Vec3::Y)
                    .with_id("yaw")
                    .with_child(NodeDescription::group().with_id("target")),
            ),
        )
        .unwrap();
        g.create_clip_box("target", &BoundsPatch::full(&ClipBounds::cube(1.0)))
            .unwrap();
        g.insert_child(
            "target",
            &NodeDescription::group()
                .with_clipping(false)
                .with_child(NodeDescription::sphere(0.5).with_id("ball")),
        )
        .unwrap();
        g
    }

    #[test]
    fn summary_counts() {
        let mut g = graph();
        let summary = GraphInspector::summary(&g);
        assert_eq!(summary.node_count, 6);
        assert_eq!(summary.indexed_ids, 3);
        assert_eq!(summary.clip_boxes, 1);
        assert_eq!(summary.geometry, 1);
        assert_eq!(summary.max_depth, 4);
        assert!(summary.pending_events > 0);

        g.drain_events();
        assert_eq!(GraphInspector::summary(&g).pending_events, 0);
    }

    #[test]
    fn summary_display() {
        let s = GraphInspector::summary(&SceneGraph::empty()).to_string();
        assert!(s.contains("nodes=1"));
        assert!(s.contains("clip_boxes=0"));
    }

    #[test]
    fn inspect_node_lists_attributes() {
        let g = graph();
        let info = GraphInspector::inspect_node(&g, "yaw").unwrap();
        assert_eq!(info.kind, "rotate");
        assert_eq!(info.child_count, 1);
        assert_eq!(info.depth, 1);
        assert!(info.attributes.contains(&("angle", AttrValue::Number(30.0))));
        assert!(info.to_string().contains("angle = 30.000"));
    }

    #[test]
    fn inspect_missing_node() {
        assert_eq!(
            GraphInspector::inspect_node(&graph(), "nope").unwrap_err(),
            GraphError::NodeNotFound("nope".into())
        );
    }

    #[test]
    fn outline_is_document_order() {
        let outline = GraphInspector::outline(&graph());
        let lines: Vec<_> = outline.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "scene");
        assert_eq!(lines[1], "  rotate #yaw");
        assert!(lines[3].starts_with("      clipBox [-1..1"));
        assert_eq!(lines[4], "      group (no clipping)");
        assert_eq!(lines[5], "        sphere #ball");
    }
}
